use crate::auth::AuthContext;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::followup::types::{
    FollowUpFilter, FollowUpRecord, FollowUpRecordRow, NewFollowUpRecord, UpdateFollowUpRecord,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining follow-up repository operations
#[async_trait]
pub trait FollowUpRepository: FindById<FollowUpRecord> + Deactivate + Send + Sync {
    async fn create(
        &self,
        new_record: &NewFollowUpRecord,
        auth: &AuthContext,
    ) -> DomainResult<FollowUpRecord>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateFollowUpRecord,
        auth: &AuthContext,
    ) -> DomainResult<FollowUpRecord>;

    async fn find(
        &self,
        filter: &FollowUpFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<FollowUpRecord>>;
}

/// SQLite implementation for FollowUpRepository
#[derive(Debug, Clone)]
pub struct SqliteFollowUpRepository {
    pool: SqlitePool,
}

impl SqliteFollowUpRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &FollowUpFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(patient_id) = &filter.patient_id {
            builder.push(" AND patient_id = ");
            builder.push_bind(patient_id.to_string());
        }

        if let Some((start, end)) = &filter.date_range {
            builder.push(" AND follow_up_date BETWEEN ");
            builder.push_bind(start.clone());
            builder.push(" AND ");
            builder.push_bind(end.clone());
        }
    }
}

#[async_trait]
impl FindById<FollowUpRecord> for SqliteFollowUpRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<FollowUpRecord> {
        let row = query_as::<_, FollowUpRecordRow>(
            "SELECT * FROM follow_up_records WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("FollowUpRecord".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteFollowUpRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE follow_up_records
             SET is_active = 0, deactivated_at = ?, deactivated_by_user_id = ?, updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(&user_id)
        .bind(&now)
        .bind(&user_id)
        .bind(id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("FollowUpRecord".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn deactivate(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        match self.deactivate_with_tx(id, auth, &mut tx).await {
            Ok(()) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(())
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl FollowUpRepository for SqliteFollowUpRepository {
    async fn create(
        &self,
        new_record: &NewFollowUpRecord,
        auth: &AuthContext,
    ) -> DomainResult<FollowUpRecord> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO follow_up_records (
                id, patient_id, follow_up_date, symptoms, diagnosis,
                prescribed_medication, next_review_date, notes,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(new_record.patient_id.to_string())
        .bind(new_record.follow_up_date.format("%Y-%m-%d").to_string())
        .bind(&new_record.symptoms)
        .bind(&new_record.diagnosis)
        .bind(&new_record.prescribed_medication)
        .bind(new_record.next_review_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&new_record.notes)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateFollowUpRecord,
        auth: &AuthContext,
    ) -> DomainResult<FollowUpRecord> {
        let current = self.find_by_id(id).await?;

        let has_changes = update_data.follow_up_date.is_some()
            || update_data.symptoms.is_some()
            || update_data.diagnosis.is_some()
            || update_data.prescribed_medication.is_some()
            || update_data.next_review_date.is_some()
            || update_data.notes.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE follow_up_records SET ");
        let mut separated = builder.separated(", ");

        if let Some(date) = update_data.follow_up_date {
            separated.push("follow_up_date = ");
            separated.push_bind_unseparated(date.format("%Y-%m-%d").to_string());
        }
        if let Some(symptoms) = &update_data.symptoms {
            separated.push("symptoms = ");
            separated.push_bind_unseparated(symptoms.clone());
        }
        if let Some(diagnosis) = &update_data.diagnosis {
            separated.push("diagnosis = ");
            separated.push_bind_unseparated(diagnosis.clone());
        }
        if let Some(medication) = &update_data.prescribed_medication {
            separated.push("prescribed_medication = ");
            separated.push_bind_unseparated(medication.clone());
        }
        if let Some(next_review) = update_data.next_review_date {
            separated.push("next_review_date = ");
            separated.push_bind_unseparated(next_review.format("%Y-%m-%d").to_string());
        }
        if let Some(notes) = &update_data.notes {
            separated.push("notes = ");
            separated.push_bind_unseparated(notes.clone());
        }

        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_str);
        separated.push("updated_by_user_id = ");
        separated.push_bind_unseparated(user_id_str);

        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());
        builder.push(" AND is_active = 1");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("FollowUpRecord".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &FollowUpFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<FollowUpRecord>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM follow_up_records WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM follow_up_records WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY follow_up_date DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<FollowUpRecordRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(FollowUpRecordRow::into_entity)
            .collect::<DomainResult<Vec<FollowUpRecord>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}
