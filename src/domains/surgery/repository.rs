use crate::auth::AuthContext;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::surgery::types::{
    NewSurgeryDetail, SurgeryDetail, SurgeryDetailRow, SurgeryFilter, UpdateSurgeryDetail,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining surgery repository operations
#[async_trait]
pub trait SurgeryRepository: FindById<SurgeryDetail> + Deactivate + Send + Sync {
    async fn create(
        &self,
        new_detail: &NewSurgeryDetail,
        auth: &AuthContext,
    ) -> DomainResult<SurgeryDetail>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateSurgeryDetail,
        auth: &AuthContext,
    ) -> DomainResult<SurgeryDetail>;

    async fn find(
        &self,
        filter: &SurgeryFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<SurgeryDetail>>;
}

/// SQLite implementation for SurgeryRepository
#[derive(Debug, Clone)]
pub struct SqliteSurgeryRepository {
    pool: SqlitePool,
}

impl SqliteSurgeryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SurgeryFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(patient_id) = &filter.patient_id {
            builder.push(" AND patient_id = ");
            builder.push_bind(patient_id.to_string());
        }

        if let Some(search) = &filter.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (surgery_name LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR surgery_type LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR surgeon LIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }
    }
}

#[async_trait]
impl FindById<SurgeryDetail> for SqliteSurgeryRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<SurgeryDetail> {
        let row = query_as::<_, SurgeryDetailRow>(
            "SELECT * FROM surgery_details WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("SurgeryDetail".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteSurgeryRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE surgery_details
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
            Err(DomainError::EntityNotFound("SurgeryDetail".to_string(), id))
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
impl SurgeryRepository for SqliteSurgeryRepository {
    async fn create(
        &self,
        new_detail: &NewSurgeryDetail,
        auth: &AuthContext,
    ) -> DomainResult<SurgeryDetail> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO surgery_details (
                id, patient_id, surgery_name, surgery_type, surgery_date,
                surgeon, anesthesia_type, operative_findings, complications, notes,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(new_detail.patient_id.to_string())
        .bind(&new_detail.surgery_name)
        .bind(&new_detail.surgery_type)
        .bind(new_detail.surgery_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&new_detail.surgeon)
        .bind(&new_detail.anesthesia_type)
        .bind(&new_detail.operative_findings)
        .bind(&new_detail.complications)
        .bind(&new_detail.notes)
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
        update_data: &UpdateSurgeryDetail,
        auth: &AuthContext,
    ) -> DomainResult<SurgeryDetail> {
        let current = self.find_by_id(id).await?;

        let has_changes = update_data.surgery_name.is_some()
            || update_data.surgery_type.is_some()
            || update_data.surgery_date.is_some()
            || update_data.surgeon.is_some()
            || update_data.anesthesia_type.is_some()
            || update_data.operative_findings.is_some()
            || update_data.complications.is_some()
            || update_data.notes.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE surgery_details SET ");
        let mut separated = builder.separated(", ");

        macro_rules! push_field {
            ($col:literal, $value:expr) => {
                if let Some(val) = $value {
                    separated.push(concat!($col, " = "));
                    separated.push_bind_unseparated(val.clone());
                }
            };
        }

        push_field!("surgery_name", &update_data.surgery_name);
        push_field!("surgery_type", &update_data.surgery_type);
        push_field!("surgeon", &update_data.surgeon);
        push_field!("anesthesia_type", &update_data.anesthesia_type);
        push_field!("operative_findings", &update_data.operative_findings);
        push_field!("complications", &update_data.complications);
        push_field!("notes", &update_data.notes);

        if let Some(date) = update_data.surgery_date {
            separated.push("surgery_date = ");
            separated.push_bind_unseparated(date.format("%Y-%m-%d").to_string());
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
            return Err(DomainError::EntityNotFound("SurgeryDetail".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &SurgeryFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<SurgeryDetail>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM surgery_details WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM surgery_details WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY surgery_date DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<SurgeryDetailRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(SurgeryDetailRow::into_entity)
            .collect::<DomainResult<Vec<SurgeryDetail>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}
