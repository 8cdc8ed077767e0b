use crate::auth::AuthContext;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::treatment::types::{
    NewPatientTreatment, PatientTreatment, PatientTreatmentRow, TreatmentFilter,
    UpdatePatientTreatment,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining treatment repository operations
#[async_trait]
pub trait TreatmentRepository: FindById<PatientTreatment> + Deactivate + Send + Sync {
    async fn create(
        &self,
        new_treatment: &NewPatientTreatment,
        auth: &AuthContext,
    ) -> DomainResult<PatientTreatment>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdatePatientTreatment,
        auth: &AuthContext,
    ) -> DomainResult<PatientTreatment>;

    async fn find(
        &self,
        filter: &TreatmentFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PatientTreatment>>;
}

/// SQLite implementation for TreatmentRepository
#[derive(Debug, Clone)]
pub struct SqliteTreatmentRepository {
    pool: SqlitePool,
}

impl SqliteTreatmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TreatmentFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(patient_id) = &filter.patient_id {
            builder.push(" AND patient_id = ");
            builder.push_bind(patient_id.to_string());
        }

        if let Some((start, end)) = &filter.started_range {
            builder.push(" AND start_date BETWEEN ");
            builder.push_bind(start.clone());
            builder.push(" AND ");
            builder.push_bind(end.clone());
        }
    }
}

#[async_trait]
impl FindById<PatientTreatment> for SqliteTreatmentRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<PatientTreatment> {
        let row = query_as::<_, PatientTreatmentRow>(
            "SELECT * FROM patient_treatments WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("PatientTreatment".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteTreatmentRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE patient_treatments
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
            Err(DomainError::EntityNotFound("PatientTreatment".to_string(), id))
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
impl TreatmentRepository for SqliteTreatmentRepository {
    async fn create(
        &self,
        new_treatment: &NewPatientTreatment,
        auth: &AuthContext,
    ) -> DomainResult<PatientTreatment> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO patient_treatments (
                id, patient_id, treatment_name, start_date, end_date,
                dosage, frequency, response, notes,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(new_treatment.patient_id.to_string())
        .bind(&new_treatment.treatment_name)
        .bind(new_treatment.start_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(new_treatment.end_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&new_treatment.dosage)
        .bind(&new_treatment.frequency)
        .bind(&new_treatment.response)
        .bind(&new_treatment.notes)
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
        update_data: &UpdatePatientTreatment,
        auth: &AuthContext,
    ) -> DomainResult<PatientTreatment> {
        let current = self.find_by_id(id).await?;

        let has_changes = update_data.treatment_name.is_some()
            || update_data.start_date.is_some()
            || update_data.end_date.is_some()
            || update_data.dosage.is_some()
            || update_data.frequency.is_some()
            || update_data.response.is_some()
            || update_data.notes.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE patient_treatments SET ");
        let mut separated = builder.separated(", ");

        macro_rules! push_field {
            ($col:literal, $value:expr) => {
                if let Some(val) = $value {
                    separated.push(concat!($col, " = "));
                    separated.push_bind_unseparated(val.clone());
                }
            };
        }

        push_field!("treatment_name", &update_data.treatment_name);
        push_field!("dosage", &update_data.dosage);
        push_field!("frequency", &update_data.frequency);
        push_field!("response", &update_data.response);
        push_field!("notes", &update_data.notes);

        if let Some(start) = update_data.start_date {
            separated.push("start_date = ");
            separated.push_bind_unseparated(start.format("%Y-%m-%d").to_string());
        }
        if let Some(end) = update_data.end_date {
            separated.push("end_date = ");
            separated.push_bind_unseparated(end.format("%Y-%m-%d").to_string());
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
            return Err(DomainError::EntityNotFound("PatientTreatment".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &TreatmentFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PatientTreatment>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM patient_treatments WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM patient_treatments WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY start_date DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<PatientTreatmentRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(PatientTreatmentRow::into_entity)
            .collect::<DomainResult<Vec<PatientTreatment>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}
