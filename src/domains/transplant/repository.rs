use crate::auth::AuthContext;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::transplant::types::{
    evaluation_bmi, EvaluationFilter, LiverTransplantEvaluation, LiverTransplantEvaluationRow,
    NewLiverTransplantEvaluation, UpdateLiverTransplantEvaluation,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining transplant evaluation repository operations
#[async_trait]
pub trait TransplantEvaluationRepository:
    FindById<LiverTransplantEvaluation> + Deactivate + Send + Sync
{
    async fn create(
        &self,
        new_evaluation: &NewLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> DomainResult<LiverTransplantEvaluation>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> DomainResult<LiverTransplantEvaluation>;

    async fn find(
        &self,
        filter: &EvaluationFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<LiverTransplantEvaluation>>;
}

/// SQLite implementation for TransplantEvaluationRepository
#[derive(Debug, Clone)]
pub struct SqliteTransplantEvaluationRepository {
    pool: SqlitePool,
}

impl SqliteTransplantEvaluationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &EvaluationFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(patient_id) = &filter.patient_id {
            builder.push(" AND patient_id = ");
            builder.push_bind(patient_id.to_string());
        }

        if let Some(status) = &filter.evaluation_status {
            if !status.is_empty() {
                builder.push(" AND evaluation_status = ");
                builder.push_bind(status.clone());
            }
        }

        if let Some(decision) = &filter.listing_decision {
            if !decision.is_empty() {
                builder.push(" AND listing_decision = ");
                builder.push_bind(decision.clone());
            }
        }
    }
}

#[async_trait]
impl FindById<LiverTransplantEvaluation> for SqliteTransplantEvaluationRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<LiverTransplantEvaluation> {
        let row = query_as::<_, LiverTransplantEvaluationRow>(
            "SELECT * FROM liver_transplant_evaluations WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("LiverTransplantEvaluation".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteTransplantEvaluationRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE liver_transplant_evaluations
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
            Err(DomainError::EntityNotFound("LiverTransplantEvaluation".to_string(), id))
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
impl TransplantEvaluationRepository for SqliteTransplantEvaluationRepository {
    async fn create(
        &self,
        new_evaluation: &NewLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> DomainResult<LiverTransplantEvaluation> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();
        let bmi = evaluation_bmi(new_evaluation.height_cm, new_evaluation.weight_kg);
        let status = new_evaluation
            .evaluation_status
            .clone()
            .unwrap_or_else(|| "in_progress".to_string());

        query(
            r#"
            INSERT INTO liver_transplant_evaluations (
                id, patient_id, etiology, meld_score, ctp_class,
                height_cm, weight_kg, bmi_kg_m2, comorbidities,
                evaluation_status, evaluation_date, listing_decision, notes,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(new_evaluation.patient_id.to_string())
        .bind(&new_evaluation.etiology)
        .bind(new_evaluation.meld_score)
        .bind(&new_evaluation.ctp_class)
        .bind(new_evaluation.height_cm)
        .bind(new_evaluation.weight_kg)
        .bind(bmi)
        .bind(&new_evaluation.comorbidities)
        .bind(&status)
        .bind(new_evaluation.evaluation_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&new_evaluation.listing_decision)
        .bind(&new_evaluation.notes)
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
        update_data: &UpdateLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> DomainResult<LiverTransplantEvaluation> {
        let current = self.find_by_id(id).await?;

        let has_changes = update_data.etiology.is_some()
            || update_data.meld_score.is_some()
            || update_data.ctp_class.is_some()
            || update_data.height_cm.is_some()
            || update_data.weight_kg.is_some()
            || update_data.comorbidities.is_some()
            || update_data.evaluation_status.is_some()
            || update_data.evaluation_date.is_some()
            || update_data.listing_decision.is_some()
            || update_data.notes.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE liver_transplant_evaluations SET ");
        let mut separated = builder.separated(", ");

        macro_rules! push_field {
            ($col:literal, $value:expr) => {
                if let Some(val) = $value {
                    separated.push(concat!($col, " = "));
                    separated.push_bind_unseparated(val.clone());
                }
            };
        }

        push_field!("etiology", &update_data.etiology);
        push_field!("ctp_class", &update_data.ctp_class);
        push_field!("comorbidities", &update_data.comorbidities);
        push_field!("evaluation_status", &update_data.evaluation_status);
        push_field!("listing_decision", &update_data.listing_decision);
        push_field!("notes", &update_data.notes);

        if let Some(meld) = update_data.meld_score {
            separated.push("meld_score = ");
            separated.push_bind_unseparated(meld);
        }
        if let Some(date) = update_data.evaluation_date {
            separated.push("evaluation_date = ");
            separated.push_bind_unseparated(date.format("%Y-%m-%d").to_string());
        }
        if let Some(height) = update_data.height_cm {
            separated.push("height_cm = ");
            separated.push_bind_unseparated(height);
        }
        if let Some(weight) = update_data.weight_kg {
            separated.push("weight_kg = ");
            separated.push_bind_unseparated(weight);
        }

        // Same no-drift rule as the patient registry
        if update_data.height_cm.is_some() || update_data.weight_kg.is_some() {
            let height = update_data.height_cm.or(current.height_cm);
            let weight = update_data.weight_kg.or(current.weight_kg);
            separated.push("bmi_kg_m2 = ");
            separated.push_bind_unseparated(evaluation_bmi(height, weight));
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
            return Err(DomainError::EntityNotFound(
                "LiverTransplantEvaluation".to_string(),
                id,
            ));
        }

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &EvaluationFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<LiverTransplantEvaluation>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM liver_transplant_evaluations WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder =
            QueryBuilder::new("SELECT * FROM liver_transplant_evaluations WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<LiverTransplantEvaluationRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(LiverTransplantEvaluationRow::into_entity)
            .collect::<DomainResult<Vec<LiverTransplantEvaluation>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}
