use crate::auth::AuthContext;
use crate::domains::transplant::repository::TransplantEvaluationRepository;
use crate::domains::transplant::types::{
    EvaluationFilter, LiverTransplantEvaluationResponse, NewLiverTransplantEvaluation,
    UpdateLiverTransplantEvaluation,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_entity_exists, Validate};
use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining transplant evaluation service operations
#[async_trait]
pub trait TransplantEvaluationService: Send + Sync {
    async fn create_evaluation(
        &self,
        new_evaluation: NewLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse>;

    async fn get_evaluation_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse>;

    async fn list_evaluations(
        &self,
        filter: EvaluationFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<LiverTransplantEvaluationResponse>>;

    async fn update_evaluation(
        &self,
        id: Uuid,
        update_data: UpdateLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse>;

    async fn deactivate_evaluation(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the transplant evaluation service
#[derive(Clone)]
pub struct TransplantEvaluationServiceImpl {
    pool: SqlitePool,
    repo: Arc<dyn TransplantEvaluationRepository>,
}

impl TransplantEvaluationServiceImpl {
    pub fn new(pool: SqlitePool, repo: Arc<dyn TransplantEvaluationRepository>) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl TransplantEvaluationService for TransplantEvaluationServiceImpl {
    async fn create_evaluation(
        &self,
        new_evaluation: NewLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        new_evaluation.validate()?;
        validate_entity_exists(&self.pool, "patients", &new_evaluation.patient_id, "patient_id")
            .await?;

        let evaluation = self.repo.create(&new_evaluation, auth).await?;
        info!("opened transplant evaluation for patient {}", evaluation.patient_id);

        Ok(LiverTransplantEvaluationResponse::from(evaluation))
    }

    async fn get_evaluation_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let evaluation = self.repo.find_by_id(id).await?;
        Ok(LiverTransplantEvaluationResponse::from(evaluation))
    }

    async fn list_evaluations(
        &self,
        filter: EvaluationFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<LiverTransplantEvaluationResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params).await?;
        Ok(result.map(LiverTransplantEvaluationResponse::from))
    }

    async fn update_evaluation(
        &self,
        id: Uuid,
        update_data: UpdateLiverTransplantEvaluation,
        auth: &AuthContext,
    ) -> ServiceResult<LiverTransplantEvaluationResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        update_data.validate()?;

        let evaluation = self.repo.update(id, &update_data, auth).await?;
        Ok(LiverTransplantEvaluationResponse::from(evaluation))
    }

    async fn deactivate_evaluation(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        self.repo.deactivate(id, auth).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::patient::repository::{PatientRepository, SqlitePatientRepository};
    use crate::domains::patient::types::NewPatient;
    use crate::domains::transplant::repository::SqliteTransplantEvaluationRepository;
    use crate::types::UserRole;

    async fn setup() -> (TransplantEvaluationServiceImpl, Uuid, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Doctor);

        let patients = SqlitePatientRepository::new(pool.clone());
        let patient = patients
            .create(
                &NewPatient {
                    first_name: "Venkat".to_string(),
                    last_name: None,
                    date_of_birth: None,
                    sex: "male".to_string(),
                    mobile: "9876543210".to_string(),
                    email: None,
                    address: None,
                    city: None,
                    state: None,
                    aadhar_number: None,
                    mrn: None,
                    blood_group: None,
                    occupation: None,
                    height_cm: None,
                    weight_kg: None,
                },
                &auth,
            )
            .await
            .unwrap();

        let service = TransplantEvaluationServiceImpl::new(
            pool.clone(),
            Arc::new(SqliteTransplantEvaluationRepository::new(pool)),
        );
        (service, patient.id, auth)
    }

    fn new_evaluation(patient_id: Uuid) -> NewLiverTransplantEvaluation {
        NewLiverTransplantEvaluation {
            patient_id,
            etiology: Some("alcohol-related cirrhosis".to_string()),
            meld_score: Some(22),
            ctp_class: Some("C".to_string()),
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            comorbidities: None,
            evaluation_status: None,
            evaluation_date: None,
            listing_decision: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_computes_bmi_and_defaults_status() {
        let (service, patient_id, auth) = setup().await;

        let created = service
            .create_evaluation(new_evaluation(patient_id), &auth)
            .await
            .unwrap();

        assert_eq!(created.bmi_kg_m2, Some(22.86));
        assert_eq!(created.evaluation_status, "in_progress");
        assert_eq!(created.meld_score, Some(22));
    }

    #[tokio::test]
    async fn test_update_weight_refreshes_bmi_and_filters_by_status() {
        let (service, patient_id, auth) = setup().await;
        let created = service
            .create_evaluation(new_evaluation(patient_id), &auth)
            .await
            .unwrap();

        let updated = service
            .update_evaluation(
                created.id,
                UpdateLiverTransplantEvaluation {
                    weight_kg: Some(62.0),
                    evaluation_status: Some("completed".to_string()),
                    listing_decision: Some("listed".to_string()),
                    ..Default::default()
                },
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(updated.bmi_kg_m2, Some(20.24));

        let filter = EvaluationFilter {
            evaluation_status: Some("completed".to_string()),
            ..Default::default()
        };
        let result = service
            .list_evaluations(filter, PaginationParams::default(), &auth)
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].listing_decision.as_deref(), Some("listed"));
    }
}
