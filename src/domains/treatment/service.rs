use crate::auth::AuthContext;
use crate::domains::treatment::repository::TreatmentRepository;
use crate::domains::treatment::types::{
    NewPatientTreatment, PatientTreatmentResponse, TreatmentFilter, UpdatePatientTreatment,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_entity_exists, Validate};
use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining treatment service operations
#[async_trait]
pub trait TreatmentService: Send + Sync {
    async fn create_treatment(
        &self,
        new_treatment: NewPatientTreatment,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse>;

    async fn get_treatment_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse>;

    async fn list_treatments(
        &self,
        filter: TreatmentFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientTreatmentResponse>>;

    async fn update_treatment(
        &self,
        id: Uuid,
        update_data: UpdatePatientTreatment,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse>;

    async fn deactivate_treatment(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the treatment service
#[derive(Clone)]
pub struct TreatmentServiceImpl {
    pool: SqlitePool,
    repo: Arc<dyn TreatmentRepository>,
}

impl TreatmentServiceImpl {
    pub fn new(pool: SqlitePool, repo: Arc<dyn TreatmentRepository>) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl TreatmentService for TreatmentServiceImpl {
    async fn create_treatment(
        &self,
        new_treatment: NewPatientTreatment,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        new_treatment.validate()?;
        validate_entity_exists(&self.pool, "patients", &new_treatment.patient_id, "patient_id")
            .await?;

        let treatment = self.repo.create(&new_treatment, auth).await?;
        info!(
            "started treatment '{}' for patient {}",
            treatment.treatment_name, treatment.patient_id
        );

        Ok(PatientTreatmentResponse::from(treatment))
    }

    async fn get_treatment_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let treatment = self.repo.find_by_id(id).await?;
        Ok(PatientTreatmentResponse::from(treatment))
    }

    async fn list_treatments(
        &self,
        filter: TreatmentFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientTreatmentResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params).await?;
        Ok(result.map(PatientTreatmentResponse::from))
    }

    async fn update_treatment(
        &self,
        id: Uuid,
        update_data: UpdatePatientTreatment,
        auth: &AuthContext,
    ) -> ServiceResult<PatientTreatmentResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        update_data.validate()?;

        let treatment = self.repo.update(id, &update_data, auth).await?;
        Ok(PatientTreatmentResponse::from(treatment))
    }

    async fn deactivate_treatment(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
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
    use crate::domains::treatment::repository::SqliteTreatmentRepository;
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (TreatmentServiceImpl, Uuid, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Doctor);

        let patients = SqlitePatientRepository::new(pool.clone());
        let patient = patients
            .create(
                &NewPatient {
                    first_name: "Govind".to_string(),
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

        let service = TreatmentServiceImpl::new(
            pool.clone(),
            Arc::new(SqliteTreatmentRepository::new(pool)),
        );
        (service, patient.id, auth)
    }

    #[tokio::test]
    async fn test_create_and_close_course() {
        let (service, patient_id, auth) = setup().await;

        let created = service
            .create_treatment(
                NewPatientTreatment {
                    patient_id,
                    treatment_name: "Rifaximin course".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                    end_date: None,
                    dosage: Some("550mg".to_string()),
                    frequency: Some("twice daily".to_string()),
                    response: None,
                    notes: None,
                },
                &auth,
            )
            .await
            .unwrap();
        assert!(created.ongoing);

        let updated = service
            .update_treatment(
                created.id,
                UpdatePatientTreatment {
                    end_date: NaiveDate::from_ymd_opt(2025, 6, 14),
                    response: Some("symptoms resolved".to_string()),
                    ..Default::default()
                },
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2025, 6, 14));
    }

    #[tokio::test]
    async fn test_bad_date_order_rejected() {
        let (service, patient_id, auth) = setup().await;

        let err = service
            .create_treatment(
                NewPatientTreatment {
                    patient_id,
                    treatment_name: "Rifaximin course".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2025, 6, 10),
                    end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                    dosage: None,
                    frequency: None,
                    response: None,
                    notes: None,
                },
                &auth,
            )
            .await;
        assert!(err.is_err());
    }
}
