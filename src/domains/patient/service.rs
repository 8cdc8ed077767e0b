use crate::auth::AuthContext;
use crate::domains::patient::repository::PatientRepository;
use crate::domains::patient::types::{
    NewPatient, PatientFilter, PatientResponse, PatientSortField, UpdatePatient,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission, SortDirection};
use crate::validation::Validate;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining patient service operations
#[async_trait]
pub trait PatientService: Send + Sync {
    async fn create_patient(
        &self,
        new_patient: NewPatient,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse>;

    async fn get_patient_by_id(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<PatientResponse>;

    /// Look up by the human-readable `PAT...` identifier
    async fn get_patient_by_patient_id(
        &self,
        patient_id: &str,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse>;

    async fn list_patients(
        &self,
        filter: PatientFilter,
        params: PaginationParams,
        sort_by: PatientSortField,
        sort_dir: SortDirection,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientResponse>>;

    async fn update_patient(
        &self,
        id: Uuid,
        update_data: UpdatePatient,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse>;

    async fn deactivate_patient(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;

    async fn reactivate_patient(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<PatientResponse>;
}

/// Implementation of the patient service
#[derive(Clone)]
pub struct PatientServiceImpl {
    repo: Arc<dyn PatientRepository>,
}

impl PatientServiceImpl {
    pub fn new(repo: Arc<dyn PatientRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl PatientService for PatientServiceImpl {
    async fn create_patient(
        &self,
        new_patient: NewPatient,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse> {
        auth.authorize(Permission::ManagePatients)?;
        new_patient.validate()?;

        let patient = self.repo.create(&new_patient, auth).await?;
        info!("registered patient {}", patient.patient_id);

        Ok(PatientResponse::from(patient))
    }

    async fn get_patient_by_id(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<PatientResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let patient = self.repo.find_by_id(id).await?;
        Ok(PatientResponse::from(patient))
    }

    async fn get_patient_by_patient_id(
        &self,
        patient_id: &str,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let patient = self.repo.find_by_patient_id(patient_id).await?;
        Ok(PatientResponse::from(patient))
    }

    async fn list_patients(
        &self,
        filter: PatientFilter,
        params: PaginationParams,
        sort_by: PatientSortField,
        sort_dir: SortDirection,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params, sort_by, sort_dir).await?;
        Ok(result.map(PatientResponse::from))
    }

    async fn update_patient(
        &self,
        id: Uuid,
        update_data: UpdatePatient,
        auth: &AuthContext,
    ) -> ServiceResult<PatientResponse> {
        auth.authorize(Permission::ManagePatients)?;
        update_data.validate()?;

        let patient = self.repo.update(id, &update_data, auth).await?;
        Ok(PatientResponse::from(patient))
    }

    async fn deactivate_patient(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManagePatients)?;
        self.repo.deactivate(id, auth).await?;
        info!("deactivated patient {}", id);
        Ok(())
    }

    async fn reactivate_patient(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<PatientResponse> {
        auth.authorize(Permission::ManagePatients)?;
        let patient = self.repo.reactivate(id, auth).await?;
        info!("reactivated patient {}", patient.patient_id);
        Ok(PatientResponse::from(patient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::patient::repository::SqlitePatientRepository;
    use crate::errors::{DomainError, ServiceError};
    use crate::types::UserRole;

    async fn setup() -> (PatientServiceImpl, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let repo = Arc::new(SqlitePatientRepository::new(pool));
        let service = PatientServiceImpl::new(repo);
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Receptionist);
        (service, auth)
    }

    fn new_patient() -> NewPatient {
        NewPatient {
            first_name: "Ramesh".to_string(),
            last_name: Some("Kumar".to_string()),
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
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_patient() {
        let (service, auth) = setup().await;

        let created = service.create_patient(new_patient(), &auth).await.unwrap();
        assert_eq!(created.bmi, Some(22.86));
        assert_eq!(created.full_name, "Ramesh Kumar");

        let fetched = service
            .get_patient_by_patient_id(&created.patient_id, &auth)
            .await
            .unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn test_validation_rejected_before_persistence() {
        let (service, auth) = setup().await;

        let mut invalid = new_patient();
        invalid.mobile = "123".to_string();
        let err = service.create_patient(invalid, &auth).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(_))
        ));

        // Nothing was written
        let listed = service
            .list_patients(
                PatientFilter::default(),
                PaginationParams::default(),
                PatientSortField::default(),
                SortDirection::default(),
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(listed.total, 0);
    }
}
