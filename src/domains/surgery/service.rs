use crate::auth::AuthContext;
use crate::domains::surgery::repository::SurgeryRepository;
use crate::domains::surgery::types::{
    NewSurgeryDetail, SurgeryDetailResponse, SurgeryFilter, UpdateSurgeryDetail,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_entity_exists, Validate};
use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining surgery service operations
#[async_trait]
pub trait SurgeryService: Send + Sync {
    async fn create_surgery(
        &self,
        new_detail: NewSurgeryDetail,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse>;

    async fn get_surgery_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse>;

    async fn list_surgeries(
        &self,
        filter: SurgeryFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<SurgeryDetailResponse>>;

    async fn update_surgery(
        &self,
        id: Uuid,
        update_data: UpdateSurgeryDetail,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse>;

    async fn deactivate_surgery(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the surgery service
#[derive(Clone)]
pub struct SurgeryServiceImpl {
    pool: SqlitePool,
    repo: Arc<dyn SurgeryRepository>,
}

impl SurgeryServiceImpl {
    pub fn new(pool: SqlitePool, repo: Arc<dyn SurgeryRepository>) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl SurgeryService for SurgeryServiceImpl {
    async fn create_surgery(
        &self,
        new_detail: NewSurgeryDetail,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        new_detail.validate()?;
        validate_entity_exists(&self.pool, "patients", &new_detail.patient_id, "patient_id").await?;

        let detail = self.repo.create(&new_detail, auth).await?;
        info!("recorded surgery '{}' for patient {}", detail.surgery_name, detail.patient_id);

        Ok(SurgeryDetailResponse::from(detail))
    }

    async fn get_surgery_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let detail = self.repo.find_by_id(id).await?;
        Ok(SurgeryDetailResponse::from(detail))
    }

    async fn list_surgeries(
        &self,
        filter: SurgeryFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<SurgeryDetailResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params).await?;
        Ok(result.map(SurgeryDetailResponse::from))
    }

    async fn update_surgery(
        &self,
        id: Uuid,
        update_data: UpdateSurgeryDetail,
        auth: &AuthContext,
    ) -> ServiceResult<SurgeryDetailResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        update_data.validate()?;

        let detail = self.repo.update(id, &update_data, auth).await?;
        Ok(SurgeryDetailResponse::from(detail))
    }

    async fn deactivate_surgery(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
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
    use crate::domains::surgery::repository::SqliteSurgeryRepository;
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (SurgeryServiceImpl, Uuid, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Doctor);

        let patients = SqlitePatientRepository::new(pool.clone());
        let patient = patients
            .create(
                &NewPatient {
                    first_name: "Lakshmi".to_string(),
                    last_name: None,
                    date_of_birth: None,
                    sex: "female".to_string(),
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

        let service =
            SurgeryServiceImpl::new(pool.clone(), Arc::new(SqliteSurgeryRepository::new(pool)));
        (service, patient.id, auth)
    }

    #[tokio::test]
    async fn test_create_update_and_search() {
        let (service, patient_id, auth) = setup().await;

        let created = service
            .create_surgery(
                NewSurgeryDetail {
                    patient_id,
                    surgery_name: "Laparoscopic Cholecystectomy".to_string(),
                    surgery_type: Some("laparoscopic".to_string()),
                    surgery_date: NaiveDate::from_ymd_opt(2025, 5, 20),
                    surgeon: Some("Dr. Rao".to_string()),
                    anesthesia_type: Some("general".to_string()),
                    operative_findings: None,
                    complications: None,
                    notes: None,
                },
                &auth,
            )
            .await
            .unwrap();

        let updated = service
            .update_surgery(
                created.id,
                UpdateSurgeryDetail {
                    complications: Some("none".to_string()),
                    ..Default::default()
                },
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(updated.complications.as_deref(), Some("none"));

        let filter = SurgeryFilter {
            patient_id: Some(patient_id),
            search: Some("cholecyst".to_string()),
            ..Default::default()
        };
        let result = service
            .list_surgeries(filter, PaginationParams::default(), &auth)
            .await
            .unwrap();
        assert_eq!(result.total, 1);
    }
}
