use crate::auth::AuthContext;
use crate::domains::followup::repository::FollowUpRepository;
use crate::domains::followup::types::{
    FollowUpFilter, FollowUpRecordResponse, NewFollowUpRecord, UpdateFollowUpRecord,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_entity_exists, Validate};
use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining follow-up service operations
#[async_trait]
pub trait FollowUpService: Send + Sync {
    async fn create_follow_up(
        &self,
        new_record: NewFollowUpRecord,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse>;

    async fn get_follow_up_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse>;

    async fn list_follow_ups(
        &self,
        filter: FollowUpFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<FollowUpRecordResponse>>;

    async fn update_follow_up(
        &self,
        id: Uuid,
        update_data: UpdateFollowUpRecord,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse>;

    async fn deactivate_follow_up(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the follow-up service
#[derive(Clone)]
pub struct FollowUpServiceImpl {
    pool: SqlitePool,
    repo: Arc<dyn FollowUpRepository>,
}

impl FollowUpServiceImpl {
    pub fn new(pool: SqlitePool, repo: Arc<dyn FollowUpRepository>) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl FollowUpService for FollowUpServiceImpl {
    async fn create_follow_up(
        &self,
        new_record: NewFollowUpRecord,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        new_record.validate()?;
        validate_entity_exists(&self.pool, "patients", &new_record.patient_id, "patient_id").await?;

        let record = self.repo.create(&new_record, auth).await?;
        info!(
            "recorded follow-up on {} for patient {}",
            record.follow_up_date, record.patient_id
        );

        Ok(FollowUpRecordResponse::from(record))
    }

    async fn get_follow_up_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let record = self.repo.find_by_id(id).await?;
        Ok(FollowUpRecordResponse::from(record))
    }

    async fn list_follow_ups(
        &self,
        filter: FollowUpFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<FollowUpRecordResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params).await?;
        Ok(result.map(FollowUpRecordResponse::from))
    }

    async fn update_follow_up(
        &self,
        id: Uuid,
        update_data: UpdateFollowUpRecord,
        auth: &AuthContext,
    ) -> ServiceResult<FollowUpRecordResponse> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        update_data.validate()?;

        let record = self.repo.update(id, &update_data, auth).await?;
        Ok(FollowUpRecordResponse::from(record))
    }

    async fn deactivate_follow_up(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageClinicalRecords)?;
        self.repo.deactivate(id, auth).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::followup::repository::SqliteFollowUpRepository;
    use crate::domains::patient::repository::{PatientRepository, SqlitePatientRepository};
    use crate::domains::patient::types::NewPatient;
    use crate::errors::{DomainError, ServiceError};
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (FollowUpServiceImpl, Uuid, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Doctor);

        let patients = SqlitePatientRepository::new(pool.clone());
        let patient = patients
            .create(
                &NewPatient {
                    first_name: "Ramesh".to_string(),
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

        let service =
            FollowUpServiceImpl::new(pool.clone(), Arc::new(SqliteFollowUpRepository::new(pool)));
        (service, patient.id, auth)
    }

    fn new_record(patient_id: Uuid, date: NaiveDate) -> NewFollowUpRecord {
        NewFollowUpRecord {
            patient_id,
            follow_up_date: date,
            symptoms: Some("epigastric pain".to_string()),
            diagnosis: None,
            prescribed_medication: None,
            next_review_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_by_visit_date() {
        let (service, patient_id, auth) = setup().await;

        for day in [3, 17, 9] {
            service
                .create_follow_up(
                    new_record(patient_id, NaiveDate::from_ymd_opt(2025, 6, day).unwrap()),
                    &auth,
                )
                .await
                .unwrap();
        }

        let filter = FollowUpFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        };
        let result = service
            .list_follow_ups(filter, PaginationParams::default(), &auth)
            .await
            .unwrap();

        assert_eq!(result.total, 3);
        let dates: Vec<_> = result.items.iter().map(|r| r.follow_up_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 17).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_patient_is_rejected() {
        let (service, _patient_id, auth) = setup().await;

        let err = service
            .create_follow_up(
                new_record(Uuid::new_v4(), NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()),
                &auth,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_date_range_filter() {
        let (service, patient_id, auth) = setup().await;

        for day in [1, 15, 28] {
            service
                .create_follow_up(
                    new_record(patient_id, NaiveDate::from_ymd_opt(2025, 6, day).unwrap()),
                    &auth,
                )
                .await
                .unwrap();
        }

        let filter = FollowUpFilter {
            patient_id: Some(patient_id),
            date_range: Some(("2025-06-10".to_string(), "2025-06-20".to_string())),
            ..Default::default()
        };
        let result = service
            .list_follow_ups(filter, PaginationParams::default(), &auth)
            .await
            .unwrap();
        assert_eq!(result.total, 1);
    }
}
