use crate::auth::AuthContext;
use crate::domains::camp::repository::{CampRegistrationRepository, CampRepository};
use crate::domains::camp::types::{
    CampFilter, CampRegistrationResponse, CampResponse, NewCamp, NewCampRegistration,
    RegistrationFilter, UpdateCamp, UpdateCampRegistration,
};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::Validate;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining camp and registration service operations
#[async_trait]
pub trait CampService: Send + Sync {
    async fn create_camp(&self, new_camp: NewCamp, auth: &AuthContext) -> ServiceResult<CampResponse>;

    async fn get_camp_by_id(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<CampResponse>;

    async fn list_camps(
        &self,
        filter: CampFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<CampResponse>>;

    async fn update_camp(
        &self,
        id: Uuid,
        update_data: UpdateCamp,
        auth: &AuthContext,
    ) -> ServiceResult<CampResponse>;

    async fn deactivate_camp(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;

    /// Register a participant; fails with a camp-full conflict when the
    /// camp has no remaining capacity.
    async fn register_participant(
        &self,
        new_registration: NewCampRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse>;

    async fn get_registration_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse>;

    async fn get_registration_by_registration_id(
        &self,
        registration_id: &str,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse>;

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<CampRegistrationResponse>>;

    async fn update_registration(
        &self,
        id: Uuid,
        update_data: UpdateCampRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse>;

    async fn deactivate_registration(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the camp service
#[derive(Clone)]
pub struct CampServiceImpl {
    camp_repo: Arc<dyn CampRepository>,
    registration_repo: Arc<dyn CampRegistrationRepository>,
}

impl CampServiceImpl {
    pub fn new(
        camp_repo: Arc<dyn CampRepository>,
        registration_repo: Arc<dyn CampRegistrationRepository>,
    ) -> Self {
        Self {
            camp_repo,
            registration_repo,
        }
    }
}

#[async_trait]
impl CampService for CampServiceImpl {
    async fn create_camp(&self, new_camp: NewCamp, auth: &AuthContext) -> ServiceResult<CampResponse> {
        auth.authorize(Permission::ManageCamps)?;
        new_camp.validate()?;

        let camp = self.camp_repo.create(&new_camp, auth).await?;
        info!("created camp '{}' for {}", camp.name, camp.camp_date);

        Ok(CampResponse::from(camp))
    }

    async fn get_camp_by_id(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<CampResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let camp = self.camp_repo.find_by_id(id).await?;
        Ok(CampResponse::from(camp))
    }

    async fn list_camps(
        &self,
        filter: CampFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<CampResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.camp_repo.find(&filter, params).await?;
        Ok(result.map(CampResponse::from))
    }

    async fn update_camp(
        &self,
        id: Uuid,
        update_data: UpdateCamp,
        auth: &AuthContext,
    ) -> ServiceResult<CampResponse> {
        auth.authorize(Permission::ManageCamps)?;
        update_data.validate()?;

        let camp = self.camp_repo.update(id, &update_data, auth).await?;
        Ok(CampResponse::from(camp))
    }

    async fn deactivate_camp(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageCamps)?;
        self.camp_repo.deactivate(id, auth).await?;
        info!("deactivated camp {}", id);
        Ok(())
    }

    async fn register_participant(
        &self,
        new_registration: NewCampRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse> {
        auth.authorize(Permission::ManageRegistrations)?;
        new_registration.validate()?;

        let registration = self.registration_repo.create(&new_registration, auth).await?;
        info!(
            "registered '{}' as {} (priority {})",
            registration.name,
            registration.registration_id,
            registration.priority_level.as_str()
        );

        Ok(CampRegistrationResponse::from(registration))
    }

    async fn get_registration_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let registration = self.registration_repo.find_by_id(id).await?;
        Ok(CampRegistrationResponse::from(registration))
    }

    async fn get_registration_by_registration_id(
        &self,
        registration_id: &str,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let registration = self
            .registration_repo
            .find_by_registration_id(registration_id)
            .await?;
        Ok(CampRegistrationResponse::from(registration))
    }

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<CampRegistrationResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.registration_repo.find(&filter, params).await?;
        Ok(result.map(CampRegistrationResponse::from))
    }

    async fn update_registration(
        &self,
        id: Uuid,
        update_data: UpdateCampRegistration,
        auth: &AuthContext,
    ) -> ServiceResult<CampRegistrationResponse> {
        auth.authorize(Permission::ManageRegistrations)?;
        update_data.validate()?;

        let registration = self.registration_repo.update(id, &update_data, auth).await?;
        Ok(CampRegistrationResponse::from(registration))
    }

    async fn deactivate_registration(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageRegistrations)?;
        self.registration_repo.deactivate(id, auth).await?;
        info!("deactivated registration {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::camp::repository::{
        SqliteCampRegistrationRepository, SqliteCampRepository,
    };
    use crate::domains::camp::types::SymptomChecklist;
    use crate::errors::{DomainError, ServiceError};
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (CampServiceImpl, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let service = CampServiceImpl::new(
            Arc::new(SqliteCampRepository::new(pool.clone())),
            Arc::new(SqliteCampRegistrationRepository::new(pool)),
        );
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Admin);
        (service, auth)
    }

    fn new_camp() -> NewCamp {
        NewCamp {
            name: "Gastro Screening Camp".to_string(),
            location: None,
            camp_date: NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
            organizer: None,
            max_capacity: 2,
        }
    }

    fn new_registration(camp_id: Uuid) -> NewCampRegistration {
        NewCampRegistration {
            camp_id,
            name: "Sita Devi".to_string(),
            age: Some(45),
            sex: None,
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            selected_services: vec!["SIBO Test".to_string()],
            symptoms: SymptomChecklist::default(),
            payment_status: None,
        }
    }

    #[tokio::test]
    async fn test_register_participant_end_to_end() {
        let (service, auth) = setup().await;

        let camp = service.create_camp(new_camp(), &auth).await.unwrap();
        assert_eq!(camp.remaining_capacity, 2);

        let reg = service
            .register_participant(new_registration(camp.id), &auth)
            .await
            .unwrap();
        assert_eq!(reg.registration_id, "CAMP202508170001");
        assert_eq!(reg.total_amount, 499);

        let camp = service.get_camp_by_id(camp.id, &auth).await.unwrap();
        assert_eq!(camp.current_registrations, 1);
        assert_eq!(camp.remaining_capacity, 1);
    }

    #[tokio::test]
    async fn test_camp_full_is_surfaced_as_conflict() {
        let (service, auth) = setup().await;
        let camp = service.create_camp(new_camp(), &auth).await.unwrap();

        for mobile in ["9876543210", "9876543211"] {
            let mut reg = new_registration(camp.id);
            reg.mobile = mobile.to_string();
            service.register_participant(reg, &auth).await.unwrap();
        }

        let err = service
            .register_participant(new_registration(camp.id), &auth)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::CampFull { .. })
        ));
    }

    #[tokio::test]
    async fn test_doctor_cannot_manage_camps() {
        let (service, _) = setup().await;
        let doctor = AuthContext::new(Uuid::new_v4(), UserRole::Doctor);

        let err = service.create_camp(new_camp(), &doctor).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
    }
}
