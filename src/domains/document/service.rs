use crate::auth::AuthContext;
use crate::domains::document::repository::DocumentRepository;
use crate::domains::document::types::{DocumentFilter, NewPatientDocument, PatientDocumentResponse};
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams, Permission};
use crate::validation::{validate_entity_exists, Validate};
use async_trait::async_trait;
use log::info;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining document service operations
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Record metadata for a blob already placed in external storage
    async fn record_document(
        &self,
        new_document: NewPatientDocument,
        auth: &AuthContext,
    ) -> ServiceResult<PatientDocumentResponse>;

    async fn get_document_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<PatientDocumentResponse>;

    async fn list_documents(
        &self,
        filter: DocumentFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientDocumentResponse>>;

    async fn deactivate_document(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()>;
}

/// Implementation of the document service
#[derive(Clone)]
pub struct DocumentServiceImpl {
    pool: SqlitePool,
    repo: Arc<dyn DocumentRepository>,
}

impl DocumentServiceImpl {
    pub fn new(pool: SqlitePool, repo: Arc<dyn DocumentRepository>) -> Self {
        Self { pool, repo }
    }
}

#[async_trait]
impl DocumentService for DocumentServiceImpl {
    async fn record_document(
        &self,
        new_document: NewPatientDocument,
        auth: &AuthContext,
    ) -> ServiceResult<PatientDocumentResponse> {
        auth.authorize(Permission::ManageDocuments)?;
        new_document.validate()?;
        validate_entity_exists(&self.pool, "patients", &new_document.patient_id, "patient_id")
            .await?;

        let document = self.repo.create(&new_document, auth).await?;
        info!(
            "recorded document '{}' for patient {}",
            document.file_name, document.patient_id
        );

        Ok(PatientDocumentResponse::from(document))
    }

    async fn get_document_by_id(
        &self,
        id: Uuid,
        auth: &AuthContext,
    ) -> ServiceResult<PatientDocumentResponse> {
        auth.authorize(Permission::ViewRecords)?;
        let document = self.repo.find_by_id(id).await?;
        Ok(PatientDocumentResponse::from(document))
    }

    async fn list_documents(
        &self,
        filter: DocumentFilter,
        params: PaginationParams,
        auth: &AuthContext,
    ) -> ServiceResult<PaginatedResult<PatientDocumentResponse>> {
        auth.authorize(Permission::ViewRecords)?;
        let result = self.repo.find(&filter, params).await?;
        Ok(result.map(PatientDocumentResponse::from))
    }

    async fn deactivate_document(&self, id: Uuid, auth: &AuthContext) -> ServiceResult<()> {
        auth.authorize(Permission::ManageDocuments)?;
        self.repo.deactivate(id, auth).await?;
        info!("deactivated document {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::document::repository::SqliteDocumentRepository;
    use crate::domains::patient::repository::{PatientRepository, SqlitePatientRepository};
    use crate::domains::patient::types::NewPatient;
    use crate::errors::{DomainError, ServiceError};
    use crate::types::UserRole;

    async fn setup() -> (DocumentServiceImpl, Uuid, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Receptionist);

        let patients = SqlitePatientRepository::new(pool.clone());
        let patient = patients
            .create(
                &NewPatient {
                    first_name: "Kavitha".to_string(),
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
            DocumentServiceImpl::new(pool.clone(), Arc::new(SqliteDocumentRepository::new(pool)));
        (service, patient.id, auth)
    }

    fn new_document(patient_id: Uuid) -> NewPatientDocument {
        NewPatientDocument {
            patient_id,
            file_name: "endoscopy_report.pdf".to_string(),
            title: None,
            mime_type: Some("application/pdf".to_string()),
            size_bytes: Some(65_536),
            storage_key: "docs/endoscopy_report.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_list_and_deactivate() {
        let (service, patient_id, auth) = setup().await;

        let doc = service
            .record_document(new_document(patient_id), &auth)
            .await
            .unwrap();

        let filter = DocumentFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        };
        let listed = service
            .list_documents(filter.clone(), PaginationParams::default(), &auth)
            .await
            .unwrap();
        assert_eq!(listed.total, 1);

        service.deactivate_document(doc.id, &auth).await.unwrap();
        let listed = service
            .list_documents(filter, PaginationParams::default(), &auth)
            .await
            .unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    async fn test_unknown_patient_rejected() {
        let (service, _patient_id, auth) = setup().await;

        let err = service
            .record_document(new_document(Uuid::new_v4()), &auth)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(_))
        ));
    }
}
