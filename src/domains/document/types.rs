use crate::domains::core::parse::{
    parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// File extensions accepted for patient documents
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "doc", "docx"];

fn has_allowed_extension(file_name: &str) -> bool {
    file_name
        .rsplit('.')
        .next()
        .map(|ext| ALLOWED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// PatientDocument entity - metadata for a blob held in external storage.
/// The bytes themselves never pass through this crate; only the storage
/// key is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDocument {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub file_name: String,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

/// NewPatientDocument DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientDocument {
    pub patient_id: Uuid,
    pub file_name: String,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
}

impl Validate for NewPatientDocument {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_id", Some(self.patient_id))
            .not_nil()
            .validate()?;

        ValidationBuilder::new("file_name", Some(self.file_name.clone()))
            .required()
            .max_length(255)
            .validate()?;

        if !has_allowed_extension(&self.file_name) {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "file_name",
                "file type is not accepted",
            )));
        }

        ValidationBuilder::new("storage_key", Some(self.storage_key.clone()))
            .required()
            .validate()?;

        if let Some(size) = self.size_bytes {
            ValidationBuilder::new("size_bytes", Some(size))
                .min(1)
                .validate()?;
        }

        Ok(())
    }
}

/// PatientDocumentRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct PatientDocumentRow {
    pub id: String,
    pub patient_id: String,
    pub file_name: String,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl PatientDocumentRow {
    pub fn into_entity(self) -> DomainResult<PatientDocument> {
        Ok(PatientDocument {
            id: parse_uuid(&self.id, "id")?,
            patient_id: parse_uuid(&self.patient_id, "patient_id")?,
            file_name: self.file_name,
            title: self.title,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            storage_key: self.storage_key,
            is_active: self.is_active != 0,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            updated_at: parse_datetime(&self.updated_at, "updated_at")?,
            created_by_user_id: parse_optional_uuid(&self.created_by_user_id, "created_by_user_id")?,
            updated_by_user_id: parse_optional_uuid(&self.updated_by_user_id, "updated_by_user_id")?,
            deactivated_at: parse_optional_datetime(&self.deactivated_at, "deactivated_at")?,
            deactivated_by_user_id: parse_optional_uuid(
                &self.deactivated_by_user_id,
                "deactivated_by_user_id",
            )?,
        })
    }
}

/// PatientDocumentResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDocumentResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub file_name: String,
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PatientDocument> for PatientDocumentResponse {
    fn from(doc: PatientDocument) -> Self {
        Self {
            id: doc.id,
            patient_id: doc.patient_id,
            file_name: doc.file_name,
            title: doc.title,
            mime_type: doc.mime_type,
            size_bytes: doc.size_bytes,
            storage_key: doc.storage_key,
            is_active: doc.is_active,
            created_at: doc.created_at.to_rfc3339(),
            updated_at: doc.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for document lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub patient_id: Option<Uuid>,
    pub include_inactive: bool,
}
