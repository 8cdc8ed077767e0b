use crate::domains::core::parse::{
    parse_datetime, parse_optional_date, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::DomainResult;
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// SurgeryDetail entity - an operative record for a patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurgeryDetail {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub surgery_name: String,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub surgeon: Option<String>,
    pub anesthesia_type: Option<String>,
    pub operative_findings: Option<String>,
    pub complications: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

/// NewSurgeryDetail DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurgeryDetail {
    pub patient_id: Uuid,
    pub surgery_name: String,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub surgeon: Option<String>,
    pub anesthesia_type: Option<String>,
    pub operative_findings: Option<String>,
    pub complications: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewSurgeryDetail {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_id", Some(self.patient_id))
            .not_nil()
            .validate()?;

        ValidationBuilder::new("surgery_name", Some(self.surgery_name.clone()))
            .required()
            .min_length(2)
            .max_length(200)
            .validate()?;

        Ok(())
    }
}

/// UpdateSurgeryDetail DTO
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSurgeryDetail {
    pub surgery_name: Option<String>,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub surgeon: Option<String>,
    pub anesthesia_type: Option<String>,
    pub operative_findings: Option<String>,
    pub complications: Option<String>,
    pub notes: Option<String>,
}

impl Validate for UpdateSurgeryDetail {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.surgery_name {
            ValidationBuilder::new("surgery_name", Some(name.clone()))
                .required()
                .min_length(2)
                .max_length(200)
                .validate()?;
        }
        Ok(())
    }
}

/// SurgeryDetailRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct SurgeryDetailRow {
    pub id: String,
    pub patient_id: String,
    pub surgery_name: String,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<String>,
    pub surgeon: Option<String>,
    pub anesthesia_type: Option<String>,
    pub operative_findings: Option<String>,
    pub complications: Option<String>,
    pub notes: Option<String>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl SurgeryDetailRow {
    pub fn into_entity(self) -> DomainResult<SurgeryDetail> {
        Ok(SurgeryDetail {
            id: parse_uuid(&self.id, "id")?,
            patient_id: parse_uuid(&self.patient_id, "patient_id")?,
            surgery_name: self.surgery_name,
            surgery_type: self.surgery_type,
            surgery_date: parse_optional_date(&self.surgery_date, "surgery_date")?,
            surgeon: self.surgeon,
            anesthesia_type: self.anesthesia_type,
            operative_findings: self.operative_findings,
            complications: self.complications,
            notes: self.notes,
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

/// SurgeryDetailResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryDetailResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub surgery_name: String,
    pub surgery_type: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub surgeon: Option<String>,
    pub anesthesia_type: Option<String>,
    pub operative_findings: Option<String>,
    pub complications: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SurgeryDetail> for SurgeryDetailResponse {
    fn from(detail: SurgeryDetail) -> Self {
        Self {
            id: detail.id,
            patient_id: detail.patient_id,
            surgery_name: detail.surgery_name,
            surgery_type: detail.surgery_type,
            surgery_date: detail.surgery_date,
            surgeon: detail.surgeon,
            anesthesia_type: detail.anesthesia_type,
            operative_findings: detail.operative_findings,
            complications: detail.complications,
            notes: detail.notes,
            is_active: detail.is_active,
            created_at: detail.created_at.to_rfc3339(),
            updated_at: detail.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for surgery lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurgeryFilter {
    pub patient_id: Option<Uuid>,
    /// Free-text search over surgery_name, surgery_type and surgeon
    pub search: Option<String>,
    pub include_inactive: bool,
}
