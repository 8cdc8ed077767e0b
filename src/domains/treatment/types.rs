use crate::domains::core::parse::{
    parse_datetime, parse_optional_date, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// PatientTreatment entity - a course of medication or therapy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientTreatment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub treatment_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

impl PatientTreatment {
    /// A treatment with no end date is considered ongoing
    pub fn is_ongoing(&self, today: NaiveDate) -> bool {
        match self.end_date {
            Some(end) => end >= today,
            None => true,
        }
    }
}

fn check_date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "end_date",
                "cannot be before the start date",
            )));
        }
    }
    Ok(())
}

/// NewPatientTreatment DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientTreatment {
    pub patient_id: Uuid,
    pub treatment_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewPatientTreatment {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_id", Some(self.patient_id))
            .not_nil()
            .validate()?;

        ValidationBuilder::new("treatment_name", Some(self.treatment_name.clone()))
            .required()
            .min_length(2)
            .max_length(200)
            .validate()?;

        check_date_order(self.start_date, self.end_date)
    }
}

/// UpdatePatientTreatment DTO
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePatientTreatment {
    pub treatment_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
}

impl Validate for UpdatePatientTreatment {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.treatment_name {
            ValidationBuilder::new("treatment_name", Some(name.clone()))
                .required()
                .min_length(2)
                .max_length(200)
                .validate()?;
        }

        check_date_order(self.start_date, self.end_date)
    }
}

/// PatientTreatmentRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct PatientTreatmentRow {
    pub id: String,
    pub patient_id: String,
    pub treatment_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl PatientTreatmentRow {
    pub fn into_entity(self) -> DomainResult<PatientTreatment> {
        Ok(PatientTreatment {
            id: parse_uuid(&self.id, "id")?,
            patient_id: parse_uuid(&self.patient_id, "patient_id")?,
            treatment_name: self.treatment_name,
            start_date: parse_optional_date(&self.start_date, "start_date")?,
            end_date: parse_optional_date(&self.end_date, "end_date")?,
            dosage: self.dosage,
            frequency: self.frequency,
            response: self.response,
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

/// PatientTreatmentResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientTreatmentResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub treatment_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub response: Option<String>,
    pub notes: Option<String>,
    pub ongoing: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PatientTreatment> for PatientTreatmentResponse {
    fn from(treatment: PatientTreatment) -> Self {
        let ongoing = treatment.is_ongoing(Utc::now().date_naive());
        Self {
            id: treatment.id,
            patient_id: treatment.patient_id,
            treatment_name: treatment.treatment_name,
            start_date: treatment.start_date,
            end_date: treatment.end_date,
            dosage: treatment.dosage,
            frequency: treatment.frequency,
            response: treatment.response,
            notes: treatment.notes,
            ongoing,
            is_active: treatment.is_active,
            created_at: treatment.created_at.to_rfc3339(),
            updated_at: treatment.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for treatment lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatmentFilter {
    pub patient_id: Option<Uuid>,
    /// Start-date range, inclusive `YYYY-MM-DD` bounds
    pub started_range: Option<(String, String)>,
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_cannot_precede_start() {
        let treatment = NewPatientTreatment {
            patient_id: Uuid::new_v4(),
            treatment_name: "Proton pump inhibitor course".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            dosage: None,
            frequency: None,
            response: None,
            notes: None,
        };
        assert!(treatment.validate().is_err());

        let treatment = NewPatientTreatment {
            end_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            ..treatment
        };
        assert!(treatment.validate().is_ok());
    }

    #[test]
    fn test_is_ongoing() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let mut treatment = PatientTreatment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            treatment_name: "PPI".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: None,
            dosage: None,
            frequency: None,
            response: None,
            notes: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deactivated_at: None,
            deactivated_by_user_id: None,
        };
        assert!(treatment.is_ongoing(today));

        treatment.end_date = NaiveDate::from_ymd_opt(2025, 6, 10);
        assert!(!treatment.is_ongoing(today));

        treatment.end_date = NaiveDate::from_ymd_opt(2025, 6, 20);
        assert!(treatment.is_ongoing(today));
    }
}
