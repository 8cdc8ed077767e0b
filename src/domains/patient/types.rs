// src/domains/patient/types.rs

use crate::domains::core::measures;
use crate::domains::core::parse::{
    parse_datetime, parse_optional_date, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::DomainResult;
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Patient entity - the registry master record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    /// Human-readable identifier, `PAT<year><seq>`. Immutable once assigned.
    pub patient_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub aadhar_number: Option<String>,
    pub mrn: Option<String>,
    pub blood_group: Option<String>,
    pub occupation: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// BMI from the current measurements, independent of the stored column.
    pub fn current_bmi(&self) -> Option<f64> {
        measures::compute_bmi(self.height_cm, self.weight_kg)
    }

    pub fn age(&self, as_of: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| measures::age_years(dob, as_of))
    }
}

/// NewPatient DTO - used when registering a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub aadhar_number: Option<String>,
    pub mrn: Option<String>,
    pub blood_group: Option<String>,
    pub occupation: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl Validate for NewPatient {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("first_name", Some(self.first_name.clone()))
            .required()
            .min_length(2)
            .max_length(100)
            .validate()?;

        ValidationBuilder::new("mobile", Some(self.mobile.clone()))
            .required()
            .mobile()
            .validate()?;

        common::validate_sex(&self.sex)?;

        if let Some(email) = &self.email {
            ValidationBuilder::new("email", Some(email.clone()))
                .email()
                .validate()?;
        }

        if let Some(aadhar) = &self.aadhar_number {
            ValidationBuilder::new("aadhar_number", Some(aadhar.clone()))
                .aadhar()
                .validate()?;
        }

        if let Some(blood_group) = &self.blood_group {
            common::validate_blood_group(blood_group)?;
        }

        if let Some(dob) = self.date_of_birth {
            common::validate_dob_not_in_future(dob, Utc::now().date_naive())?;
        }

        if let Some(height) = self.height_cm {
            ValidationBuilder::new("height_cm", Some(height))
                .range(30.0, 300.0)
                .validate()?;
        }

        if let Some(weight) = self.weight_kg {
            ValidationBuilder::new("weight_kg", Some(weight))
                .range(1.0, 500.0)
                .validate()?;
        }

        Ok(())
    }
}

/// UpdatePatient DTO - partial update, absent fields stay unchanged.
/// `patient_id` is deliberately not part of this DTO.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePatient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub aadhar_number: Option<String>,
    pub mrn: Option<String>,
    pub blood_group: Option<String>,
    pub occupation: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl Validate for UpdatePatient {
    fn validate(&self) -> DomainResult<()> {
        if let Some(first_name) = &self.first_name {
            ValidationBuilder::new("first_name", Some(first_name.clone()))
                .required()
                .min_length(2)
                .max_length(100)
                .validate()?;
        }

        if let Some(mobile) = &self.mobile {
            ValidationBuilder::new("mobile", Some(mobile.clone()))
                .mobile()
                .validate()?;
        }

        if let Some(sex) = &self.sex {
            common::validate_sex(sex)?;
        }

        if let Some(email) = &self.email {
            ValidationBuilder::new("email", Some(email.clone()))
                .email()
                .validate()?;
        }

        if let Some(aadhar) = &self.aadhar_number {
            ValidationBuilder::new("aadhar_number", Some(aadhar.clone()))
                .aadhar()
                .validate()?;
        }

        if let Some(blood_group) = &self.blood_group {
            common::validate_blood_group(blood_group)?;
        }

        if let Some(dob) = self.date_of_birth {
            common::validate_dob_not_in_future(dob, Utc::now().date_naive())?;
        }

        if let Some(height) = self.height_cm {
            ValidationBuilder::new("height_cm", Some(height))
                .range(30.0, 300.0)
                .validate()?;
        }

        if let Some(weight) = self.weight_kg {
            ValidationBuilder::new("weight_kg", Some(weight))
                .range(1.0, 500.0)
                .validate()?;
        }

        Ok(())
    }
}

/// PatientRow - SQLite row representation for mapping from database
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: String,
    pub patient_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub sex: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub aadhar_number: Option<String>,
    pub mrn: Option<String>,
    pub blood_group: Option<String>,
    pub occupation: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl PatientRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<Patient> {
        Ok(Patient {
            id: parse_uuid(&self.id, "id")?,
            patient_id: self.patient_id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: parse_optional_date(&self.date_of_birth, "date_of_birth")?,
            sex: self.sex,
            mobile: self.mobile,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            aadhar_number: self.aadhar_number,
            mrn: self.mrn,
            blood_group: self.blood_group,
            occupation: self.occupation,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            bmi: self.bmi,
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

/// PatientResponse DTO - used for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientResponse {
    pub id: Uuid,
    pub patient_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub sex: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub aadhar_number: Option<String>,
    pub mrn: Option<String>,
    pub blood_group: Option<String>,
    pub occupation: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        let full_name = patient.full_name();
        let age = patient.age(Utc::now().date_naive());
        Self {
            id: patient.id,
            patient_id: patient.patient_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            full_name,
            date_of_birth: patient.date_of_birth,
            age,
            sex: patient.sex,
            mobile: patient.mobile,
            email: patient.email,
            address: patient.address,
            city: patient.city,
            state: patient.state,
            aadhar_number: patient.aadhar_number,
            mrn: patient.mrn,
            blood_group: patient.blood_group,
            occupation: patient.occupation,
            height_cm: patient.height_cm,
            weight_kg: patient.weight_kg,
            bmi: patient.bmi,
            is_active: patient.is_active,
            created_at: patient.created_at.to_rfc3339(),
            updated_at: patient.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for searching patients with multiple criteria.
/// Absent or empty fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientFilter {
    /// Free-text search over first_name, last_name, patient_id, mobile,
    /// aadhar_number and mrn (case-insensitive).
    pub search: Option<String>,
    pub sex: Option<String>,
    pub city: Option<String>,
    pub blood_group: Option<String>,
    /// Created-at range, RFC 3339 bounds
    pub created_range: Option<(String, String)>,
    /// Whether to include deactivated patients. Defaults to false.
    pub include_inactive: bool,
}

/// Sortable columns for patient lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientSortField {
    CreatedAt,
    FirstName,
    PatientId,
}

impl Default for PatientSortField {
    fn default() -> Self {
        PatientSortField::CreatedAt
    }
}

impl PatientSortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            PatientSortField::CreatedAt => "created_at",
            PatientSortField::FirstName => "first_name",
            PatientSortField::PatientId => "patient_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_patient() -> NewPatient {
        NewPatient {
            first_name: "Ramesh".to_string(),
            last_name: Some("Kumar".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 12),
            sex: "male".to_string(),
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            city: Some("Hyderabad".to_string()),
            state: None,
            aadhar_number: Some("123456789012".to_string()),
            mrn: None,
            blood_group: Some("O+".to_string()),
            occupation: None,
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
        }
    }

    #[test]
    fn test_new_patient_validation() {
        assert!(valid_new_patient().validate().is_ok());

        let mut p = valid_new_patient();
        p.first_name = "R".to_string();
        assert!(p.validate().is_err());

        let mut p = valid_new_patient();
        p.mobile = "12345".to_string();
        assert!(p.validate().is_err());

        let mut p = valid_new_patient();
        p.sex = "robot".to_string();
        assert!(p.validate().is_err());

        let mut p = valid_new_patient();
        p.aadhar_number = Some("1234".to_string());
        assert!(p.validate().is_err());

        let mut p = valid_new_patient();
        p.height_cm = Some(10.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_update_patient_validation_only_checks_present_fields() {
        let update = UpdatePatient::default();
        assert!(update.validate().is_ok());

        let update = UpdatePatient {
            mobile: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = UpdatePatient {
            weight_kg: Some(72.5),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
