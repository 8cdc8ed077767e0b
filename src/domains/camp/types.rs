// src/domains/camp/types.rs

use crate::domains::core::parse::{
    parse_date, parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// Fixed per-service price table for health camps, in rupees.
/// Not configurable at runtime.
pub const SERVICE_PRICES: &[(&str, i64)] = &[
    ("Endoscopy", 999),
    ("SIBO Test", 499),
    ("Complete Health Checkup", 599),
];

pub const SERVICE_ENDOSCOPY: &str = "Endoscopy";
pub const SERVICE_SIBO_TEST: &str = "SIBO Test";
pub const SERVICE_HEALTH_CHECKUP: &str = "Complete Health Checkup";

/// Price of a single service. Unknown service names cost nothing.
pub fn service_price(name: &str) -> i64 {
    SERVICE_PRICES
        .iter()
        .find(|(service, _)| *service == name)
        .map(|(_, price)| *price)
        .unwrap_or(0)
}

/// Total payable for a set of selected services. Duplicate names are
/// counted once; unknown names contribute zero.
pub fn total_amount(services: &[String]) -> i64 {
    let unique: HashSet<&str> = services.iter().map(|s| s.as_str()).collect();
    unique.iter().map(|name| service_price(name)).sum()
}

/// Triage priority derived from the registration symptom checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    High,
    Normal,
    Low,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::High => "HIGH",
            PriorityLevel::Normal => "NORMAL",
            PriorityLevel::Low => "LOW",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HIGH" => Some(PriorityLevel::High),
            "NORMAL" => Some(PriorityLevel::Normal),
            "LOW" => Some(PriorityLevel::Low),
            _ => None,
        }
    }
}

/// Payment state of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Waived,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Waived => "waived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "waived" => Some(PaymentStatus::Waived),
            _ => None,
        }
    }
}

/// Symptom checklist captured at registration time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomChecklist {
    pub unexplained_weight_loss: bool,
    pub jaundice_yellow_eyes: bool,
    pub difficulty_swallowing: bool,
    pub abdominal_pain: bool,
    pub nausea_vomiting: bool,
    pub bowel_habits_change: bool,
}

impl SymptomChecklist {
    /// Alarm symptoms always win over the moderate ones.
    pub fn priority_level(&self) -> PriorityLevel {
        if self.unexplained_weight_loss || self.jaundice_yellow_eyes || self.difficulty_swallowing {
            PriorityLevel::High
        } else if self.abdominal_pain || self.nausea_vomiting || self.bowel_habits_change {
            PriorityLevel::Normal
        } else {
            PriorityLevel::Low
        }
    }
}

/// Camp entity - a health-camp event with bounded capacity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Camp {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub camp_date: NaiveDate,
    pub organizer: Option<String>,
    pub max_capacity: i64,
    /// Count of registrations ever created for this camp; also the source
    /// of the per-camp registration sequence, so it never decreases.
    pub current_registrations: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

impl Camp {
    pub fn is_full(&self) -> bool {
        self.current_registrations >= self.max_capacity
    }

    pub fn remaining_capacity(&self) -> i64 {
        (self.max_capacity - self.current_registrations).max(0)
    }
}

/// NewCamp DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCamp {
    pub name: String,
    pub location: Option<String>,
    pub camp_date: NaiveDate,
    pub organizer: Option<String>,
    pub max_capacity: i64,
}

impl Validate for NewCamp {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(3)
            .max_length(200)
            .validate()?;

        ValidationBuilder::new("max_capacity", Some(self.max_capacity))
            .min(1)
            .validate()?;

        Ok(())
    }
}

/// UpdateCamp DTO - capacity may grow but the registration counter is
/// never touched from here
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCamp {
    pub name: Option<String>,
    pub location: Option<String>,
    pub camp_date: Option<NaiveDate>,
    pub organizer: Option<String>,
    pub max_capacity: Option<i64>,
}

impl Validate for UpdateCamp {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .required()
                .min_length(3)
                .max_length(200)
                .validate()?;
        }

        if let Some(capacity) = self.max_capacity {
            ValidationBuilder::new("max_capacity", Some(capacity))
                .min(1)
                .validate()?;
        }

        Ok(())
    }
}

/// CampRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct CampRow {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub camp_date: String,
    pub organizer: Option<String>,
    pub max_capacity: i64,
    pub current_registrations: i64,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl CampRow {
    pub fn into_entity(self) -> DomainResult<Camp> {
        Ok(Camp {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            location: self.location,
            camp_date: parse_date(&self.camp_date, "camp_date")?,
            organizer: self.organizer,
            max_capacity: self.max_capacity,
            current_registrations: self.current_registrations,
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

/// CampResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampResponse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub camp_date: NaiveDate,
    pub organizer: Option<String>,
    pub max_capacity: i64,
    pub current_registrations: i64,
    pub remaining_capacity: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Camp> for CampResponse {
    fn from(camp: Camp) -> Self {
        let remaining = camp.remaining_capacity();
        Self {
            id: camp.id,
            name: camp.name,
            location: camp.location,
            camp_date: camp.camp_date,
            organizer: camp.organizer,
            max_capacity: camp.max_capacity,
            current_registrations: camp.current_registrations,
            remaining_capacity: remaining,
            is_active: camp.is_active,
            created_at: camp.created_at.to_rfc3339(),
            updated_at: camp.updated_at.to_rfc3339(),
        }
    }
}

/// CampRegistration entity - one participant registered into one camp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampRegistration {
    pub id: Uuid,
    /// Human-readable identifier, `CAMP<YYYYMMDD><seq>`. Immutable.
    pub registration_id: String,
    pub camp_id: Uuid,
    pub name: String,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub selected_services: Vec<String>,
    pub total_amount: i64,
    pub endoscopy_selected: bool,
    pub sibo_test_selected: bool,
    pub health_checkup_selected: bool,
    pub symptoms: SymptomChecklist,
    pub priority_level: PriorityLevel,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

/// NewCampRegistration DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampRegistration {
    pub camp_id: Uuid,
    pub name: String,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub selected_services: Vec<String>,
    #[serde(default)]
    pub symptoms: SymptomChecklist,
    pub payment_status: Option<PaymentStatus>,
}

impl Validate for NewCampRegistration {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("camp_id", Some(self.camp_id))
            .not_nil()
            .validate()?;

        ValidationBuilder::new("name", Some(self.name.clone()))
            .required()
            .min_length(2)
            .max_length(200)
            .validate()?;

        ValidationBuilder::new("mobile", Some(self.mobile.clone()))
            .required()
            .mobile()
            .validate()?;

        if let Some(age) = self.age {
            ValidationBuilder::new("age", Some(age))
                .range(0, 150)
                .validate()?;
        }

        if let Some(sex) = &self.sex {
            crate::validation::common::validate_sex(sex)?;
        }

        if let Some(email) = &self.email {
            ValidationBuilder::new("email", Some(email.clone()))
                .email()
                .validate()?;
        }

        Ok(())
    }
}

/// UpdateCampRegistration DTO - contact and triage fields only; the
/// identifier and camp binding never change
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCampRegistration {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Replaces the whole service selection; amount and flags re-derive
    pub selected_services: Option<Vec<String>>,
    /// Replaces the whole checklist; priority re-derives
    pub symptoms: Option<SymptomChecklist>,
    pub payment_status: Option<PaymentStatus>,
}

impl Validate for UpdateCampRegistration {
    fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .required()
                .min_length(2)
                .max_length(200)
                .validate()?;
        }

        if let Some(age) = self.age {
            ValidationBuilder::new("age", Some(age))
                .range(0, 150)
                .validate()?;
        }

        if let Some(sex) = &self.sex {
            crate::validation::common::validate_sex(sex)?;
        }

        if let Some(mobile) = &self.mobile {
            ValidationBuilder::new("mobile", Some(mobile.clone()))
                .mobile()
                .validate()?;
        }

        if let Some(email) = &self.email {
            ValidationBuilder::new("email", Some(email.clone()))
                .email()
                .validate()?;
        }

        Ok(())
    }
}

/// CampRegistrationRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct CampRegistrationRow {
    pub id: String,
    pub registration_id: String,
    pub camp_id: String,
    pub name: String,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub selected_services: String,
    pub total_amount: i64,
    pub endoscopy_selected: i64,
    pub sibo_test_selected: i64,
    pub health_checkup_selected: i64,
    pub unexplained_weight_loss: i64,
    pub jaundice_yellow_eyes: i64,
    pub difficulty_swallowing: i64,
    pub abdominal_pain: i64,
    pub nausea_vomiting: i64,
    pub bowel_habits_change: i64,
    pub priority_level: String,
    pub payment_status: String,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl CampRegistrationRow {
    pub fn into_entity(self) -> DomainResult<CampRegistration> {
        let selected_services: Vec<String> =
            serde_json::from_str(&self.selected_services).map_err(|_| {
                DomainError::Validation(ValidationError::format(
                    "selected_services",
                    "stored service list is not valid JSON",
                ))
            })?;

        let priority_level = PriorityLevel::from_str(&self.priority_level).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "priority_level",
                &format!("unknown priority: {}", self.priority_level),
            ))
        })?;

        let payment_status = PaymentStatus::from_str(&self.payment_status).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "payment_status",
                &format!("unknown payment status: {}", self.payment_status),
            ))
        })?;

        Ok(CampRegistration {
            id: parse_uuid(&self.id, "id")?,
            registration_id: self.registration_id,
            camp_id: parse_uuid(&self.camp_id, "camp_id")?,
            name: self.name,
            age: self.age,
            sex: self.sex,
            mobile: self.mobile,
            email: self.email,
            address: self.address,
            selected_services,
            total_amount: self.total_amount,
            endoscopy_selected: self.endoscopy_selected != 0,
            sibo_test_selected: self.sibo_test_selected != 0,
            health_checkup_selected: self.health_checkup_selected != 0,
            symptoms: SymptomChecklist {
                unexplained_weight_loss: self.unexplained_weight_loss != 0,
                jaundice_yellow_eyes: self.jaundice_yellow_eyes != 0,
                difficulty_swallowing: self.difficulty_swallowing != 0,
                abdominal_pain: self.abdominal_pain != 0,
                nausea_vomiting: self.nausea_vomiting != 0,
                bowel_habits_change: self.bowel_habits_change != 0,
            },
            priority_level,
            payment_status,
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

/// CampRegistrationResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampRegistrationResponse {
    pub id: Uuid,
    pub registration_id: String,
    pub camp_id: Uuid,
    pub name: String,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub mobile: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub selected_services: Vec<String>,
    pub total_amount: i64,
    pub endoscopy_selected: bool,
    pub sibo_test_selected: bool,
    pub health_checkup_selected: bool,
    pub symptoms: SymptomChecklist,
    pub priority_level: PriorityLevel,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CampRegistration> for CampRegistrationResponse {
    fn from(reg: CampRegistration) -> Self {
        Self {
            id: reg.id,
            registration_id: reg.registration_id,
            camp_id: reg.camp_id,
            name: reg.name,
            age: reg.age,
            sex: reg.sex,
            mobile: reg.mobile,
            email: reg.email,
            address: reg.address,
            selected_services: reg.selected_services,
            total_amount: reg.total_amount,
            endoscopy_selected: reg.endoscopy_selected,
            sibo_test_selected: reg.sibo_test_selected,
            health_checkup_selected: reg.health_checkup_selected,
            symptoms: reg.symptoms,
            priority_level: reg.priority_level,
            payment_status: reg.payment_status,
            is_active: reg.is_active,
            created_at: reg.created_at.to_rfc3339(),
            updated_at: reg.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for camp lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampFilter {
    /// Free-text search over name, location and organizer
    pub search: Option<String>,
    /// Camp-date range, inclusive `YYYY-MM-DD` bounds
    pub date_range: Option<(String, String)>,
    pub include_inactive: bool,
}

/// Filter for registration lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub camp_id: Option<Uuid>,
    pub priority_level: Option<PriorityLevel>,
    pub payment_status: Option<PaymentStatus>,
    /// Free-text search over name, mobile and registration_id
    pub search: Option<String>,
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_price_table() {
        assert_eq!(service_price("Endoscopy"), 999);
        assert_eq!(service_price("SIBO Test"), 499);
        assert_eq!(service_price("Complete Health Checkup"), 599);
        assert_eq!(service_price("Unknown Service"), 0);
    }

    #[test]
    fn test_total_amount_over_all_subsets() {
        let all = [
            ("Endoscopy", 999),
            ("SIBO Test", 499),
            ("Complete Health Checkup", 599),
        ];
        for mask in 0..8u32 {
            let mut services = Vec::new();
            let mut expected = 0;
            for (i, (name, price)) in all.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    services.push(name.to_string());
                    expected += price;
                }
            }
            assert_eq!(total_amount(&services), expected, "subset mask {}", mask);
        }
    }

    #[test]
    fn test_total_amount_ignores_unknown_and_duplicates() {
        let services = vec![
            "Endoscopy".to_string(),
            "Endoscopy".to_string(),
            "Reiki Healing".to_string(),
        ];
        assert_eq!(total_amount(&services), 999);
        assert_eq!(total_amount(&[]), 0);
    }

    #[test]
    fn test_priority_high_dominates() {
        let symptoms = SymptomChecklist {
            unexplained_weight_loss: true,
            abdominal_pain: true,
            nausea_vomiting: true,
            ..Default::default()
        };
        assert_eq!(symptoms.priority_level(), PriorityLevel::High);

        let symptoms = SymptomChecklist {
            jaundice_yellow_eyes: true,
            ..Default::default()
        };
        assert_eq!(symptoms.priority_level(), PriorityLevel::High);

        let symptoms = SymptomChecklist {
            difficulty_swallowing: true,
            ..Default::default()
        };
        assert_eq!(symptoms.priority_level(), PriorityLevel::High);
    }

    #[test]
    fn test_priority_moderate_and_low() {
        let symptoms = SymptomChecklist {
            bowel_habits_change: true,
            ..Default::default()
        };
        assert_eq!(symptoms.priority_level(), PriorityLevel::Normal);

        let symptoms = SymptomChecklist::default();
        assert_eq!(symptoms.priority_level(), PriorityLevel::Low);
    }

    #[test]
    fn test_new_registration_validation() {
        let reg = NewCampRegistration {
            camp_id: Uuid::new_v4(),
            name: "Sita Devi".to_string(),
            age: Some(45),
            sex: Some("female".to_string()),
            mobile: "9876543210".to_string(),
            email: None,
            address: None,
            selected_services: vec!["Endoscopy".to_string()],
            symptoms: SymptomChecklist::default(),
            payment_status: None,
        };
        assert!(reg.validate().is_ok());

        let mut bad = reg.clone();
        bad.camp_id = Uuid::nil();
        assert!(bad.validate().is_err());

        let mut bad = reg.clone();
        bad.mobile = "12".to_string();
        assert!(bad.validate().is_err());

        let mut bad = reg;
        bad.age = Some(200);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_camp_capacity_helpers() {
        let camp = Camp {
            id: Uuid::new_v4(),
            name: "Gastro Camp".to_string(),
            location: None,
            camp_date: NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
            organizer: None,
            max_capacity: 50,
            current_registrations: 50,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by_user_id: None,
            updated_by_user_id: None,
            deactivated_at: None,
            deactivated_by_user_id: None,
        };
        assert!(camp.is_full());
        assert_eq!(camp.remaining_capacity(), 0);
    }
}
