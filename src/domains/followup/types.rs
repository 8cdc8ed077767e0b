use crate::domains::core::parse::{
    parse_date, parse_datetime, parse_optional_date, parse_optional_datetime, parse_optional_uuid,
    parse_uuid,
};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// FollowUpRecord entity - an outpatient review visit for a patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub follow_up_date: NaiveDate,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medication: Option<String>,
    pub next_review_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

/// NewFollowUpRecord DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFollowUpRecord {
    pub patient_id: Uuid,
    pub follow_up_date: NaiveDate,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medication: Option<String>,
    pub next_review_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for NewFollowUpRecord {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_id", Some(self.patient_id))
            .not_nil()
            .validate()?;

        if let Some(next_review) = self.next_review_date {
            if next_review < self.follow_up_date {
                return Err(DomainError::Validation(ValidationError::invalid_value(
                    "next_review_date",
                    "cannot be before the follow-up date",
                )));
            }
        }

        Ok(())
    }
}

/// UpdateFollowUpRecord DTO
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFollowUpRecord {
    pub follow_up_date: Option<NaiveDate>,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medication: Option<String>,
    pub next_review_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for UpdateFollowUpRecord {
    fn validate(&self) -> DomainResult<()> {
        if let (Some(date), Some(next_review)) = (self.follow_up_date, self.next_review_date) {
            if next_review < date {
                return Err(DomainError::Validation(ValidationError::invalid_value(
                    "next_review_date",
                    "cannot be before the follow-up date",
                )));
            }
        }
        Ok(())
    }
}

/// FollowUpRecordRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct FollowUpRecordRow {
    pub id: String,
    pub patient_id: String,
    pub follow_up_date: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medication: Option<String>,
    pub next_review_date: Option<String>,
    pub notes: Option<String>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl FollowUpRecordRow {
    pub fn into_entity(self) -> DomainResult<FollowUpRecord> {
        Ok(FollowUpRecord {
            id: parse_uuid(&self.id, "id")?,
            patient_id: parse_uuid(&self.patient_id, "patient_id")?,
            follow_up_date: parse_date(&self.follow_up_date, "follow_up_date")?,
            symptoms: self.symptoms,
            diagnosis: self.diagnosis,
            prescribed_medication: self.prescribed_medication,
            next_review_date: parse_optional_date(&self.next_review_date, "next_review_date")?,
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

/// FollowUpRecordResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRecordResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub follow_up_date: NaiveDate,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescribed_medication: Option<String>,
    pub next_review_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FollowUpRecord> for FollowUpRecordResponse {
    fn from(record: FollowUpRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id,
            follow_up_date: record.follow_up_date,
            symptoms: record.symptoms,
            diagnosis: record.diagnosis,
            prescribed_medication: record.prescribed_medication,
            next_review_date: record.next_review_date,
            notes: record.notes,
            is_active: record.is_active,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for follow-up lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowUpFilter {
    pub patient_id: Option<Uuid>,
    /// Follow-up-date range, inclusive `YYYY-MM-DD` bounds
    pub date_range: Option<(String, String)>,
    pub include_inactive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_review_must_follow_visit() {
        let record = NewFollowUpRecord {
            patient_id: Uuid::new_v4(),
            follow_up_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            symptoms: None,
            diagnosis: None,
            prescribed_medication: None,
            next_review_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            notes: None,
        };
        assert!(record.validate().is_err());

        let record = NewFollowUpRecord {
            next_review_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            ..record
        };
        assert!(record.validate().is_ok());
    }
}
