use crate::domains::core::measures;
use crate::domains::core::parse::{
    parse_datetime, parse_optional_date, parse_optional_datetime, parse_optional_uuid, parse_uuid,
};
use crate::errors::DomainResult;
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const EVALUATION_STATUSES: &[&str] = &["in_progress", "completed", "on_hold"];
pub const LISTING_DECISIONS: &[&str] = &["listed", "not_listed", "deferred"];

/// LiverTransplantEvaluation entity - a pre-transplant workup record.
/// The MELD score is stored as given; it is never computed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiverTransplantEvaluation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub etiology: Option<String>,
    pub meld_score: Option<i64>,
    pub ctp_class: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi_kg_m2: Option<f64>,
    pub comorbidities: Option<String>,
    pub evaluation_status: String,
    pub evaluation_date: Option<NaiveDate>,
    pub listing_decision: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub updated_by_user_id: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by_user_id: Option<Uuid>,
}

/// NewLiverTransplantEvaluation DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLiverTransplantEvaluation {
    pub patient_id: Uuid,
    pub etiology: Option<String>,
    pub meld_score: Option<i64>,
    pub ctp_class: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub comorbidities: Option<String>,
    pub evaluation_status: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
    pub listing_decision: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewLiverTransplantEvaluation {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("patient_id", Some(self.patient_id))
            .not_nil()
            .validate()?;

        if let Some(meld) = self.meld_score {
            ValidationBuilder::new("meld_score", Some(meld))
                .range(6, 40)
                .validate()?;
        }

        if let Some(ctp) = &self.ctp_class {
            ValidationBuilder::new("ctp_class", Some(ctp.clone()))
                .one_of(&["A", "B", "C"], None)
                .validate()?;
        }

        if let Some(status) = &self.evaluation_status {
            ValidationBuilder::new("evaluation_status", Some(status.clone()))
                .one_of(EVALUATION_STATUSES, None)
                .validate()?;
        }

        if let Some(decision) = &self.listing_decision {
            ValidationBuilder::new("listing_decision", Some(decision.clone()))
                .one_of(LISTING_DECISIONS, None)
                .validate()?;
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

/// UpdateLiverTransplantEvaluation DTO
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateLiverTransplantEvaluation {
    pub etiology: Option<String>,
    pub meld_score: Option<i64>,
    pub ctp_class: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub comorbidities: Option<String>,
    pub evaluation_status: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
    pub listing_decision: Option<String>,
    pub notes: Option<String>,
}

impl Validate for UpdateLiverTransplantEvaluation {
    fn validate(&self) -> DomainResult<()> {
        if let Some(meld) = self.meld_score {
            ValidationBuilder::new("meld_score", Some(meld))
                .range(6, 40)
                .validate()?;
        }

        if let Some(ctp) = &self.ctp_class {
            ValidationBuilder::new("ctp_class", Some(ctp.clone()))
                .one_of(&["A", "B", "C"], None)
                .validate()?;
        }

        if let Some(status) = &self.evaluation_status {
            ValidationBuilder::new("evaluation_status", Some(status.clone()))
                .one_of(EVALUATION_STATUSES, None)
                .validate()?;
        }

        if let Some(decision) = &self.listing_decision {
            ValidationBuilder::new("listing_decision", Some(decision.clone()))
                .one_of(LISTING_DECISIONS, None)
                .validate()?;
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

/// LiverTransplantEvaluationRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct LiverTransplantEvaluationRow {
    pub id: String,
    pub patient_id: String,
    pub etiology: Option<String>,
    pub meld_score: Option<i64>,
    pub ctp_class: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi_kg_m2: Option<f64>,
    pub comorbidities: Option<String>,
    pub evaluation_status: String,
    pub evaluation_date: Option<String>,
    pub listing_decision: Option<String>,
    pub notes: Option<String>,
    pub is_active: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by_user_id: Option<String>,
    pub updated_by_user_id: Option<String>,
    pub deactivated_at: Option<String>,
    pub deactivated_by_user_id: Option<String>,
}

impl LiverTransplantEvaluationRow {
    pub fn into_entity(self) -> DomainResult<LiverTransplantEvaluation> {
        Ok(LiverTransplantEvaluation {
            id: parse_uuid(&self.id, "id")?,
            patient_id: parse_uuid(&self.patient_id, "patient_id")?,
            etiology: self.etiology,
            meld_score: self.meld_score,
            ctp_class: self.ctp_class,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            bmi_kg_m2: self.bmi_kg_m2,
            comorbidities: self.comorbidities,
            evaluation_status: self.evaluation_status,
            evaluation_date: parse_optional_date(&self.evaluation_date, "evaluation_date")?,
            listing_decision: self.listing_decision,
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

/// LiverTransplantEvaluationResponse DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiverTransplantEvaluationResponse {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub etiology: Option<String>,
    pub meld_score: Option<i64>,
    pub ctp_class: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi_kg_m2: Option<f64>,
    pub comorbidities: Option<String>,
    pub evaluation_status: String,
    pub evaluation_date: Option<NaiveDate>,
    pub listing_decision: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LiverTransplantEvaluation> for LiverTransplantEvaluationResponse {
    fn from(eval: LiverTransplantEvaluation) -> Self {
        Self {
            id: eval.id,
            patient_id: eval.patient_id,
            etiology: eval.etiology,
            meld_score: eval.meld_score,
            ctp_class: eval.ctp_class,
            height_cm: eval.height_cm,
            weight_kg: eval.weight_kg,
            bmi_kg_m2: eval.bmi_kg_m2,
            comorbidities: eval.comorbidities,
            evaluation_status: eval.evaluation_status,
            evaluation_date: eval.evaluation_date,
            listing_decision: eval.listing_decision,
            notes: eval.notes,
            is_active: eval.is_active,
            created_at: eval.created_at.to_rfc3339(),
            updated_at: eval.updated_at.to_rfc3339(),
        }
    }
}

/// Filter for evaluation lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationFilter {
    pub patient_id: Option<Uuid>,
    pub evaluation_status: Option<String>,
    pub listing_decision: Option<String>,
    pub include_inactive: bool,
}

/// Body measurements use the same BMI rule as the patient registry.
pub fn evaluation_bmi(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    measures::compute_bmi(height_cm, weight_kg)
}
