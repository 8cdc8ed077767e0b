//! Row-to-entity parsing helpers shared by the domain repositories.
//! All columns are stored as text; these convert back to the typed
//! representations and surface bad data as field-level validation errors.

use crate::errors::{DomainError, DomainResult, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;
use uuid::Uuid;

pub fn parse_uuid(s: &str, field_name: &str) -> DomainResult<Uuid> {
    Uuid::from_str(s).map_err(|_| {
        DomainError::Validation(ValidationError::format(
            field_name,
            &format!("Invalid UUID format: {}", s),
        ))
    })
}

pub fn parse_optional_uuid(s: &Option<String>, field_name: &str) -> DomainResult<Option<Uuid>> {
    match s {
        Some(id_str) => parse_uuid(id_str, field_name).map(Some),
        None => Ok(None),
    }
}

pub fn parse_datetime(s: &str, field_name: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DomainError::Validation(ValidationError::format(
                field_name,
                &format!("Invalid RFC3339 format: {}", s),
            ))
        })
}

pub fn parse_optional_datetime(
    s: &Option<String>,
    field_name: &str,
) -> DomainResult<Option<DateTime<Utc>>> {
    match s {
        Some(dt_str) => parse_datetime(dt_str, field_name).map(Some),
        None => Ok(None),
    }
}

pub fn parse_date(s: &str, field_name: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        DomainError::Validation(ValidationError::format(
            field_name,
            &format!("Invalid date format: {}", s),
        ))
    })
}

pub fn parse_optional_date(s: &Option<String>, field_name: &str) -> DomainResult<Option<NaiveDate>> {
    match s {
        Some(date_str) => parse_date(date_str, field_name).map(Some),
        None => Ok(None),
    }
}
