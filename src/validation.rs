use crate::errors::{DomainError, DomainResult, ValidationError};
use chrono::NaiveDate;
use regex::Regex;
use sqlx::{query_scalar, SqlitePool};
use std::sync::OnceLock;
use uuid::Uuid;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap())
}

fn mobile_regex() -> &'static Regex {
    // Indian mobile numbers: ten digits, first digit 6-9
    static MOBILE_REGEX: OnceLock<Regex> = OnceLock::new();
    MOBILE_REGEX.get_or_init(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap())
}

fn aadhar_regex() -> &'static Regex {
    static AADHAR_REGEX: OnceLock<Regex> = OnceLock::new();
    AADHAR_REGEX.get_or_init(|| Regex::new(r"^[0-9]{12}$").unwrap())
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where T: Default + PartialEq {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where F: FnOnce(&T) -> Result<(), ValidationError>, T: Clone {
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            // Return the first error for simplicity
            Err(DomainError::Validation(self.errors[0].clone()))
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn min_length(mut self, min: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() < min {
                self.errors.push(ValidationError::min_length(&self.field_name, min));
            }
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.len() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn email(self) -> Self {
        self.matches_pattern(email_regex(), "must be a valid email address")
    }

    pub fn mobile(self) -> Self {
        self.matches_pattern(mobile_regex(), "must be a valid 10-digit mobile number")
    }

    pub fn aadhar(self) -> Self {
        self.matches_pattern(aadhar_regex(), "must be a 12-digit Aadhar number")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors.push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where T: PartialOrd + Clone + std::fmt::Display
{
    pub fn min(mut self, min: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    "maximum".to_string()
                ));
            }
        }
        self
    }

    pub fn max(mut self, max: T) -> Self {
        if let Some(value) = &self.value {
            if value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    "minimum".to_string(),
                    max.to_string()
                ));
            }
        }
        self
    }

    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string()
                ));
            }
        }
        self
    }
}

/// UUID validation helpers
impl ValidationBuilder<Uuid> {
    pub fn not_nil(mut self) -> Self {
        if let Some(value) = &self.value {
            if *value == Uuid::nil() {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    "cannot be a nil UUID"
                ));
            }
        }
        self
    }
}

/// Validation utility for checking an active entity exists in the database
pub async fn validate_entity_exists(
    pool: &SqlitePool,
    table: &str,
    id: &Uuid,
    field_name: &str,
) -> DomainResult<()> {
    let query = format!(
        "SELECT COUNT(*) FROM {} WHERE id = ? AND is_active = 1",
        table
    );

    let count: i64 = query_scalar(&query)
        .bind(id.to_string())
        .fetch_one(pool)
        .await
        .map_err(|e| DomainError::Database(e.into()))?;

    if count == 0 {
        return Err(DomainError::Validation(
            ValidationError::relationship(&format!("{} does not exist", field_name))
        ));
    }

    Ok(())
}

// Common validation utility module for frequently validated fields
pub mod common {
    use super::*;

    pub fn validate_sex(sex: &str) -> DomainResult<()> {
        ValidationBuilder::new("sex", Some(sex.to_string()))
            .one_of(&["male", "female", "other"], None)
            .validate()
    }

    pub fn validate_blood_group(blood_group: &str) -> DomainResult<()> {
        ValidationBuilder::new("blood_group", Some(blood_group.to_string()))
            .one_of(&["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"], None)
            .validate()
    }

    pub fn validate_date_format(date_str: &str, field_name: &str) -> DomainResult<()> {
        match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(_) => Ok(()),
            Err(_) => Err(DomainError::Validation(ValidationError::format(
                field_name,
                "must be in the format YYYY-MM-DD",
            ))),
        }
    }

    pub fn validate_dob_not_in_future(dob: NaiveDate, today: NaiveDate) -> DomainResult<()> {
        if dob > today {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "date_of_birth",
                "cannot be in the future",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(email_regex().is_match("user@example.com"));
        assert!(email_regex().is_match("user.name+tag@example.co.uk"));
        assert!(!email_regex().is_match("user@"));
        assert!(!email_regex().is_match("@example.com"));
        assert!(!email_regex().is_match("user@example"));
    }

    #[test]
    fn test_mobile_validation() {
        assert!(mobile_regex().is_match("9876543210"));
        assert!(mobile_regex().is_match("6000000001"));
        assert!(!mobile_regex().is_match("1234567890")); // starts with 1
        assert!(!mobile_regex().is_match("98765"));
        assert!(!mobile_regex().is_match("98765432100"));
        assert!(!mobile_regex().is_match("abcdefghij"));
    }

    #[test]
    fn test_aadhar_validation() {
        assert!(aadhar_regex().is_match("123456789012"));
        assert!(!aadhar_regex().is_match("12345678901"));
        assert!(!aadhar_regex().is_match("1234567890123"));
        assert!(!aadhar_regex().is_match("12345678901a"));
    }

    #[test]
    fn test_validation_builder() {
        let result = ValidationBuilder::new("name", Some("".to_string()))
            .required()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("name", Some("test".to_string()))
            .required()
            .min_length(5)
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("email", Some("invalid".to_string()))
            .email()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("email", Some("valid@example.com".to_string()))
            .email()
            .validate();
        assert!(result.is_ok());

        let result = ValidationBuilder::new("height_cm", Some(20.0))
            .range(30.0, 300.0)
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("height_cm", Some(175.0))
            .range(30.0, 300.0)
            .validate();
        assert!(result.is_ok());

        // Required validation for Option
        let value: Option<String> = None;
        let result = ValidationBuilder::new("name", value)
            .required()
            .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_common_validations() {
        assert!(common::validate_sex("male").is_ok());
        assert!(common::validate_sex("other").is_ok());
        assert!(common::validate_sex("unknown").is_err());

        assert!(common::validate_blood_group("O+").is_ok());
        assert!(common::validate_blood_group("AB-").is_ok());
        assert!(common::validate_blood_group("C+").is_err());

        assert!(common::validate_date_format("2023-01-01", "date").is_ok());
        assert!(common::validate_date_format("01/01/2023", "date").is_err());

        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let dob = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(common::validate_dob_not_in_future(dob, today).is_err());
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert!(common::validate_dob_not_in_future(dob, today).is_ok());
    }
}
