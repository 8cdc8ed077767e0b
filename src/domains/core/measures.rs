use chrono::{Datelike, NaiveDate};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Body Mass Index from height in centimetres and weight in kilograms,
/// rounded to two decimals. None when either measurement is absent or
/// non-positive.
pub fn compute_bmi(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    let height = height_cm.filter(|h| *h > 0.0)?;
    let weight = weight_kg.filter(|w| *w > 0.0)?;
    let height_m = height / 100.0;
    Some(round2(weight / (height_m * height_m)))
}

/// Age as a plain difference of calendar years.
///
/// Deliberately ignores month and day to match the behaviour the rest of
/// the hospital stack has always shown; callers that need an exact age
/// must not use this.
pub fn age_years(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    as_of.year() - date_of_birth.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_reference_value() {
        assert_eq!(compute_bmi(Some(175.0), Some(70.0)), Some(22.86));
        assert_eq!(compute_bmi(Some(160.0), Some(55.0)), Some(21.48));
        assert_eq!(compute_bmi(Some(180.0), Some(95.5)), Some(29.48));
    }

    #[test]
    fn test_bmi_missing_or_zero_inputs() {
        assert_eq!(compute_bmi(None, Some(70.0)), None);
        assert_eq!(compute_bmi(Some(175.0), None), None);
        assert_eq!(compute_bmi(None, None), None);
        assert_eq!(compute_bmi(Some(0.0), Some(70.0)), None);
        assert_eq!(compute_bmi(Some(175.0), Some(0.0)), None);
        assert_eq!(compute_bmi(Some(-170.0), Some(70.0)), None);
    }

    #[test]
    fn test_age_is_year_difference_only() {
        let dob = NaiveDate::from_ymd_opt(1990, 12, 31).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        // Not yet 35 by calendar reckoning, but the year difference wins
        assert_eq!(age_years(dob, as_of), 35);

        let dob = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        assert_eq!(age_years(dob, as_of), 25);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(22.857142), 22.86);
        assert_eq!(round2(21.0), 21.0);
        assert_eq!(round2(0.005), 0.01);
    }
}
