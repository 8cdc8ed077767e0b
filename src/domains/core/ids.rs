use crate::errors::{DbError, DomainResult};
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};

/// Scope key for the patient identifier series of a given year.
pub fn patient_scope(year: i32) -> String {
    format!("patient:{}", year)
}

/// Claim the next value of a scoped sequence.
///
/// Single upsert statement, so concurrent callers inside their own write
/// transactions are serialized by the store and can never observe the same
/// value. `seed` is the value the sequence continues from when the scope
/// row does not exist yet (pass 0 for a fresh series).
pub async fn next_in_scope(
    tx: &mut Transaction<'_, Sqlite>,
    scope: &str,
    seed: i64,
) -> DomainResult<i64> {
    let value: i64 = sqlx::query_scalar(
        "INSERT INTO id_sequences (scope, next_value) VALUES (?, ?)
         ON CONFLICT(scope) DO UPDATE SET next_value = next_value + 1
         RETURNING next_value",
    )
    .bind(scope)
    .bind(seed + 1)
    .fetch_one(&mut **tx)
    .await
    .map_err(DbError::from)?;

    Ok(value)
}

/// Format a patient identifier: `PAT<year><counter>`, counter zero-padded
/// to at least four digits.
pub fn format_patient_id(year: i32, seq: i64) -> String {
    format!("PAT{}{:04}", year, seq)
}

/// Format a camp registration identifier: `CAMP<YYYYMMDD><counter>` from
/// the camp's date, counter zero-padded to at least four digits.
pub fn format_registration_id(camp_date: NaiveDate, seq: i64) -> String {
    format!("CAMP{}{:04}", camp_date.format("%Y%m%d"), seq)
}

/// Parse the trailing counter of an existing patient identifier for the
/// given year. Returns None when the identifier belongs to another year
/// or does not follow the `PAT<year><digits>` shape.
pub fn parse_patient_seq(patient_id: &str, year: i32) -> Option<i64> {
    let prefix = format!("PAT{}", year);
    let rest = patient_id.strip_prefix(&prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_patient_id() {
        assert_eq!(format_patient_id(2025, 1), "PAT20250001");
        assert_eq!(format_patient_id(2025, 42), "PAT20250042");
        assert_eq!(format_patient_id(2025, 12345), "PAT202512345");
    }

    #[test]
    fn test_format_registration_id() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 17).unwrap();
        assert_eq!(format_registration_id(date, 4), "CAMP202508170004");
        assert_eq!(format_registration_id(date, 10000), "CAMP2025081710000");
    }

    #[test]
    fn test_parse_patient_seq() {
        assert_eq!(parse_patient_seq("PAT20250001", 2025), Some(1));
        assert_eq!(parse_patient_seq("PAT20250137", 2025), Some(137));
        assert_eq!(parse_patient_seq("PAT20240137", 2025), None);
        assert_eq!(parse_patient_seq("PAT2025", 2025), None);
        assert_eq!(parse_patient_seq("PAT2025x001", 2025), None);
        assert_eq!(parse_patient_seq("garbage", 2025), None);
    }

    #[tokio::test]
    async fn test_next_in_scope_is_monotonic() {
        let pool = crate::db::init_db("sqlite::memory:").await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let first = next_in_scope(&mut tx, "patient:2025", 0).await.unwrap();
        let second = next_in_scope(&mut tx, "patient:2025", 0).await.unwrap();
        let other_scope = next_in_scope(&mut tx, "patient:2026", 0).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(other_scope, 1);
    }

    #[tokio::test]
    async fn test_next_in_scope_seeds_from_existing_max() {
        let pool = crate::db::init_db("sqlite::memory:").await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        // Continuing a series imported from a predecessor system
        let value = next_in_scope(&mut tx, "patient:2025", 137).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(value, 138);
    }
}
