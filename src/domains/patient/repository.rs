use crate::auth::AuthContext;
use crate::domains::core::ids;
use crate::domains::core::measures;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::patient::types::{
    NewPatient, Patient, PatientFilter, PatientRow, PatientSortField, UpdatePatient,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams, SortDirection};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sqlx::{query, query_as, query_scalar, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining patient repository operations
#[async_trait]
pub trait PatientRepository: FindById<Patient> + Deactivate + Send + Sync {
    async fn create(&self, new_patient: &NewPatient, auth: &AuthContext) -> DomainResult<Patient>;
    async fn create_with_tx<'t>(
        &self,
        new_patient: &NewPatient,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Patient>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdatePatient,
        auth: &AuthContext,
    ) -> DomainResult<Patient>;
    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update_data: &UpdatePatient,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Patient>;

    /// Look up by the human-readable `PAT...` identifier
    async fn find_by_patient_id(&self, patient_id: &str) -> DomainResult<Patient>;

    async fn find(
        &self,
        filter: &PatientFilter,
        params: PaginationParams,
        sort_by: PatientSortField,
        sort_dir: SortDirection,
    ) -> DomainResult<PaginatedResult<Patient>>;

    /// Bring a deactivated patient back into the active set
    async fn reactivate(&self, id: Uuid, auth: &AuthContext) -> DomainResult<Patient>;
}

/// SQLite implementation for PatientRepository
#[derive(Debug, Clone)]
pub struct SqlitePatientRepository {
    pool: SqlitePool,
}

impl SqlitePatientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: PatientRow) -> DomainResult<Patient> {
        row.into_entity()
    }

    /// Translate unique-index violations into the duplicate-field conflict
    fn map_write_error(e: DbError) -> DomainError {
        if let Some(column) = e.unique_violation_column() {
            let field = column.rsplit('.').next().unwrap_or(&column).to_string();
            return DomainError::DuplicateField {
                entity_type: "Patient".to_string(),
                field,
            };
        }
        DomainError::Database(e)
    }

    async fn find_by_id_with_tx<'t>(
        &self,
        id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Patient> {
        let row = query_as::<_, PatientRow>(
            "SELECT * FROM patients WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Patient".to_string(), id))?;

        Self::map_row_to_entity(row)
    }

    /// Claim the next patient identifier for the current year.
    ///
    /// The sequence row is seeded from the largest identifier already in
    /// the table, so a database populated by import keeps counting from
    /// where the imported series left off.
    async fn next_patient_id<'t>(
        &self,
        year: i32,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<String> {
        let latest: Option<String> = query_scalar(
            "SELECT patient_id FROM patients WHERE patient_id LIKE ?
             ORDER BY LENGTH(patient_id) DESC, patient_id DESC LIMIT 1",
        )
        .bind(format!("PAT{}%", year))
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?;

        let seed = latest
            .as_deref()
            .and_then(|pid| ids::parse_patient_seq(pid, year))
            .unwrap_or(0);

        let seq = ids::next_in_scope(tx, &ids::patient_scope(year), seed).await?;
        Ok(ids::format_patient_id(year, seq))
    }

    /// Append the filter conditions shared by the data and count queries.
    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PatientFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(search) = &filter.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (first_name LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR last_name LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR patient_id LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR mobile LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR aadhar_number LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR mrn LIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }

        if let Some(sex) = &filter.sex {
            if !sex.is_empty() {
                builder.push(" AND sex = ");
                builder.push_bind(sex.clone());
            }
        }

        if let Some(city) = &filter.city {
            if !city.is_empty() {
                builder.push(" AND city = ");
                builder.push_bind(city.clone());
            }
        }

        if let Some(blood_group) = &filter.blood_group {
            if !blood_group.is_empty() {
                builder.push(" AND blood_group = ");
                builder.push_bind(blood_group.clone());
            }
        }

        if let Some((start, end)) = &filter.created_range {
            builder.push(" AND created_at BETWEEN ");
            builder.push_bind(start.clone());
            builder.push(" AND ");
            builder.push_bind(end.clone());
        }
    }
}

#[async_trait]
impl FindById<Patient> for SqlitePatientRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Patient> {
        let row = query_as::<_, PatientRow>(
            "SELECT * FROM patients WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Patient".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl Deactivate for SqlitePatientRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE patients
             SET is_active = 0, deactivated_at = ?, deactivated_by_user_id = ?, updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(&user_id)
        .bind(&now)
        .bind(&user_id)
        .bind(id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            Err(DomainError::EntityNotFound("Patient".to_string(), id))
        } else {
            Ok(())
        }
    }

    async fn deactivate(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        match self.deactivate_with_tx(id, auth, &mut tx).await {
            Ok(()) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(())
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl PatientRepository for SqlitePatientRepository {
    async fn create(&self, new_patient: &NewPatient, auth: &AuthContext) -> DomainResult<Patient> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        match self.create_with_tx(new_patient, auth, &mut tx).await {
            Ok(patient) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(patient)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn create_with_tx<'t>(
        &self,
        new_patient: &NewPatient,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Patient> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let patient_id = self.next_patient_id(now.year(), tx).await?;
        let bmi = measures::compute_bmi(new_patient.height_cm, new_patient.weight_kg);

        query(
            r#"
            INSERT INTO patients (
                id, patient_id, first_name, last_name, date_of_birth, sex,
                mobile, email, address, city, state, aadhar_number, mrn,
                blood_group, occupation, height_cm, weight_kg, bmi,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id,
                deactivated_at, deactivated_by_user_id
            ) VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL
            )
            "#,
        )
        .bind(id.to_string())
        .bind(&patient_id)
        .bind(&new_patient.first_name)
        .bind(&new_patient.last_name)
        .bind(new_patient.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&new_patient.sex)
        .bind(&new_patient.mobile)
        .bind(&new_patient.email)
        .bind(&new_patient.address)
        .bind(&new_patient.city)
        .bind(&new_patient.state)
        .bind(&new_patient.aadhar_number)
        .bind(&new_patient.mrn)
        .bind(&new_patient.blood_group)
        .bind(&new_patient.occupation)
        .bind(new_patient.height_cm)
        .bind(new_patient.weight_kg)
        .bind(bmi)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&mut **tx)
        .await
        .map_err(|e| Self::map_write_error(DbError::from(e)))?;

        self.find_by_id_with_tx(id, tx).await
    }

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdatePatient,
        auth: &AuthContext,
    ) -> DomainResult<Patient> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        match self.update_with_tx(id, update_data, auth, &mut tx).await {
            Ok(patient) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(patient)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn update_with_tx<'t>(
        &self,
        id: Uuid,
        update_data: &UpdatePatient,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<Patient> {
        let current = self.find_by_id_with_tx(id, tx).await?;

        let has_changes = update_data.first_name.is_some()
            || update_data.last_name.is_some()
            || update_data.date_of_birth.is_some()
            || update_data.sex.is_some()
            || update_data.mobile.is_some()
            || update_data.email.is_some()
            || update_data.address.is_some()
            || update_data.city.is_some()
            || update_data.state.is_some()
            || update_data.aadhar_number.is_some()
            || update_data.mrn.is_some()
            || update_data.blood_group.is_some()
            || update_data.occupation.is_some()
            || update_data.height_cm.is_some()
            || update_data.weight_kg.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE patients SET ");
        let mut separated = builder.separated(", ");

        macro_rules! push_field {
            ($col:literal, $value:expr) => {
                if let Some(val) = $value {
                    separated.push(concat!($col, " = "));
                    separated.push_bind_unseparated(val.clone());
                }
            };
        }

        push_field!("first_name", &update_data.first_name);
        push_field!("last_name", &update_data.last_name);
        push_field!("sex", &update_data.sex);
        push_field!("mobile", &update_data.mobile);
        push_field!("email", &update_data.email);
        push_field!("address", &update_data.address);
        push_field!("city", &update_data.city);
        push_field!("state", &update_data.state);
        push_field!("aadhar_number", &update_data.aadhar_number);
        push_field!("mrn", &update_data.mrn);
        push_field!("blood_group", &update_data.blood_group);
        push_field!("occupation", &update_data.occupation);

        if let Some(dob) = update_data.date_of_birth {
            separated.push("date_of_birth = ");
            separated.push_bind_unseparated(dob.format("%Y-%m-%d").to_string());
        }

        if let Some(height) = update_data.height_cm {
            separated.push("height_cm = ");
            separated.push_bind_unseparated(height);
        }

        if let Some(weight) = update_data.weight_kg {
            separated.push("weight_kg = ");
            separated.push_bind_unseparated(weight);
        }

        // BMI never drifts from the measurements: refresh it in the same
        // statement whenever either measurement changes.
        if update_data.height_cm.is_some() || update_data.weight_kg.is_some() {
            let height = update_data.height_cm.or(current.height_cm);
            let weight = update_data.weight_kg.or(current.weight_kg);
            separated.push("bmi = ");
            separated.push_bind_unseparated(measures::compute_bmi(height, weight));
        }

        separated.push("updated_at = ");
        separated.push_bind_unseparated(now_str);
        separated.push("updated_by_user_id = ");
        separated.push_bind_unseparated(user_id_str);

        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());
        builder.push(" AND is_active = 1");

        let result = builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| Self::map_write_error(DbError::from(e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Patient".to_string(), id));
        }

        self.find_by_id_with_tx(id, tx).await
    }

    async fn find_by_patient_id(&self, patient_id: &str) -> DomainResult<Patient> {
        let row = query_as::<_, PatientRow>(
            "SELECT * FROM patients WHERE patient_id = ? AND is_active = 1",
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::IdentifierNotFound {
            entity_type: "Patient".to_string(),
            identifier: patient_id.to_string(),
        })?;

        Self::map_row_to_entity(row)
    }

    async fn find(
        &self,
        filter: &PatientFilter,
        params: PaginationParams,
        sort_by: PatientSortField,
        sort_dir: SortDirection,
    ) -> DomainResult<PaginatedResult<Patient>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM patients WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM patients WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(format!(" ORDER BY {} {}", sort_by.as_column(), sort_dir.as_sql()));
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<PatientRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(Self::map_row_to_entity)
            .collect::<DomainResult<Vec<Patient>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }

    async fn reactivate(&self, id: Uuid, auth: &AuthContext) -> DomainResult<Patient> {
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let result = query(
            "UPDATE patients
             SET is_active = 1, deactivated_at = NULL, deactivated_by_user_id = NULL,
                 updated_at = ?, updated_by_user_id = ?
             WHERE id = ? AND is_active = 0",
        )
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(DbError::from(e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Patient".to_string(), id));
        }

        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (SqlitePool, SqlitePatientRepository, AuthContext) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let repo = SqlitePatientRepository::new(pool.clone());
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Admin);
        (pool, repo, auth)
    }

    fn new_patient(first_name: &str, mobile: &str) -> NewPatient {
        NewPatient {
            first_name: first_name.to_string(),
            last_name: Some("Kumar".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 12),
            sex: "male".to_string(),
            mobile: mobile.to_string(),
            email: None,
            address: None,
            city: Some("Hyderabad".to_string()),
            state: None,
            aadhar_number: None,
            mrn: None,
            blood_group: None,
            occupation: None,
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids_and_bmi() {
        let (_pool, repo, auth) = setup().await;
        let year = Utc::now().year();

        let first = repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        let second = repo.create(&new_patient("Suresh", "9876543211"), &auth).await.unwrap();

        assert_eq!(first.patient_id, format!("PAT{}0001", year));
        assert_eq!(second.patient_id, format!("PAT{}0002", year));
        assert_eq!(first.bmi, Some(22.86));
    }

    #[tokio::test]
    async fn test_create_continues_imported_series() {
        let (pool, repo, auth) = setup().await;
        let year = Utc::now().year();
        let now = Utc::now().to_rfc3339();

        // Row imported from the predecessor system, no sequence entry
        query(
            "INSERT INTO patients (id, patient_id, first_name, sex, mobile, is_active, created_at, updated_at)
             VALUES (?, ?, 'Imported', 'male', '9000000000', 1, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ids::format_patient_id(year, 41))
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap();

        let created = repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        assert_eq!(created.patient_id, ids::format_patient_id(year, 42));
    }

    #[tokio::test]
    async fn test_bmi_none_when_measurements_missing() {
        let (_pool, repo, auth) = setup().await;

        let mut input = new_patient("Ramesh", "9876543210");
        input.weight_kg = None;
        let created = repo.create(&input, &auth).await.unwrap();
        assert_eq!(created.bmi, None);
    }

    #[tokio::test]
    async fn test_duplicate_mobile_is_conflict() {
        let (_pool, repo, auth) = setup().await;

        repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        let err = repo
            .create(&new_patient("Suresh", "9876543210"), &auth)
            .await
            .unwrap_err();

        match err {
            DomainError::DuplicateField { entity_type, field } => {
                assert_eq!(entity_type, "Patient");
                assert_eq!(field, "mobile");
            }
            other => panic!("expected DuplicateField, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_aadhar_is_conflict() {
        let (_pool, repo, auth) = setup().await;

        let mut first = new_patient("Ramesh", "9876543210");
        first.aadhar_number = Some("123456789012".to_string());
        repo.create(&first, &auth).await.unwrap();

        let mut second = new_patient("Suresh", "9876543211");
        second.aadhar_number = Some("123456789012".to_string());
        let err = repo.create(&second, &auth).await.unwrap_err();

        assert!(matches!(err, DomainError::DuplicateField { ref field, .. } if field == "aadhar_number"));
    }

    #[tokio::test]
    async fn test_update_refreshes_bmi() {
        let (_pool, repo, auth) = setup().await;

        let created = repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();

        let update = UpdatePatient {
            weight_kg: Some(80.0),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update, &auth).await.unwrap();

        assert_eq!(updated.weight_kg, Some(80.0));
        assert_eq!(updated.bmi, Some(26.12));
        assert_eq!(updated.patient_id, created.patient_id);
    }

    #[tokio::test]
    async fn test_search_matches_text_fields() {
        let (_pool, repo, auth) = setup().await;

        repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        let mut other = new_patient("Anita", "9876543211");
        other.last_name = Some("Sharma".to_string());
        repo.create(&other, &auth).await.unwrap();

        let filter = PatientFilter {
            search: Some("kumar".to_string()),
            ..Default::default()
        };
        let result = repo
            .find(&filter, PaginationParams::default(), PatientSortField::default(), SortDirection::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].first_name, "Ramesh");

        // Mobile matches too
        let filter = PatientFilter {
            search: Some("9876543211".to_string()),
            ..Default::default()
        };
        let result = repo
            .find(&filter, PaginationParams::default(), PatientSortField::default(), SortDirection::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].first_name, "Anita");
    }

    #[tokio::test]
    async fn test_pagination_envelope() {
        let (_pool, repo, auth) = setup().await;

        for i in 0..12 {
            repo.create(&new_patient(&format!("Patient{:02}", i), &format!("98765432{:02}", i)), &auth)
                .await
                .unwrap();
        }

        let params = PaginationParams { page: 2, per_page: 10 };
        let result = repo
            .find(&PatientFilter::default(), params, PatientSortField::default(), SortDirection::default())
            .await
            .unwrap();

        assert_eq!(result.total, 12);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_pages, 2);
        assert!(!result.has_next);
        assert!(result.has_prev);
    }

    #[tokio::test]
    async fn test_deactivate_excludes_from_default_lists_and_keeps_sequence() {
        let (_pool, repo, auth) = setup().await;
        let year = Utc::now().year();

        let first = repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        repo.deactivate(first.id, &auth).await.unwrap();

        let result = repo
            .find(&PatientFilter::default(), PaginationParams::default(), PatientSortField::default(), SortDirection::default())
            .await
            .unwrap();
        assert_eq!(result.total, 0);

        let filter = PatientFilter {
            include_inactive: true,
            ..Default::default()
        };
        let result = repo
            .find(&filter, PaginationParams::default(), PatientSortField::default(), SortDirection::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert!(!result.items[0].is_active);

        // The deactivated patient's sequence number is never reused
        let next = repo.create(&new_patient("Suresh", "9876543211"), &auth).await.unwrap();
        assert_eq!(next.patient_id, format!("PAT{}0002", year));
    }

    #[tokio::test]
    async fn test_reactivate() {
        let (_pool, repo, auth) = setup().await;

        let created = repo.create(&new_patient("Ramesh", "9876543210"), &auth).await.unwrap();
        repo.deactivate(created.id, &auth).await.unwrap();
        assert!(repo.find_by_id(created.id).await.is_err());

        let restored = repo.reactivate(created.id, &auth).await.unwrap();
        assert!(restored.is_active);
        assert!(repo.find_by_id(created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_by_patient_id_not_found() {
        let (_pool, repo, _auth) = setup().await;

        let err = repo.find_by_patient_id("PAT20250001").await.unwrap_err();
        assert!(matches!(err, DomainError::IdentifierNotFound { .. }));
    }

    #[test]
    fn test_search_clause_covers_all_text_fields() {
        let mut builder = QueryBuilder::new("SELECT * FROM patients WHERE 1=1");
        let filter = PatientFilter {
            search: Some("Kumar".to_string()),
            ..Default::default()
        };
        SqlitePatientRepository::apply_filter(&mut builder, &filter);
        let sql = builder.sql();

        for column in ["first_name", "last_name", "patient_id", "mobile", "aadhar_number", "mrn"] {
            assert!(sql.contains(&format!("{} LIKE ", column)), "missing {} in {}", column, sql);
        }
    }
}
