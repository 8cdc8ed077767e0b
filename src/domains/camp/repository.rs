use crate::auth::AuthContext;
use crate::domains::camp::types::{
    total_amount, Camp, CampFilter, CampRegistration, CampRegistrationRow, CampRow, NewCamp,
    NewCampRegistration, PaymentStatus, RegistrationFilter, UpdateCamp, UpdateCampRegistration,
    SERVICE_ENDOSCOPY, SERVICE_HEALTH_CHECKUP, SERVICE_SIBO_TEST,
};
use crate::domains::core::ids;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, query_scalar, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining camp repository operations
#[async_trait]
pub trait CampRepository: FindById<Camp> + Deactivate + Send + Sync {
    async fn create(&self, new_camp: &NewCamp, auth: &AuthContext) -> DomainResult<Camp>;

    async fn update(&self, id: Uuid, update_data: &UpdateCamp, auth: &AuthContext)
        -> DomainResult<Camp>;

    async fn find(
        &self,
        filter: &CampFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Camp>>;
}

/// Trait defining camp registration repository operations
#[async_trait]
pub trait CampRegistrationRepository: FindById<CampRegistration> + Deactivate + Send + Sync {
    /// Register a participant into a camp. Claims a capacity slot and the
    /// next per-camp sequence number atomically with the insert.
    async fn create(
        &self,
        new_registration: &NewCampRegistration,
        auth: &AuthContext,
    ) -> DomainResult<CampRegistration>;
    async fn create_with_tx<'t>(
        &self,
        new_registration: &NewCampRegistration,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<CampRegistration>;

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateCampRegistration,
        auth: &AuthContext,
    ) -> DomainResult<CampRegistration>;

    /// Look up by the human-readable `CAMP...` identifier
    async fn find_by_registration_id(&self, registration_id: &str)
        -> DomainResult<CampRegistration>;

    async fn find(
        &self,
        filter: &RegistrationFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<CampRegistration>>;
}

/// SQLite implementation for CampRepository
#[derive(Debug, Clone)]
pub struct SqliteCampRepository {
    pool: SqlitePool,
}

impl SqliteCampRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CampFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(search) = &filter.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (name LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR location LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR organizer LIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }

        if let Some((start, end)) = &filter.date_range {
            builder.push(" AND camp_date BETWEEN ");
            builder.push_bind(start.clone());
            builder.push(" AND ");
            builder.push_bind(end.clone());
        }
    }
}

#[async_trait]
impl FindById<Camp> for SqliteCampRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Camp> {
        let row = query_as::<_, CampRow>("SELECT * FROM camps WHERE id = ? AND is_active = 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Camp".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteCampRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE camps
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
            Err(DomainError::EntityNotFound("Camp".to_string(), id))
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
impl CampRepository for SqliteCampRepository {
    async fn create(&self, new_camp: &NewCamp, auth: &AuthContext) -> DomainResult<Camp> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO camps (
                id, name, location, camp_date, organizer, max_capacity,
                current_registrations, is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, 0, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(&new_camp.name)
        .bind(&new_camp.location)
        .bind(new_camp.camp_date.format("%Y-%m-%d").to_string())
        .bind(&new_camp.organizer)
        .bind(new_camp.max_capacity)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateCamp,
        auth: &AuthContext,
    ) -> DomainResult<Camp> {
        let current = self.find_by_id(id).await?;

        // Capacity may never drop below the slots already handed out
        if let Some(new_capacity) = update_data.max_capacity {
            if new_capacity < current.current_registrations {
                return Err(DomainError::Validation(ValidationError::invalid_value(
                    "max_capacity",
                    &format!(
                        "cannot be below the current registration count ({})",
                        current.current_registrations
                    ),
                )));
            }
        }

        let has_changes = update_data.name.is_some()
            || update_data.location.is_some()
            || update_data.camp_date.is_some()
            || update_data.organizer.is_some()
            || update_data.max_capacity.is_some();

        if !has_changes {
            return Ok(current);
        }

        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        let mut builder = QueryBuilder::new("UPDATE camps SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = &update_data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }
        if let Some(location) = &update_data.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location.clone());
        }
        if let Some(camp_date) = update_data.camp_date {
            separated.push("camp_date = ");
            separated.push_bind_unseparated(camp_date.format("%Y-%m-%d").to_string());
        }
        if let Some(organizer) = &update_data.organizer {
            separated.push("organizer = ");
            separated.push_bind_unseparated(organizer.clone());
        }
        if let Some(capacity) = update_data.max_capacity {
            separated.push("max_capacity = ");
            separated.push_bind_unseparated(capacity);
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
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Camp".to_string(), id));
        }

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &CampFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<Camp>> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM camps WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM camps WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY camp_date DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<CampRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(CampRow::into_entity)
            .collect::<DomainResult<Vec<Camp>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}

/// SQLite implementation for CampRegistrationRepository
#[derive(Debug, Clone)]
pub struct SqliteCampRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteCampRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_by_id_with_tx<'t>(
        &self,
        id: Uuid,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<CampRegistration> {
        let row = query_as::<_, CampRegistrationRow>(
            "SELECT * FROM camp_registrations WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("CampRegistration".to_string(), id))?;

        row.into_entity()
    }

    /// Deduplicate the submitted service names, keeping first occurrence order
    fn normalize_services(services: &[String]) -> Vec<String> {
        let mut unique = Vec::new();
        for service in services {
            if !unique.contains(service) {
                unique.push(service.clone());
            }
        }
        unique
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &RegistrationFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(camp_id) = &filter.camp_id {
            builder.push(" AND camp_id = ");
            builder.push_bind(camp_id.to_string());
        }

        if let Some(priority) = &filter.priority_level {
            builder.push(" AND priority_level = ");
            builder.push_bind(priority.as_str());
        }

        if let Some(payment_status) = &filter.payment_status {
            builder.push(" AND payment_status = ");
            builder.push_bind(payment_status.as_str());
        }

        if let Some(search) = &filter.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                builder.push(" AND (name LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR mobile LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR registration_id LIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        }
    }
}

#[async_trait]
impl FindById<CampRegistration> for SqliteCampRegistrationRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<CampRegistration> {
        let row = query_as::<_, CampRegistrationRow>(
            "SELECT * FROM camp_registrations WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("CampRegistration".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteCampRegistrationRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        // The camp counter is left untouched: it doubles as the sequence
        // source, and sequence numbers are never reused.
        let result = query(
            "UPDATE camp_registrations
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
            Err(DomainError::EntityNotFound("CampRegistration".to_string(), id))
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
impl CampRegistrationRepository for SqliteCampRegistrationRepository {
    async fn create(
        &self,
        new_registration: &NewCampRegistration,
        auth: &AuthContext,
    ) -> DomainResult<CampRegistration> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        match self.create_with_tx(new_registration, auth, &mut tx).await {
            Ok(registration) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(registration)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn create_with_tx<'t>(
        &self,
        new_registration: &NewCampRegistration,
        auth: &AuthContext,
        tx: &mut Transaction<'t, Sqlite>,
    ) -> DomainResult<CampRegistration> {
        let camp_id = new_registration.camp_id;
        let now_str = Utc::now().to_rfc3339();

        let camp = query_as::<_, CampRow>("SELECT * FROM camps WHERE id = ? AND is_active = 1")
            .bind(camp_id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Camp".to_string(), camp_id))?
            .into_entity()?;

        // Claim a capacity slot. The WHERE clause re-checks capacity at
        // write time, so two concurrent registrations can never both take
        // the last slot.
        let claimed = query(
            "UPDATE camps
             SET current_registrations = current_registrations + 1, updated_at = ?
             WHERE id = ? AND is_active = 1 AND current_registrations < max_capacity",
        )
        .bind(&now_str)
        .bind(camp_id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        if claimed.rows_affected() == 0 {
            return Err(DomainError::CampFull {
                camp_id,
                max_capacity: camp.max_capacity,
            });
        }

        // The post-increment counter is this registration's sequence number
        let seq: i64 = query_scalar("SELECT current_registrations FROM camps WHERE id = ?")
            .bind(camp_id.to_string())
            .fetch_one(&mut **tx)
            .await
            .map_err(DbError::from)?;

        let registration_id = ids::format_registration_id(camp.camp_date, seq);

        let services = Self::normalize_services(&new_registration.selected_services);
        let amount = total_amount(&services);
        let endoscopy = services.iter().any(|s| s == SERVICE_ENDOSCOPY);
        let sibo = services.iter().any(|s| s == SERVICE_SIBO_TEST);
        let checkup = services.iter().any(|s| s == SERVICE_HEALTH_CHECKUP);
        let priority = new_registration.symptoms.priority_level();
        let payment_status = new_registration.payment_status.unwrap_or(PaymentStatus::Pending);

        let services_json = serde_json::to_string(&services)
            .map_err(|e| DomainError::Internal(format!("failed to encode services: {}", e)))?;

        let id = Uuid::new_v4();
        let user_id_str = auth.user_id.to_string();
        let symptoms = &new_registration.symptoms;

        query(
            r#"
            INSERT INTO camp_registrations (
                id, registration_id, camp_id, name, age, sex, mobile, email, address,
                selected_services, total_amount,
                endoscopy_selected, sibo_test_selected, health_checkup_selected,
                unexplained_weight_loss, jaundice_yellow_eyes, difficulty_swallowing,
                abdominal_pain, nausea_vomiting, bowel_habits_change,
                priority_level, payment_status,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(&registration_id)
        .bind(camp_id.to_string())
        .bind(&new_registration.name)
        .bind(new_registration.age)
        .bind(&new_registration.sex)
        .bind(&new_registration.mobile)
        .bind(&new_registration.email)
        .bind(&new_registration.address)
        .bind(&services_json)
        .bind(amount)
        .bind(endoscopy as i64)
        .bind(sibo as i64)
        .bind(checkup as i64)
        .bind(symptoms.unexplained_weight_loss as i64)
        .bind(symptoms.jaundice_yellow_eyes as i64)
        .bind(symptoms.difficulty_swallowing as i64)
        .bind(symptoms.abdominal_pain as i64)
        .bind(symptoms.nausea_vomiting as i64)
        .bind(symptoms.bowel_habits_change as i64)
        .bind(priority.as_str())
        .bind(payment_status.as_str())
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

        self.find_by_id_with_tx(id, tx).await
    }

    async fn update(
        &self,
        id: Uuid,
        update_data: &UpdateCampRegistration,
        auth: &AuthContext,
    ) -> DomainResult<CampRegistration> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let result = async {
            let _current = self.find_by_id_with_tx(id, &mut tx).await?;

            let has_changes = update_data.name.is_some()
                || update_data.age.is_some()
                || update_data.sex.is_some()
                || update_data.mobile.is_some()
                || update_data.email.is_some()
                || update_data.address.is_some()
                || update_data.selected_services.is_some()
                || update_data.symptoms.is_some()
                || update_data.payment_status.is_some();

            if !has_changes {
                return Ok(_current);
            }

            let now_str = Utc::now().to_rfc3339();
            let user_id_str = auth.user_id.to_string();

            let mut builder = QueryBuilder::new("UPDATE camp_registrations SET ");
            let mut separated = builder.separated(", ");

            if let Some(name) = &update_data.name {
                separated.push("name = ");
                separated.push_bind_unseparated(name.clone());
            }
            if let Some(age) = update_data.age {
                separated.push("age = ");
                separated.push_bind_unseparated(age);
            }
            if let Some(sex) = &update_data.sex {
                separated.push("sex = ");
                separated.push_bind_unseparated(sex.clone());
            }
            if let Some(mobile) = &update_data.mobile {
                separated.push("mobile = ");
                separated.push_bind_unseparated(mobile.clone());
            }
            if let Some(email) = &update_data.email {
                separated.push("email = ");
                separated.push_bind_unseparated(email.clone());
            }
            if let Some(address) = &update_data.address {
                separated.push("address = ");
                separated.push_bind_unseparated(address.clone());
            }

            // A new service selection re-derives the amount and flags
            if let Some(selected) = &update_data.selected_services {
                let services = Self::normalize_services(selected);
                let services_json = serde_json::to_string(&services).map_err(|e| {
                    DomainError::Internal(format!("failed to encode services: {}", e))
                })?;

                separated.push("selected_services = ");
                separated.push_bind_unseparated(services_json);
                separated.push("total_amount = ");
                separated.push_bind_unseparated(total_amount(&services));
                separated.push("endoscopy_selected = ");
                separated.push_bind_unseparated(services.iter().any(|s| s == SERVICE_ENDOSCOPY) as i64);
                separated.push("sibo_test_selected = ");
                separated.push_bind_unseparated(services.iter().any(|s| s == SERVICE_SIBO_TEST) as i64);
                separated.push("health_checkup_selected = ");
                separated.push_bind_unseparated(services.iter().any(|s| s == SERVICE_HEALTH_CHECKUP) as i64);
            }

            // A new checklist re-derives the priority tier
            if let Some(symptoms) = &update_data.symptoms {
                separated.push("unexplained_weight_loss = ");
                separated.push_bind_unseparated(symptoms.unexplained_weight_loss as i64);
                separated.push("jaundice_yellow_eyes = ");
                separated.push_bind_unseparated(symptoms.jaundice_yellow_eyes as i64);
                separated.push("difficulty_swallowing = ");
                separated.push_bind_unseparated(symptoms.difficulty_swallowing as i64);
                separated.push("abdominal_pain = ");
                separated.push_bind_unseparated(symptoms.abdominal_pain as i64);
                separated.push("nausea_vomiting = ");
                separated.push_bind_unseparated(symptoms.nausea_vomiting as i64);
                separated.push("bowel_habits_change = ");
                separated.push_bind_unseparated(symptoms.bowel_habits_change as i64);
                separated.push("priority_level = ");
                separated.push_bind_unseparated(symptoms.priority_level().as_str());
            }

            if let Some(payment_status) = update_data.payment_status {
                separated.push("payment_status = ");
                separated.push_bind_unseparated(payment_status.as_str());
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
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                return Err(DomainError::EntityNotFound("CampRegistration".to_string(), id));
            }

            self.find_by_id_with_tx(id, &mut tx).await
        }
        .await;

        match result {
            Ok(registration) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(registration)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn find_by_registration_id(
        &self,
        registration_id: &str,
    ) -> DomainResult<CampRegistration> {
        let row = query_as::<_, CampRegistrationRow>(
            "SELECT * FROM camp_registrations WHERE registration_id = ? AND is_active = 1",
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::IdentifierNotFound {
            entity_type: "CampRegistration".to_string(),
            identifier: registration_id.to_string(),
        })?;

        row.into_entity()
    }

    async fn find(
        &self,
        filter: &RegistrationFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<CampRegistration>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM camp_registrations WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM camp_registrations WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<CampRegistrationRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(CampRegistrationRow::into_entity)
            .collect::<DomainResult<Vec<CampRegistration>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domains::camp::types::{PaymentStatus, PriorityLevel, SymptomChecklist};
    use crate::types::UserRole;
    use chrono::NaiveDate;

    async fn setup() -> (
        SqlitePool,
        SqliteCampRepository,
        SqliteCampRegistrationRepository,
        AuthContext,
    ) {
        let pool = db::init_db("sqlite::memory:").await.unwrap();
        let camps = SqliteCampRepository::new(pool.clone());
        let registrations = SqliteCampRegistrationRepository::new(pool.clone());
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Admin);
        (pool, camps, registrations, auth)
    }

    fn new_camp(max_capacity: i64) -> NewCamp {
        NewCamp {
            name: "Gastro Screening Camp".to_string(),
            location: Some("Warangal".to_string()),
            camp_date: NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
            organizer: None,
            max_capacity,
        }
    }

    fn new_registration(camp_id: Uuid, mobile: &str) -> NewCampRegistration {
        NewCampRegistration {
            camp_id,
            name: "Sita Devi".to_string(),
            age: Some(45),
            sex: Some("female".to_string()),
            mobile: mobile.to_string(),
            email: None,
            address: None,
            selected_services: vec![
                "Endoscopy".to_string(),
                "Complete Health Checkup".to_string(),
            ],
            symptoms: SymptomChecklist {
                unexplained_weight_loss: true,
                abdominal_pain: true,
                ..Default::default()
            },
            payment_status: None,
        }
    }

    #[tokio::test]
    async fn test_registration_derives_id_amount_flags_priority() {
        let (_pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();

        let reg = registrations
            .create(&new_registration(camp.id, "9876543210"), &auth)
            .await
            .unwrap();

        assert_eq!(reg.registration_id, "CAMP202508170001");
        assert_eq!(reg.total_amount, 999 + 599);
        assert!(reg.endoscopy_selected);
        assert!(!reg.sibo_test_selected);
        assert!(reg.health_checkup_selected);
        assert_eq!(reg.priority_level, PriorityLevel::High);
        assert_eq!(reg.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_registration_sequence_is_per_camp() {
        let (_pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();

        for i in 0..3 {
            registrations
                .create(&new_registration(camp.id, &format!("987654321{}", i)), &auth)
                .await
                .unwrap();
        }

        let fourth = registrations
            .create(&new_registration(camp.id, "9876543213"), &auth)
            .await
            .unwrap();
        assert_eq!(fourth.registration_id, "CAMP202508170004");

        // A different camp starts its own series
        let mut other = new_camp(50);
        other.camp_date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let other = camps.create(&other, &auth).await.unwrap();
        let first = registrations
            .create(&new_registration(other.id, "9876543214"), &auth)
            .await
            .unwrap();
        assert_eq!(first.registration_id, "CAMP202509010001");
    }

    #[tokio::test]
    async fn test_counter_matches_registration_count() {
        let (pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();

        for i in 0..5 {
            registrations
                .create(&new_registration(camp.id, &format!("987654321{}", i)), &auth)
                .await
                .unwrap();
        }

        let counter: i64 =
            query_scalar("SELECT current_registrations FROM camps WHERE id = ?")
                .bind(camp.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        let count: i64 =
            query_scalar("SELECT COUNT(*) FROM camp_registrations WHERE camp_id = ?")
                .bind(camp.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();

        assert_eq!(counter, 5);
        assert_eq!(counter, count);
    }

    #[tokio::test]
    async fn test_full_camp_rejects_registration() {
        let (pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(1), &auth).await.unwrap();

        registrations
            .create(&new_registration(camp.id, "9876543210"), &auth)
            .await
            .unwrap();

        let err = registrations
            .create(&new_registration(camp.id, "9876543211"), &auth)
            .await
            .unwrap_err();

        match err {
            DomainError::CampFull { camp_id, max_capacity } => {
                assert_eq!(camp_id, camp.id);
                assert_eq!(max_capacity, 1);
            }
            other => panic!("expected CampFull, got {:?}", other),
        }

        // No row, no counter movement
        let counter: i64 =
            query_scalar("SELECT current_registrations FROM camps WHERE id = ?")
                .bind(camp.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        let count: i64 =
            query_scalar("SELECT COUNT(*) FROM camp_registrations WHERE camp_id = ?")
                .bind(camp.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(counter, 1);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unknown_camp_is_not_found() {
        let (_pool, _camps, registrations, auth) = setup().await;

        let err = registrations
            .create(&new_registration(Uuid::new_v4(), "9876543210"), &auth)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(ref entity, _) if entity == "Camp"));
    }

    #[tokio::test]
    async fn test_update_rederives_amount_and_priority() {
        let (_pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();
        let reg = registrations
            .create(&new_registration(camp.id, "9876543210"), &auth)
            .await
            .unwrap();

        let update = UpdateCampRegistration {
            selected_services: Some(vec!["SIBO Test".to_string()]),
            symptoms: Some(SymptomChecklist {
                nausea_vomiting: true,
                ..Default::default()
            }),
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        let updated = registrations.update(reg.id, &update, &auth).await.unwrap();

        assert_eq!(updated.total_amount, 499);
        assert!(!updated.endoscopy_selected);
        assert!(updated.sibo_test_selected);
        assert_eq!(updated.priority_level, PriorityLevel::Normal);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        // Identifier never changes
        assert_eq!(updated.registration_id, reg.registration_id);
    }

    #[tokio::test]
    async fn test_deactivated_registration_keeps_slot_and_sequence() {
        let (pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();

        let first = registrations
            .create(&new_registration(camp.id, "9876543210"), &auth)
            .await
            .unwrap();
        registrations.deactivate(first.id, &auth).await.unwrap();

        let second = registrations
            .create(&new_registration(camp.id, "9876543211"), &auth)
            .await
            .unwrap();
        assert_eq!(second.registration_id, "CAMP202508170002");

        let counter: i64 =
            query_scalar("SELECT current_registrations FROM camps WHERE id = ?")
                .bind(camp.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(counter, 2);
    }

    #[tokio::test]
    async fn test_filters_by_priority_and_camp() {
        let (_pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(50), &auth).await.unwrap();

        registrations
            .create(&new_registration(camp.id, "9876543210"), &auth)
            .await
            .unwrap();
        let mut low = new_registration(camp.id, "9876543211");
        low.symptoms = SymptomChecklist::default();
        low.name = "Mohan Rao".to_string();
        registrations.create(&low, &auth).await.unwrap();

        let filter = RegistrationFilter {
            camp_id: Some(camp.id),
            priority_level: Some(PriorityLevel::High),
            ..Default::default()
        };
        let result = registrations
            .find(&filter, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "Sita Devi");

        let filter = RegistrationFilter {
            search: Some("mohan".to_string()),
            ..Default::default()
        };
        let result = registrations
            .find(&filter, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].priority_level, PriorityLevel::Low);
    }

    #[tokio::test]
    async fn test_camp_capacity_cannot_shrink_below_registrations() {
        let (_pool, camps, registrations, auth) = setup().await;
        let camp = camps.create(&new_camp(10), &auth).await.unwrap();

        for i in 0..3 {
            registrations
                .create(&new_registration(camp.id, &format!("987654321{}", i)), &auth)
                .await
                .unwrap();
        }

        let update = UpdateCamp {
            max_capacity: Some(2),
            ..Default::default()
        };
        let err = camps.update(camp.id, &update, &auth).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let update = UpdateCamp {
            max_capacity: Some(5),
            ..Default::default()
        };
        let updated = camps.update(camp.id, &update, &auth).await.unwrap();
        assert_eq!(updated.max_capacity, 5);
    }
}
