use crate::auth::AuthContext;
use crate::errors::DomainResult;
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

/// Trait for finding entities by ID
#[async_trait]
pub trait FindById<T> {
    /// Find an active entity by its row ID
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}

/// Trait for entities with an Active/Inactive lifecycle.
///
/// Records are never physically removed; deactivation flips `is_active`
/// and stamps the deactivation audit columns.
#[async_trait]
pub trait Deactivate {
    /// Deactivate an entity by ID (standalone)
    async fn deactivate(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()>;

    /// Deactivate an entity by ID within a transaction
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()>;
}
