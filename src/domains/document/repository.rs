use crate::auth::AuthContext;
use crate::domains::core::repository::{Deactivate, FindById};
use crate::domains::document::types::{
    DocumentFilter, NewPatientDocument, PatientDocument, PatientDocumentRow,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

/// Trait defining document repository operations
#[async_trait]
pub trait DocumentRepository: FindById<PatientDocument> + Deactivate + Send + Sync {
    async fn create(
        &self,
        new_document: &NewPatientDocument,
        auth: &AuthContext,
    ) -> DomainResult<PatientDocument>;

    async fn find(
        &self,
        filter: &DocumentFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PatientDocument>>;
}

/// SQLite implementation for DocumentRepository
#[derive(Debug, Clone)]
pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn apply_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &DocumentFilter) {
        if !filter.include_inactive {
            builder.push(" AND is_active = 1");
        }

        if let Some(patient_id) = &filter.patient_id {
            builder.push(" AND patient_id = ");
            builder.push_bind(patient_id.to_string());
        }
    }
}

#[async_trait]
impl FindById<PatientDocument> for SqliteDocumentRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<PatientDocument> {
        let row = query_as::<_, PatientDocumentRow>(
            "SELECT * FROM patient_documents WHERE id = ? AND is_active = 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("PatientDocument".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl Deactivate for SqliteDocumentRepository {
    async fn deactivate_with_tx(
        &self,
        id: Uuid,
        auth: &AuthContext,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> DomainResult<()> {
        let now = Utc::now().to_rfc3339();
        let user_id = auth.user_id.to_string();

        let result = query(
            "UPDATE patient_documents
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
            Err(DomainError::EntityNotFound("PatientDocument".to_string(), id))
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
impl DocumentRepository for SqliteDocumentRepository {
    async fn create(
        &self,
        new_document: &NewPatientDocument,
        auth: &AuthContext,
    ) -> DomainResult<PatientDocument> {
        let id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();
        let user_id_str = auth.user_id.to_string();

        query(
            r#"
            INSERT INTO patient_documents (
                id, patient_id, file_name, title, mime_type, size_bytes, storage_key,
                is_active, created_at, updated_at,
                created_by_user_id, updated_by_user_id, deactivated_at, deactivated_by_user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(id.to_string())
        .bind(new_document.patient_id.to_string())
        .bind(&new_document.file_name)
        .bind(&new_document.title)
        .bind(&new_document.mime_type)
        .bind(new_document.size_bytes)
        .bind(&new_document.storage_key)
        .bind(&now_str)
        .bind(&now_str)
        .bind(&user_id_str)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<PatientDocument>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM patient_documents WHERE 1=1");
        Self::apply_filter(&mut count_builder, filter);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::new("SELECT * FROM patient_documents WHERE 1=1");
        Self::apply_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ");
        builder.push_bind(params.limit() as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows: Vec<PatientDocumentRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let entities = rows
            .into_iter()
            .map(PatientDocumentRow::into_entity)
            .collect::<DomainResult<Vec<PatientDocument>>>()?;

        Ok(PaginatedResult::new(entities, total as u64, params))
    }
}
