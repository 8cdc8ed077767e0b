// Core record service for the hospital patient-management system.
// Owns the entities, derived-field rules, identifier generation and
// list-query building; the HTTP layer and blob storage live elsewhere.

pub mod auth;
pub mod db;
pub mod domains;
pub mod errors;
pub mod types;
pub mod validation;

use sqlx::SqlitePool;
use std::sync::Arc;

use domains::camp::{CampServiceImpl, SqliteCampRegistrationRepository, SqliteCampRepository};
use domains::document::{DocumentServiceImpl, SqliteDocumentRepository};
use domains::followup::{FollowUpServiceImpl, SqliteFollowUpRepository};
use domains::patient::{PatientServiceImpl, SqlitePatientRepository};
use domains::surgery::{SqliteSurgeryRepository, SurgeryServiceImpl};
use domains::transplant::{SqliteTransplantEvaluationRepository, TransplantEvaluationServiceImpl};
use domains::treatment::{SqliteTreatmentRepository, TreatmentServiceImpl};

/// Open (or create) the database at `database_url` and bring the schema
/// up to date. Call once at startup and hand the pool to `Services::new`.
pub async fn initialize(database_url: &str) -> errors::DbResult<SqlitePool> {
    db::init_db(database_url).await
}

/// Initialize the logging facade from `RUST_LOG`. Safe to call more
/// than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// The fully wired service layer. Everything is constructed from an
/// explicit pool; there is no global client.
#[derive(Clone)]
pub struct Services {
    pub patients: PatientServiceImpl,
    pub camps: CampServiceImpl,
    pub follow_ups: FollowUpServiceImpl,
    pub surgeries: SurgeryServiceImpl,
    pub treatments: TreatmentServiceImpl,
    pub transplant_evaluations: TransplantEvaluationServiceImpl,
    pub documents: DocumentServiceImpl,
}

impl Services {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            patients: PatientServiceImpl::new(Arc::new(SqlitePatientRepository::new(pool.clone()))),
            camps: CampServiceImpl::new(
                Arc::new(SqliteCampRepository::new(pool.clone())),
                Arc::new(SqliteCampRegistrationRepository::new(pool.clone())),
            ),
            follow_ups: FollowUpServiceImpl::new(
                pool.clone(),
                Arc::new(SqliteFollowUpRepository::new(pool.clone())),
            ),
            surgeries: SurgeryServiceImpl::new(
                pool.clone(),
                Arc::new(SqliteSurgeryRepository::new(pool.clone())),
            ),
            treatments: TreatmentServiceImpl::new(
                pool.clone(),
                Arc::new(SqliteTreatmentRepository::new(pool.clone())),
            ),
            transplant_evaluations: TransplantEvaluationServiceImpl::new(
                pool.clone(),
                Arc::new(SqliteTransplantEvaluationRepository::new(pool.clone())),
            ),
            documents: DocumentServiceImpl::new(
                pool.clone(),
                Arc::new(SqliteDocumentRepository::new(pool)),
            ),
        }
    }
}
