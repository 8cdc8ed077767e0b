pub mod repository;
pub mod service;
pub mod types;

pub use repository::{SqliteTransplantEvaluationRepository, TransplantEvaluationRepository};
pub use service::{TransplantEvaluationService, TransplantEvaluationServiceImpl};
pub use types::{
    EvaluationFilter, LiverTransplantEvaluation, LiverTransplantEvaluationResponse,
    NewLiverTransplantEvaluation, UpdateLiverTransplantEvaluation,
};
