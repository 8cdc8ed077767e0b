pub mod repository;
pub mod service;
pub mod types;

pub use repository::{SqliteTreatmentRepository, TreatmentRepository};
pub use service::{TreatmentService, TreatmentServiceImpl};
pub use types::{
    NewPatientTreatment, PatientTreatment, PatientTreatmentResponse, TreatmentFilter,
    UpdatePatientTreatment,
};
