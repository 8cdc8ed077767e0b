pub mod repository;
pub mod service;
pub mod types;

pub use repository::{PatientRepository, SqlitePatientRepository};
pub use service::{PatientService, PatientServiceImpl};
pub use types::{
    NewPatient, Patient, PatientFilter, PatientResponse, PatientRow, PatientSortField,
    UpdatePatient,
};
