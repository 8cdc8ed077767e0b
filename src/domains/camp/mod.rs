pub mod repository;
pub mod service;
pub mod types;

pub use repository::{
    CampRegistrationRepository, CampRepository, SqliteCampRegistrationRepository,
    SqliteCampRepository,
};
pub use service::{CampService, CampServiceImpl};
pub use types::{
    total_amount, Camp, CampFilter, CampRegistration, CampRegistrationResponse, CampResponse,
    NewCamp, NewCampRegistration, PaymentStatus, PriorityLevel, RegistrationFilter,
    SymptomChecklist, UpdateCamp, UpdateCampRegistration,
};
