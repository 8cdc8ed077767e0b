pub mod repository;
pub mod service;
pub mod types;

pub use repository::{SqliteSurgeryRepository, SurgeryRepository};
pub use service::{SurgeryService, SurgeryServiceImpl};
pub use types::{
    NewSurgeryDetail, SurgeryDetail, SurgeryDetailResponse, SurgeryFilter, UpdateSurgeryDetail,
};
