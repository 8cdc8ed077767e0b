pub mod repository;
pub mod service;
pub mod types;

pub use repository::{FollowUpRepository, SqliteFollowUpRepository};
pub use service::{FollowUpService, FollowUpServiceImpl};
pub use types::{
    FollowUpFilter, FollowUpRecord, FollowUpRecordResponse, NewFollowUpRecord, UpdateFollowUpRecord,
};
