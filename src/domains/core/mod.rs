pub mod ids;
pub mod measures;
pub mod parse;
pub mod repository;

pub use repository::{Deactivate, FindById};
