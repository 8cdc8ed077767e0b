pub mod camp;
pub mod core;
pub mod document;
pub mod followup;
pub mod patient;
pub mod surgery;
pub mod transplant;
pub mod treatment;
