pub mod file_metadata;
pub mod health_check;
