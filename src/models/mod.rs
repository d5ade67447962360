pub mod ai_status;
pub mod application;
pub mod ids;
pub mod job;
pub mod upload;
