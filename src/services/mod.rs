pub mod notify;
pub mod orchestrator;
pub mod poller;
pub mod transport;
pub mod upload;
pub mod validation;
