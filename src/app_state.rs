use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    notify::NotificationSink,
    orchestrator::{SubmissionOrchestrator, SubmissionSettings},
    transport::HiringTransport,
};

/// Shared client state handed to every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub transport: Arc<dyn HiringTransport>,
    pub notifier: Arc<dyn NotificationSink>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn HiringTransport>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            notifier,
        }
    }

    /// A fresh orchestrator for one apply flow.
    pub fn orchestrator(&self) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.notifier),
            SubmissionSettings::from_config(&self.config),
        )
    }
}
