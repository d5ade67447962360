use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::upload::{ResumeFile, UploadPhase, UploadState};
use crate::services::transport::{self, HiringTransport, ProgressFn, TransportError};
use crate::services::validation::{FilePolicy, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Upload failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub policy: FilePolicy,
    /// Dotted response paths tried in order to find the file key.
    pub resource_key_fields: Vec<String>,
}

/// Drives one resume upload and publishes its progress.
pub struct UploadTracker {
    transport: Arc<dyn HiringTransport>,
    settings: UploadSettings,
    state: Arc<watch::Sender<UploadState>>,
}

impl UploadTracker {
    pub fn new(transport: Arc<dyn HiringTransport>, settings: UploadSettings) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            transport,
            settings,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    /// Validate and upload `file`, returning the stored file's key.
    ///
    /// A rejected file never reaches the transport. The upload is attempted
    /// once; a response without a recognisable key completes with `None`.
    pub async fn run(
        &self,
        file: &ResumeFile,
        category: &str,
    ) -> Result<Option<String>, UploadError> {
        self.settings.policy.check(file)?;

        self.state.send_replace(UploadState {
            phase: UploadPhase::Uploading,
            ..UploadState::default()
        });

        let state = Arc::clone(&self.state);
        let progress: ProgressFn = Arc::new(move |event| {
            state.send_if_modified(|s| s.record_progress(event));
        });

        tracing::info!(
            file_name = %file.file_name,
            content_type = %file.content_type,
            size = file.size(),
            category,
            "Uploading resume"
        );

        match self.transport.upload_file(file, category, progress).await {
            Ok(body) => {
                let key = extract_resource_key(&body, &self.settings.resource_key_fields);
                if key.is_none() {
                    tracing::warn!("Upload response carried no recognisable file key");
                }
                metrics::counter!("application_uploads_total", "outcome" => "done").increment(1);
                self.state.send_modify(|s| {
                    s.phase = UploadPhase::Done;
                    s.progress_percent = 100;
                    s.resource_key = key.clone();
                });
                Ok(key)
            }
            Err(e) => {
                tracing::error!(error = %e, "Resume upload failed");
                metrics::counter!("application_uploads_total", "outcome" => "failed").increment(1);
                self.state.send_modify(|s| {
                    s.phase = UploadPhase::Failed;
                    s.error = Some(e.to_string());
                });
                Err(UploadError::Transport(e))
            }
        }
    }
}

/// Find the file key in an upload response.
///
/// The optional `data` envelope is unwrapped first, then each dotted path is
/// tried in order. The first non-empty string (or number) wins.
pub fn extract_resource_key(body: &Value, fields: &[String]) -> Option<String> {
    let root = transport::unwrap_envelope(body);
    fields.iter().find_map(|path| {
        let value = path
            .split('.')
            .try_fold(root, |node, segment| node.get(segment))?;
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}
