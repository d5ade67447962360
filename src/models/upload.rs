use serde::Serialize;
use std::path::Path;
use strum::Display;

/// A resume selected for upload, held in memory.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A progress event from the transport: bytes sent so far and the total,
/// when the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl TransferProgress {
    /// Rounded percentage, or `None` when the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let pct = (self.loaded as f64 * 100.0 / total as f64).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Done,
    Failed,
}

/// Observable state of one upload.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UploadState {
    pub phase: UploadPhase,
    pub progress_percent: u8,
    pub resource_key: Option<String>,
    pub error: Option<String>,
}

impl UploadState {
    /// Fold a progress event in. Progress never moves backwards.
    pub fn record_progress(&mut self, progress: TransferProgress) -> bool {
        match progress.percent() {
            Some(pct) if pct > self.progress_percent => {
                self.progress_percent = pct;
                true
            }
            _ => false,
        }
    }
}
