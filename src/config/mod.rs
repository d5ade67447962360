use serde::Deserialize;
use std::time::Duration;

use crate::services::validation::FilePolicy;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Response fields that may carry the uploaded file's key, in lookup order.
pub const DEFAULT_RESOURCE_KEY_FIELDS: &[&str] = &["fileKey", "file.fileKey", "data.fileKey", "id"];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the hiring API, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Delay between AI status fetches, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Largest resume accepted for upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Accepted resume content types (comma-separated in the environment).
    #[serde(default = "default_allowed_upload_types")]
    pub allowed_upload_types: Vec<String>,

    /// Dotted response paths tried in order to find the uploaded file key.
    #[serde(default = "default_resource_key_fields")]
    pub resource_key_fields: Vec<String>,

    /// Category tag sent with resume uploads.
    #[serde(default = "default_upload_category")]
    pub upload_category: String,

    /// Per-request timeout for the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_upload_types() -> Vec<String> {
    DEFAULT_ALLOWED_UPLOAD_TYPES.iter().map(|s| s.to_string()).collect()
}

fn default_resource_key_fields() -> Vec<String> {
    DEFAULT_RESOURCE_KEY_FIELDS.iter().map(|s| s.to_string()).collect()
}

fn default_upload_category() -> String {
    "resume".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_upload_types: default_allowed_upload_types(),
            resource_key_fields: default_resource_key_fields(),
            upload_category: default_upload_category(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("POLL_INTERVAL_MS must be greater than zero"));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("MAX_UPLOAD_BYTES must be greater than zero"));
        }
        if self.allowed_upload_types.is_empty() {
            return Err(ConfigError::Invalid("ALLOWED_UPLOAD_TYPES must not be empty"));
        }
        if self.resource_key_fields.is_empty() {
            return Err(ConfigError::Invalid("RESOURCE_KEY_FIELDS must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn file_policy(&self) -> FilePolicy {
        FilePolicy {
            allowed_types: self.allowed_upload_types.clone(),
            max_bytes: self.max_upload_bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
