//! Local input checks. Nothing in here touches the network; a failure is
//! reported back to the form and never as a notification.

use garde::Validate;
use serde::Serialize;

use crate::models::application::ApplicationForm;
use crate::models::upload::ResumeFile;

/// Length of a backing-store record id, in hex characters.
const RECORD_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid record id: {0:?} (expected 24 hexadecimal characters)")]
    InvalidId(String),

    #[error("Form has {} invalid field(s)", fields.len())]
    InvalidForm { fields: Vec<FieldError> },

    #[error("File type {content_type:?} is not allowed")]
    InvalidFileType { content_type: String },

    #[error("File is {size} bytes, the limit is {max} bytes")]
    FileTooLarge { size: u64, max: u64 },
}

/// One failed form rule, keyed by field path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Whether `id` has the shape of a backing-store record id.
pub fn is_record_id(id: &str) -> bool {
    id.len() == RECORD_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Run the declarative form rules and flatten the report into field errors.
pub fn validate_form(form: &ApplicationForm) -> Result<(), ValidationError> {
    match form.validate() {
        Ok(()) => Ok(()),
        Err(report) => {
            let fields = report
                .iter()
                .map(|(path, error)| FieldError {
                    field: path.to_string(),
                    message: error.to_string(),
                })
                .collect();
            Err(ValidationError::InvalidForm { fields })
        }
    }
}

/// Content type and size limits for resume uploads.
#[derive(Debug, Clone)]
pub struct FilePolicy {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
}

impl FilePolicy {
    pub fn check(&self, file: &ResumeFile) -> Result<(), ValidationError> {
        let allowed = self
            .allowed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&file.content_type));
        if !allowed {
            return Err(ValidationError::InvalidFileType {
                content_type: file.content_type.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}
