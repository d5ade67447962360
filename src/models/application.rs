use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::ids::SubjectId;

/// Raw applicant input, as collected by a form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ApplicationForm {
    #[garde(length(chars, min = 2, max = 100))]
    pub first_name: String,

    #[garde(length(chars, min = 2, max = 100))]
    pub last_name: String,

    #[garde(email)]
    pub email: String,

    #[garde(skip)]
    pub phone: Option<String>,

    #[garde(length(chars, max = 2000))]
    pub cover_letter: Option<String>,
}

impl ApplicationForm {
    /// The form as it will be sent: text fields trimmed, blank optionals
    /// dropped. Validate this, not the raw input.
    pub fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_empty(self.phone),
            cover_letter: non_empty(self.cover_letter),
        }
    }
}

/// Payload posted to the apply endpoint. Built once the form validates.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file_key: Option<String>,
}

impl ApplicationSubmission {
    pub fn new(form: ApplicationForm, resume_file_key: Option<String>) -> Self {
        let form = form.trimmed();
        Self {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            cover_letter: form.cover_letter,
            resume_file_key,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of a successful apply call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub subject_id: Option<SubjectId>,
}
