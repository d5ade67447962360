use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::ids::JobId;
use crate::services::validation::ValidationError;

/// Publication state of a posting.
#[derive(Debug, Clone, Serialize, Deserialize, EnumString, Display, PartialEq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostingStatus {
    Open,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

/// A job posting as returned by the hiring API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub department: Option<Department>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub short_description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub salary_range: Option<SalaryRange>,
    pub hiring_manager: Option<String>,
    pub status: Option<PostingStatus>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Paging parameters for the postings listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub page: u32,
    pub page_size: u32,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// Either a posting already in hand or a raw id typed by a caller.
///
/// Callers resolve this to a [`JobId`] before handing work to the
/// submission orchestrator.
#[derive(Debug, Clone)]
pub enum JobRef {
    Id(String),
    Posting(JobPosting),
}

impl JobRef {
    pub fn job_id(&self) -> Result<JobId, ValidationError> {
        match self {
            JobRef::Id(raw) => JobId::parse(raw),
            JobRef::Posting(posting) => JobId::parse(&posting.id),
        }
    }
}

impl From<JobPosting> for JobRef {
    fn from(posting: JobPosting) -> Self {
        JobRef::Posting(posting)
    }
}

impl From<&str> for JobRef {
    fn from(raw: &str) -> Self {
        JobRef::Id(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_accepts_mongo_and_plain_ids() {
        let mongo: JobPosting = serde_json::from_str(
            r#"{"_id":"507f1f77bcf86cd799439011","title":"Backend Engineer","status":"open"}"#,
        )
        .unwrap();
        assert_eq!(mongo.id, "507f1f77bcf86cd799439011");
        assert_eq!(mongo.status, Some(PostingStatus::Open));
        assert!(mongo.requirements.is_empty());

        let plain: JobPosting =
            serde_json::from_str(r#"{"id":"507f1f77bcf86cd799439012","title":"SRE"}"#).unwrap();
        assert_eq!(plain.id, "507f1f77bcf86cd799439012");
    }

    #[test]
    fn test_job_ref_resolves_to_validated_id() {
        let posting: JobPosting = serde_json::from_str(
            r#"{"_id":"507f1f77bcf86cd799439011","title":"Backend Engineer"}"#,
        )
        .unwrap();
        assert_eq!(
            JobRef::from(posting).job_id().unwrap().as_str(),
            "507f1f77bcf86cd799439011"
        );
        assert!(JobRef::from("abc").job_id().is_err());
    }
}
