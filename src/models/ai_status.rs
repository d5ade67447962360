use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use crate::models::ids::SubjectId;

/// Stage of the server-side resume analysis for one candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AiStatus {
    Pending,
    Processing,
    Complete,
    Failed,
    Skipped,
    /// Any value the API adds later. Treated as terminal.
    #[serde(other)]
    Unknown,
}

impl AiStatus {
    /// Whether the analysis has stopped moving and polling should end.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AiStatus::Pending | AiStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeniorityLevel {
    Junior,
    Mid,
    Senior,
    Lead,
    Executive,
    #[serde(other)]
    Unknown,
}

/// Last error reported by the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiError {
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub retryable: bool,
}

/// Snapshot of the analysis status for one candidate.
///
/// Each successful fetch replaces the previous snapshot entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysisStatus {
    #[serde(alias = "subjectId")]
    pub candidate_id: Option<SubjectId>,
    pub ai_status: AiStatus,
    #[serde(default)]
    pub ai_retry_count: u32,
    #[serde(rename = "lastAIError", alias = "lastError")]
    pub last_ai_error: Option<AiError>,
    #[serde(default)]
    pub has_analysis: bool,
    #[serde(default)]
    pub extracted_skills: Vec<String>,
    pub seniority_level: Option<SeniorityLevel>,
}

/// Presentation tag derived from the latest status.
#[derive(Debug, Clone, Copy, Serialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusClass {
    Loading,
    Processing,
    Complete,
    Failed,
    Skipped,
    Unknown,
}

pub const RETRY_ANNOTATION: &str = " (will retry automatically)";

/// Human-readable line describing the latest status (or its absence).
pub fn status_message(status: Option<&AiAnalysisStatus>) -> String {
    let Some(status) = status else {
        return "Checking AI status...".to_string();
    };

    match status.ai_status {
        AiStatus::Pending => "Your application is queued for AI analysis...".to_string(),
        AiStatus::Processing => "AI is analyzing your resume...".to_string(),
        AiStatus::Complete => {
            let skills = if status.extracted_skills.is_empty() {
                "None identified".to_string()
            } else {
                status.extracted_skills.join(", ")
            };
            format!("Analysis complete! Skills found: {skills}")
        }
        AiStatus::Failed => {
            let error = status.last_ai_error.as_ref();
            let message = error.map_or("unknown error", |e| e.message.as_str());
            let retry = if error.is_some_and(|e| e.retryable) {
                RETRY_ANNOTATION
            } else {
                ""
            };
            format!("Analysis failed: {message}{retry}")
        }
        AiStatus::Skipped => "AI analysis skipped (no resume provided)".to_string(),
        AiStatus::Unknown => "Unknown status".to_string(),
    }
}

pub fn status_class(status: Option<&AiAnalysisStatus>) -> StatusClass {
    match status.map(|s| s.ai_status) {
        None => StatusClass::Loading,
        Some(AiStatus::Pending | AiStatus::Processing) => StatusClass::Processing,
        Some(AiStatus::Complete) => StatusClass::Complete,
        Some(AiStatus::Failed) => StatusClass::Failed,
        Some(AiStatus::Skipped) => StatusClass::Skipped,
        Some(AiStatus::Unknown) => StatusClass::Unknown,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub complete: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Aggregate counters exposed by the AI workflow admin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiWorkflowStats {
    pub status_counts: StatusCounts,
    #[serde(default)]
    pub retry_counts: BTreeMap<String, u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> AiAnalysisStatus {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_wire_shape() {
        let s = status(
            r#"{
                "candidateId": "507f1f77bcf86cd799439011",
                "aiStatus": "failed",
                "aiRetryCount": 2,
                "lastAIError": {"message": "model timeout", "timestamp": "2026-10-01T12:00:00Z", "retryable": true},
                "hasAnalysis": false,
                "extractedSkills": [],
                "seniorityLevel": "senior"
            }"#,
        );
        assert_eq!(s.ai_status, AiStatus::Failed);
        assert_eq!(s.ai_retry_count, 2);
        assert_eq!(s.seniority_level, Some(SeniorityLevel::Senior));
        assert!(s.last_ai_error.as_ref().unwrap().retryable);
    }

    #[test]
    fn test_unrecognised_status_is_unknown_and_terminal() {
        let s = status(r#"{"aiStatus": "archived"}"#);
        assert_eq!(s.ai_status, AiStatus::Unknown);
        assert!(s.ai_status.is_terminal());
        assert_eq!(status_class(Some(&s)), StatusClass::Unknown);
        assert_eq!(status_message(Some(&s)), "Unknown status");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AiStatus::Pending.is_terminal());
        assert!(!AiStatus::Processing.is_terminal());
        assert!(AiStatus::Complete.is_terminal());
        assert!(AiStatus::Failed.is_terminal());
        assert!(AiStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(status_message(None), "Checking AI status...");
        assert_eq!(status_class(None), StatusClass::Loading);

        let pending = status(r#"{"aiStatus": "pending"}"#);
        assert!(status_message(Some(&pending)).contains("queued"));
        assert_eq!(status_class(Some(&pending)), StatusClass::Processing);

        let complete = status(r#"{"aiStatus": "complete", "extractedSkills": ["Go", "SQL"]}"#);
        assert!(status_message(Some(&complete)).contains("Go, SQL"));

        let bare = status(r#"{"aiStatus": "complete"}"#);
        assert!(status_message(Some(&bare)).contains("None identified"));

        let skipped = status(r#"{"aiStatus": "skipped"}"#);
        assert_eq!(status_class(Some(&skipped)), StatusClass::Skipped);
        assert!(status_message(Some(&skipped)).contains("skipped"));
    }

    #[test]
    fn test_failed_message_annotates_retry() {
        let retryable = status(
            r#"{"aiStatus": "failed", "lastAIError": {"message": "quota", "retryable": true}}"#,
        );
        let message = status_message(Some(&retryable));
        assert!(message.contains("quota"));
        assert!(message.ends_with(RETRY_ANNOTATION));

        let fatal = status(
            r#"{"aiStatus": "failed", "lastAIError": {"message": "corrupt file", "retryable": false}}"#,
        );
        assert!(!status_message(Some(&fatal)).contains("retry"));
    }

    #[test]
    fn test_class_display() {
        assert_eq!(StatusClass::Loading.to_string(), "loading");
        assert_eq!(AiStatus::Processing.to_string(), "processing");
    }
}
