//! Hiring API client.
//!
//! The orchestrator talks to the backend through [`HiringTransport`];
//! [`HttpTransport`] is the `reqwest` implementation used by the binary.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::models::ai_status::{AiAnalysisStatus, AiWorkflowStats};
use crate::models::application::{ApplicationSubmission, SubmissionReceipt};
use crate::models::ids::{JobId, SubjectId};
use crate::models::job::{JobPosting, JobQuery};
use crate::models::upload::{ResumeFile, TransferProgress};

/// Callback receiving upload progress events. Called from the request body
/// stream, so it must be cheap and must not block.
pub type ProgressFn = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Size of the body chunks an upload is streamed in.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait HiringTransport: Send + Sync {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobPosting>, TransportError>;

    async fn get_job(&self, id: &JobId) -> Result<JobPosting, TransportError>;

    async fn apply(
        &self,
        job_id: &JobId,
        submission: &ApplicationSubmission,
    ) -> Result<SubmissionReceipt, TransportError>;

    /// Upload a file and return the raw response body. Progress events are
    /// delivered through `progress` while the body is being sent.
    async fn upload_file(
        &self,
        file: &ResumeFile,
        category: &str,
        progress: ProgressFn,
    ) -> Result<Value, TransportError>;

    /// Current analysis status. `None` when the API has no status payload yet.
    async fn ai_status(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Option<AiAnalysisStatus>, TransportError>;

    async fn ai_stats(&self) -> Result<AiWorkflowStats, TransportError>;

    async fn retry_failed(&self, limit: u32) -> Result<Value, TransportError>;

    async fn queue_candidate(
        &self,
        subject_id: &SubjectId,
        delay_ms: u64,
    ) -> Result<Value, TransportError>;
}

/// `reqwest` implementation of [`HiringTransport`].
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("hiring-apply/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn hiring_url(&self, path: &str) -> String {
        format!("{}/hiring{}", self.base_url, path)
    }

    fn ai_url(&self, path: &str) -> String {
        format!("{}/ai-workflow{}", self.base_url, path)
    }
}

#[async_trait]
impl HiringTransport for HttpTransport {
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobPosting>, TransportError> {
        let response = self
            .http
            .get(self.hiring_url("/postings"))
            .query(query)
            .send()
            .await?;
        let body = read_json(response).await?;
        decode_listing(body)
    }

    async fn get_job(&self, id: &JobId) -> Result<JobPosting, TransportError> {
        let response = self
            .http
            .get(self.hiring_url(&format!("/postings/{id}")))
            .send()
            .await?;
        let body = read_json(response).await?;
        decode_payload(body)
    }

    async fn apply(
        &self,
        job_id: &JobId,
        submission: &ApplicationSubmission,
    ) -> Result<SubmissionReceipt, TransportError> {
        let response = self
            .http
            .post(self.hiring_url(&format!("/postings/{job_id}/apply")))
            .json(submission)
            .send()
            .await?;
        let body = read_json(response).await?;
        Ok(decode_receipt(&body))
    }

    async fn upload_file(
        &self,
        file: &ResumeFile,
        category: &str,
        progress: ProgressFn,
    ) -> Result<Value, TransportError> {
        let total = file.size();
        let chunks: Vec<Vec<u8>> = file
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(TransferProgress {
                loaded: sent,
                total: Some(total),
            });
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("category", category.to_string());

        let response = self
            .http
            .post(format!("{}/files/upload/public", self.base_url))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn ai_status(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Option<AiAnalysisStatus>, TransportError> {
        let response = self
            .http
            .get(self.ai_url(&format!("/candidates/{subject_id}/status")))
            .send()
            .await?;
        let body = read_json(response).await?;
        decode_status(body)
    }

    async fn ai_stats(&self) -> Result<AiWorkflowStats, TransportError> {
        let response = self.http.get(self.ai_url("/stats")).send().await?;
        let body = read_json(response).await?;
        decode_payload(body)
    }

    async fn retry_failed(&self, limit: u32) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(self.ai_url("/retry-failed"))
            .json(&json!({ "limit": limit }))
            .send()
            .await?;
        read_json(response).await
    }

    async fn queue_candidate(
        &self,
        subject_id: &SubjectId,
        delay_ms: u64,
    ) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(self.ai_url(&format!("/candidates/{subject_id}/queue")))
            .json(&json!({ "delay": delay_ms, "force": true }))
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// The API wraps most payloads as `{"data": ...}`; older endpoints return
/// the payload bare.
pub(crate) fn unwrap_envelope(body: &Value) -> &Value {
    match body.get("data") {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}

fn decode_payload<T: DeserializeOwned>(body: Value) -> Result<T, TransportError> {
    Ok(T::deserialize(unwrap_envelope(&body))?)
}

/// A `null` listing, enveloped or bare, means no postings.
fn decode_listing(body: Value) -> Result<Vec<JobPosting>, TransportError> {
    let postings = body.get("data").unwrap_or(&body);
    match postings {
        Value::Null => Ok(Vec::new()),
        postings => Ok(Vec::<JobPosting>::deserialize(postings)?),
    }
}

fn decode_status(body: Value) -> Result<Option<AiAnalysisStatus>, TransportError> {
    match body.get("data") {
        Some(Value::Null) | None => Ok(None),
        Some(data) => Ok(Some(AiAnalysisStatus::deserialize(data)?)),
    }
}

/// Pull the created candidate id out of an apply response. A missing or
/// malformed id yields a receipt without one; the application itself was
/// still accepted.
fn decode_receipt(body: &Value) -> SubmissionReceipt {
    let data = unwrap_envelope(body);
    let subject_id = ["_id", "id"]
        .iter()
        .filter_map(|field| data.get(*field).and_then(Value::as_str))
        .find_map(|raw| SubjectId::parse(raw).ok());
    SubmissionReceipt { subject_id }
}
