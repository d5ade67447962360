//! Test helpers: a scripted in-memory hiring API

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hiring_apply::{
    config::AppConfig,
    models::{
        ai_status::{AiAnalysisStatus, AiWorkflowStats},
        application::{ApplicationForm, ApplicationSubmission, SubmissionReceipt},
        ids::{JobId, SubjectId},
        job::{JobPosting, JobQuery},
        upload::{ResumeFile, TransferProgress},
    },
    services::{
        notify::{Toast, ToastBus},
        orchestrator::{SubmissionOrchestrator, SubmissionSettings},
        transport::{HiringTransport, ProgressFn, TransportError},
    },
};
use tokio::sync::broadcast;

pub const JOB_ID: &str = "64b7f0c2a1d3e4f5a6b7c8d9";
pub const SUBJECT_ID: &str = "507f1f77bcf86cd799439011";
pub const RESUME_KEY: &str = "resumes/2024/cv-0001.pdf";

/// Everything the fake transport was asked to do.
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub uploads: usize,
    pub upload_categories: Vec<String>,
    pub applies: Vec<(String, ApplicationSubmission)>,
    pub status_fetches: Vec<String>,
}

impl Calls {
    pub fn network_calls(&self) -> usize {
        self.uploads + self.applies.len() + self.status_fetches.len()
    }
}

/// Scripted [`HiringTransport`].
///
/// Status fetches pop from a script of raw JSON payloads (`None` meaning "no
/// status yet"); once the script runs dry every further fetch fails.
pub struct FakeTransport {
    calls: Mutex<Calls>,
    receipt_id: Option<&'static str>,
    fail_apply: bool,
    upload_body: Option<Value>,
    upload_delay: Duration,
    progress: Vec<(u64, Option<u64>)>,
    statuses: Mutex<VecDeque<Option<&'static str>>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            receipt_id: Some(SUBJECT_ID),
            fail_apply: false,
            upload_body: Some(json!({"success": true, "data": {"fileKey": RESUME_KEY}})),
            upload_delay: Duration::ZERO,
            progress: vec![(50, Some(100)), (100, Some(100))],
            statuses: Mutex::new(VecDeque::new()),
        }
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, script: &[Option<&'static str>]) -> Self {
        *self.statuses.lock().unwrap() = script.iter().copied().collect();
        self
    }

    pub fn with_progress(mut self, events: &[(u64, Option<u64>)]) -> Self {
        self.progress = events.to_vec();
        self
    }

    pub fn with_upload_body(mut self, body: Value) -> Self {
        self.upload_body = Some(body);
        self
    }

    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.upload_body = None;
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn without_receipt_id(mut self) -> Self {
        self.receipt_id = None;
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

fn server_error(body: &str) -> TransportError {
    TransportError::Status {
        status: 500,
        body: body.to_string(),
    }
}

#[async_trait]
impl HiringTransport for FakeTransport {
    async fn list_jobs(&self, _query: &JobQuery) -> Result<Vec<JobPosting>, TransportError> {
        Ok(vec![posting()])
    }

    async fn get_job(&self, _id: &JobId) -> Result<JobPosting, TransportError> {
        Ok(posting())
    }

    async fn apply(
        &self,
        job_id: &JobId,
        submission: &ApplicationSubmission,
    ) -> Result<SubmissionReceipt, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .applies
            .push((job_id.to_string(), submission.clone()));

        if self.fail_apply {
            return Err(server_error("apply rejected"));
        }
        Ok(SubmissionReceipt {
            subject_id: self.receipt_id.map(|id| SubjectId::parse(id).unwrap()),
        })
    }

    async fn upload_file(
        &self,
        _file: &ResumeFile,
        category: &str,
        progress: ProgressFn,
    ) -> Result<Value, TransportError> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.uploads += 1;
            calls.upload_categories.push(category.to_string());
        }

        for &(loaded, total) in &self.progress {
            progress(TransferProgress { loaded, total });
        }
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }

        self.upload_body
            .clone()
            .ok_or_else(|| server_error("storage unavailable"))
    }

    async fn ai_status(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Option<AiAnalysisStatus>, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .status_fetches
            .push(subject_id.to_string());

        match self.statuses.lock().unwrap().pop_front() {
            Some(Some(raw)) => Ok(Some(serde_json::from_str(raw)?)),
            Some(None) => Ok(None),
            None => Err(server_error("status script exhausted")),
        }
    }

    async fn ai_stats(&self) -> Result<AiWorkflowStats, TransportError> {
        Ok(serde_json::from_value(json!({
            "statusCounts": {"pending": 1, "processing": 0, "complete": 3, "failed": 0, "skipped": 1}
        }))?)
    }

    async fn retry_failed(&self, limit: u32) -> Result<Value, TransportError> {
        Ok(json!({"retried": 0, "limit": limit}))
    }

    async fn queue_candidate(
        &self,
        subject_id: &SubjectId,
        delay_ms: u64,
    ) -> Result<Value, TransportError> {
        Ok(json!({"queued": subject_id.as_str(), "delay": delay_ms}))
    }
}

pub fn posting() -> JobPosting {
    serde_json::from_value(json!({
        "_id": JOB_ID,
        "title": "Backend Engineer",
        "location": "Remote",
        "requirements": ["Rust", "SQL"]
    }))
    .expect("posting fixture")
}

pub fn valid_form() -> ApplicationForm {
    ApplicationForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: Some("+44 20 7946 0000".to_string()),
        cover_letter: None,
    }
}

pub fn pdf_resume(size: usize) -> ResumeFile {
    ResumeFile::new("cv.pdf", "application/pdf", vec![b'%'; size])
}

pub const PENDING: &str = r#"{"candidateId": "507f1f77bcf86cd799439011", "aiStatus": "pending"}"#;
pub const PROCESSING: &str = r#"{"candidateId": "507f1f77bcf86cd799439011", "aiStatus": "processing"}"#;
pub const COMPLETE: &str = r#"{"candidateId": "507f1f77bcf86cd799439011", "aiStatus": "complete", "hasAnalysis": true, "extractedSkills": ["Rust", "SQL"]}"#;
pub const SKIPPED: &str = r#"{"candidateId": "507f1f77bcf86cd799439011", "aiStatus": "skipped"}"#;
pub const FAILED_RETRYABLE: &str = r#"{"candidateId": "507f1f77bcf86cd799439011", "aiStatus": "failed", "aiRetryCount": 1, "lastAIError": {"message": "model timeout", "retryable": true}}"#;

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub toasts: Arc<ToastBus>,
    pub rx: broadcast::Receiver<Toast>,
    pub orchestrator: SubmissionOrchestrator,
}

impl Harness {
    pub fn new(transport: FakeTransport) -> Self {
        let transport = Arc::new(transport);
        let toasts = Arc::new(ToastBus::default());
        let rx = toasts.subscribe();
        let config = AppConfig {
            poll_interval_ms: 1000,
            ..AppConfig::default()
        };
        let orchestrator = SubmissionOrchestrator::new(
            transport.clone(),
            toasts.clone(),
            SubmissionSettings::from_config(&config),
        );
        Self {
            transport,
            toasts,
            rx,
            orchestrator,
        }
    }

    /// Toasts published so far.
    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        let mut seen = Vec::new();
        while let Ok(toast) = self.rx.try_recv() {
            seen.push(toast);
        }
        seen
    }
}
