//! Application submission flow: validate, upload the resume, apply, then
//! track the AI analysis of the created candidate.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::models::ai_status::{self, AiAnalysisStatus, AiStatus, StatusClass, RETRY_ANNOTATION};
use crate::models::application::{ApplicationForm, ApplicationSubmission};
use crate::models::ids::{JobId, SubjectId};
use crate::models::upload::{ResumeFile, UploadState};
use crate::services::notify::NotificationSink;
use crate::services::poller::{AiStatusPoller, PollingSession, StatusObserver};
use crate::services::transport::{HiringTransport, TransportError};
use crate::services::upload::{UploadError, UploadSettings, UploadTracker};
use crate::services::validation::{self, FieldError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Resume upload failed: {0}")]
    Upload(#[source] TransportError),

    #[error("Application submission failed: {0}")]
    Submission(#[source] TransportError),
}

#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub upload: UploadSettings,
    pub upload_category: String,
    pub poll_interval: Duration,
}

impl SubmissionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            upload: UploadSettings {
                policy: config.file_policy(),
                resource_key_fields: config.resource_key_fields.clone(),
            },
            upload_category: config.upload_category.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// What a presentation layer renders for the apply form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmissionState {
    pub submitting: bool,
    /// Set once a validation failure should reveal every field's errors.
    pub touched: bool,
    pub field_errors: Vec<FieldError>,
    pub upload: UploadState,
    pub subject_id: Option<SubjectId>,
    pub show_ai_status: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub subject_id: Option<SubjectId>,
    pub resume_file_key: Option<String>,
}

/// Sequences one application at a time and owns the status poller for the
/// most recent one. Dropping the orchestrator stops that poller.
pub struct SubmissionOrchestrator {
    transport: Arc<dyn HiringTransport>,
    notifier: Arc<dyn NotificationSink>,
    settings: SubmissionSettings,
    submitting: AtomicBool,
    state: watch::Sender<SubmissionState>,
    poller: Mutex<Option<AiStatusPoller>>,
}

impl SubmissionOrchestrator {
    pub fn new(
        transport: Arc<dyn HiringTransport>,
        notifier: Arc<dyn NotificationSink>,
        settings: SubmissionSettings,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self {
            transport,
            notifier,
            settings,
            submitting: AtomicBool::new(false),
            state,
            poller: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Submit an application for `job_id`.
    ///
    /// Local validation failures abort before any network call and are
    /// reported only through the returned error and the form state. Upload
    /// and apply failures additionally raise one error notification.
    pub async fn submit(
        &self,
        job_id: &str,
        form: ApplicationForm,
        file: Option<ResumeFile>,
    ) -> Result<SubmissionOutcome, SubmitError> {
        if self.is_submitting() {
            tracing::debug!("Submission already in flight, ignoring");
            return Err(SubmitError::AlreadySubmitting);
        }

        let job_id = JobId::parse(job_id).inspect_err(|_| {
            tracing::warn!(job_id, "Invalid job id, aborting apply");
        })?;

        let form = form.trimmed();
        if let Err(e) = validation::validate_form(&form) {
            if let ValidationError::InvalidForm { fields } = &e {
                self.state.send_modify(|s| {
                    s.touched = true;
                    s.field_errors = fields.clone();
                });
            }
            return Err(e.into());
        }

        let _guard = SubmittingGuard::acquire(&self.submitting, &self.state)
            .ok_or(SubmitError::AlreadySubmitting)?;
        self.state.send_modify(|s| {
            s.touched = false;
            s.field_errors.clear();
            s.upload = UploadState::default();
        });

        let resume_file_key = match file {
            Some(file) => self.upload_resume(&file).await?,
            None => None,
        };

        let submission = ApplicationSubmission::new(form, resume_file_key.clone());
        tracing::info!(
            job_id = %job_id,
            has_resume = submission.resume_file_key.is_some(),
            "Submitting application"
        );

        let receipt = match self.transport.apply(&job_id, &submission).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Application submission failed");
                metrics::counter!("application_submissions_total", "outcome" => "failed").increment(1);
                self.notifier.error("Failed to submit application");
                return Err(SubmitError::Submission(e));
            }
        };

        metrics::counter!("application_submissions_total", "outcome" => "submitted").increment(1);
        self.notifier.success("Application submitted, thank you");

        let subject_id = receipt.subject_id;
        self.state.send_modify(|s| {
            s.subject_id = subject_id.clone();
            s.show_ai_status = subject_id.is_some();
        });

        match &subject_id {
            Some(id) => self.start_status_tracking(id.clone()),
            None => tracing::warn!(job_id = %job_id, "Apply response had no candidate id, skipping AI status tracking"),
        }

        Ok(SubmissionOutcome {
            subject_id,
            resume_file_key,
        })
    }

    async fn upload_resume(&self, file: &ResumeFile) -> Result<Option<String>, SubmitError> {
        let tracker = UploadTracker::new(Arc::clone(&self.transport), self.settings.upload.clone());
        let mut progress = tracker.subscribe();

        let run = tracker.run(file, &self.settings.upload_category);
        tokio::pin!(run);
        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                Ok(()) = progress.changed() => {
                    let current = progress.borrow_and_update().clone();
                    self.state.send_modify(|s| s.upload = current);
                }
            }
        };

        let final_state = tracker.state();
        self.state.send_modify(|s| s.upload = final_state);

        match result {
            Ok(key) => Ok(key),
            Err(UploadError::Rejected(e)) => {
                tracing::warn!(error = %e, "Resume rejected before upload");
                Err(SubmitError::Validation(e))
            }
            Err(UploadError::Transport(e)) => {
                self.notifier.error("Failed to upload resume");
                Err(SubmitError::Upload(e))
            }
        }
    }

    /// Start polling the AI analysis for `subject_id`, replacing any
    /// previous session.
    pub fn start_status_tracking(&self, subject_id: SubjectId) {
        let notifier = Arc::clone(&self.notifier);
        let observer: StatusObserver =
            Box::new(move |status: &AiAnalysisStatus| {
            notify_terminal(notifier.as_ref(), status)
        });

        let poller = AiStatusPoller::start(
            Arc::clone(&self.transport),
            subject_id,
            self.settings.poll_interval,
            Some(observer),
        );

        if let Some(previous) = lock(&self.poller).replace(poller) {
            previous.stop();
        }
    }

    pub fn stop_status_tracking(&self) {
        if let Some(poller) = lock(&self.poller).as_ref() {
            poller.stop();
        }
    }

    pub fn status_session(&self) -> Option<PollingSession> {
        lock(&self.poller).as_ref().map(AiStatusPoller::session)
    }

    pub fn subscribe_status(&self) -> Option<watch::Receiver<PollingSession>> {
        lock(&self.poller).as_ref().map(AiStatusPoller::subscribe)
    }

    pub fn status_message(&self) -> String {
        match self.status_session() {
            Some(session) => session.message(),
            None => ai_status::status_message(None),
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self.status_session() {
            Some(session) => session.class(),
            None => ai_status::status_class(None),
        }
    }

    /// Resolve once the current status session (if any) has ended.
    pub async fn status_tracking_finished(&self) {
        let Some(mut rx) = self.subscribe_status() else {
            return;
        };
        let _ = rx.wait_for(|s| !s.active).await;
    }
}

fn notify_terminal(notifier: &dyn NotificationSink, status: &AiAnalysisStatus) {
    match status.ai_status {
        AiStatus::Complete => notifier.success("AI analysis complete!"),
        AiStatus::Failed => {
            let retry = status
                .last_ai_error
                .as_ref()
                .is_some_and(|e| e.retryable);
            let suffix = if retry { RETRY_ANNOTATION } else { "" };
            notifier.error(&format!("AI analysis failed{suffix}"));
        }
        _ => {}
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the in-flight flag for one submission and clears it on every exit
/// path.
struct SubmittingGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<SubmissionState>,
}

impl<'a> SubmittingGuard<'a> {
    fn acquire(flag: &'a AtomicBool, state: &'a watch::Sender<SubmissionState>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        state.send_modify(|s| s.submitting = true);
        Some(Self { flag, state })
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.state.send_modify(|s| s.submitting = false);
    }
}
