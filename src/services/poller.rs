//! AI analysis status polling.
//!
//! One [`AiStatusPoller`] owns one [`PollingSession`]: a background task that
//! fetches the status for a single candidate on a fixed interval until the
//! analysis reaches a terminal state, a fetch fails, or the poller is stopped.
//!
//! Fetches are strictly sequential. The session lives in a `watch` channel;
//! every update goes through the channel's lock and is only applied while the
//! session is active, so once [`AiStatusPoller::stop`] returns the session can
//! no longer change.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::models::ai_status::{self, AiAnalysisStatus, StatusClass};
use crate::models::ids::SubjectId;
use crate::services::transport::{HiringTransport, TransportError};

/// Called with every accepted status update, after the session has been
/// updated. Not called once the poller has been stopped.
pub type StatusObserver = Box<dyn Fn(&AiAnalysisStatus) + Send + Sync>;

/// A status fetch failed and ended its session.
#[derive(Debug, thiserror::Error)]
#[error("AI status fetch for {subject_id} failed: {source}")]
pub struct PollFetchError {
    pub subject_id: SubjectId,
    #[source]
    pub source: TransportError,
}

/// State of one polling lifecycle.
#[derive(Debug, Clone)]
pub struct PollingSession {
    pub subject_id: SubjectId,
    pub interval: Duration,
    pub active: bool,
    pub last_status: Option<AiAnalysisStatus>,
    /// Fetches whose result was applied to this session.
    pub fetches: u32,
    /// Set when a fetch failure ended the session.
    pub failure: Option<String>,
}

impl PollingSession {
    pub fn message(&self) -> String {
        ai_status::status_message(self.last_status.as_ref())
    }

    pub fn class(&self) -> StatusClass {
        ai_status::status_class(self.last_status.as_ref())
    }
}

pub struct AiStatusPoller {
    session: Arc<watch::Sender<PollingSession>>,
    cancel: CancellationToken,
}

impl AiStatusPoller {
    /// Start polling `subject_id`. The first fetch happens one `interval`
    /// after start. Must be called from within a Tokio runtime.
    pub fn start(
        transport: Arc<dyn HiringTransport>,
        subject_id: SubjectId,
        interval: Duration,
        observer: Option<StatusObserver>,
    ) -> Self {
        let (session, _) = watch::channel(PollingSession {
            subject_id: subject_id.clone(),
            interval,
            active: true,
            last_status: None,
            fetches: 0,
            failure: None,
        });
        let session = Arc::new(session);
        let cancel = CancellationToken::new();

        tracing::info!(subject_id = %subject_id, interval_ms = interval.as_millis() as u64, "Starting AI status polling");

        tokio::spawn(poll_loop(
            transport,
            subject_id,
            interval,
            Arc::clone(&session),
            cancel.clone(),
            observer,
        ));

        Self { session, cancel }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollingSession> {
        self.session.subscribe()
    }

    pub fn session(&self) -> PollingSession {
        self.session.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.session.borrow().active
    }

    pub fn message(&self) -> String {
        self.session.borrow().message()
    }

    pub fn class(&self) -> StatusClass {
        self.session.borrow().class()
    }

    /// Stop polling. Idempotent; after it returns the session no longer
    /// changes and no further fetch is issued.
    pub fn stop(&self) {
        self.cancel.cancel();
        let stopped = self.session.send_if_modified(|s| {
            let was_active = s.active;
            s.active = false;
            was_active
        });
        if stopped {
            tracing::debug!(subject_id = %self.session.borrow().subject_id, "AI status polling stopped");
        }
    }

    /// Resolve once the session is no longer active, for whatever reason.
    pub async fn finished(&self) {
        let mut rx = self.session.subscribe();
        let _ = rx.wait_for(|s| !s.active).await;
    }
}

impl Drop for AiStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    transport: Arc<dyn HiringTransport>,
    subject_id: SubjectId,
    interval: Duration,
    session: Arc<watch::Sender<PollingSession>>,
    cancel: CancellationToken,
    observer: Option<StatusObserver>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        metrics::counter!("ai_status_polls_total").increment(1);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = transport.ai_status(&subject_id) => result,
        };

        match result {
            Ok(status) => {
                let terminal = status.as_ref().is_some_and(|s| s.ai_status.is_terminal());
                let applied = session.send_if_modified(|s| {
                    if !s.active {
                        return false;
                    }
                    s.fetches += 1;
                    s.last_status = status.clone();
                    if terminal {
                        s.active = false;
                    }
                    true
                });

                if !applied {
                    return;
                }

                if let (Some(observer), Some(status)) = (&observer, &status) {
                    if !cancel.is_cancelled() {
                        observer(status);
                    }
                }

                tracing::debug!(
                    subject_id = %subject_id,
                    status = ?status.as_ref().map(|s| s.ai_status),
                    "AI status update"
                );

                if terminal {
                    tracing::info!(subject_id = %subject_id, "AI analysis reached a terminal state, polling finished");
                    return;
                }
            }
            Err(source) => {
                let error = PollFetchError {
                    subject_id: subject_id.clone(),
                    source,
                };
                tracing::warn!(error = %error, "Stopping AI status polling");
                metrics::counter!("ai_status_poll_failures_total").increment(1);
                session.send_if_modified(|s| {
                    if !s.active {
                        return false;
                    }
                    s.fetches += 1;
                    s.failure = Some(error.to_string());
                    s.active = false;
                    true
                });
                return;
            }
        }
    }
}
