use tracing_subscriber::EnvFilter;

/// Install the JSON log subscriber on stderr. `RUST_LOG` overrides the
/// default `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();
}

/// Register descriptions for the counters this crate emits. Whatever
/// recorder the host installs picks them up.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "application_uploads_total",
        "Resume uploads attempted, by outcome"
    );
    metrics::describe_counter!(
        "application_submissions_total",
        "Application submissions attempted, by outcome"
    );
    metrics::describe_counter!(
        "ai_status_polls_total",
        "AI status fetches issued"
    );
    metrics::describe_counter!(
        "ai_status_poll_failures_total",
        "AI status fetches that failed and ended a polling session"
    );
}
