use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use hiring_apply::{
    app_state::AppState,
    config::AppConfig,
    models::{
        application::ApplicationForm,
        ids::SubjectId,
        job::{JobQuery, JobRef},
        upload::{ResumeFile, UploadPhase},
    },
    services::{
        notify::{NotificationSink, ToastBus, TracingSink, TOAST_LIFETIME},
        orchestrator::SubmissionState,
        poller::{AiStatusPoller, PollingSession},
        transport::HttpTransport,
    },
    telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "hiring-apply", version, about = "Apply to job postings and follow the AI resume analysis")]
struct Cli {
    /// Log notifications instead of printing them.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List open postings.
    Jobs {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
    /// Show one posting.
    Job { id: String },
    /// Submit an application, then follow its AI analysis.
    Apply(ApplyArgs),
    /// Follow the AI analysis of an existing candidate.
    Status { candidate_id: String },
    /// Show AI workflow counters.
    Stats,
    /// Ask the backend to retry failed analyses.
    RetryFailed {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Re-queue one candidate for analysis.
    Queue {
        candidate_id: String,
        /// Delay before the analysis starts, in milliseconds.
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
}

#[derive(Debug, Args)]
struct ApplyArgs {
    job_id: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    cover_letter: Option<String>,
    /// Resume to upload (PDF, Word or plain text).
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Return right after submitting instead of following the analysis.
    #[arg(long)]
    no_wait: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    telemetry::describe_metrics();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let transport = match HttpTransport::new(&config.api_base_url, config.request_timeout()) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize HTTP client");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(api_base_url = %config.api_base_url, "Hiring API client ready");

    let (notifier, printer) = if cli.quiet {
        let notifier: Arc<dyn NotificationSink> = Arc::new(TracingSink);
        (notifier, None)
    } else {
        let toasts = Arc::new(ToastBus::default());
        let printer = spawn_toast_printer(&toasts);
        let notifier: Arc<dyn NotificationSink> = toasts;
        (notifier, Some(printer))
    };
    let state = AppState::new(config, Arc::new(transport), notifier);

    let result = run(cli.command, &state).await;

    // Let the printer drain once every notifier handle is gone.
    drop(state);
    if let Some(printer) = printer {
        let _ = tokio::time::timeout(TOAST_LIFETIME, printer).await;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, state: &AppState) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Jobs { page, page_size } => {
            let postings = state
                .transport
                .list_jobs(&JobQuery { page, page_size })
                .await?;
            for posting in postings {
                println!(
                    "{}  {}  {}",
                    posting.id,
                    posting.title,
                    posting.location.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Job { id } => {
            let job_id = JobRef::from(id.as_str()).job_id()?;
            let posting = state.transport.get_job(&job_id).await?;
            println!("{}", serde_json::to_string_pretty(&posting)?);
        }
        Command::Apply(args) => apply(args, state).await?,
        Command::Status { candidate_id } => {
            let subject_id = SubjectId::parse(&candidate_id)?;
            let poller = AiStatusPoller::start(
                Arc::clone(&state.transport),
                subject_id,
                state.config.poll_interval(),
                None,
            );
            print_status_updates(poller.subscribe()).await;
        }
        Command::Stats => {
            let stats = state.transport.ai_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::RetryFailed { limit } => {
            let body = state.transport.retry_failed(limit).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Queue {
            candidate_id,
            delay,
        } => {
            let subject_id = SubjectId::parse(&candidate_id)?;
            let body = state.transport.queue_candidate(&subject_id, delay).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}

async fn apply(args: ApplyArgs, state: &AppState) -> Result<(), Box<dyn Error>> {
    let job_id = JobRef::from(args.job_id.as_str()).job_id()?;

    let resume = match &args.resume {
        Some(path) => Some(ResumeFile::from_path(path).await?),
        None => None,
    };

    let form = ApplicationForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        cover_letter: args.cover_letter,
    };

    let orchestrator = state.orchestrator();
    let progress = resume
        .is_some()
        .then(|| spawn_upload_printer(orchestrator.subscribe()));
    let submitted = orchestrator.submit(job_id.as_str(), form, resume).await;
    if let Some(progress) = progress {
        progress.abort();
    }

    let outcome = match submitted {
        Ok(outcome) => outcome,
        Err(e) => {
            for field in orchestrator.state().field_errors {
                eprintln!("  {}: {}", field.field, field.message);
            }
            return Err(e.into());
        }
    };

    if let Some(key) = &outcome.resume_file_key {
        println!("resume stored as {key}");
    }

    match (&outcome.subject_id, orchestrator.subscribe_status()) {
        (Some(subject_id), Some(rx)) if !args.no_wait => {
            println!("candidate {subject_id}");
            print_status_updates(rx).await;
        }
        (Some(subject_id), _) => println!("candidate {subject_id}"),
        (None, _) => println!("application submitted"),
    }

    orchestrator.stop_status_tracking();
    Ok(())
}

async fn print_status_updates(mut rx: watch::Receiver<PollingSession>) {
    loop {
        let session = rx.borrow_and_update().clone();
        println!("[{}] {}", session.class(), session.message());

        if !session.active {
            if let Some(failure) = &session.failure {
                eprintln!("status polling stopped: {failure}");
            }
            break;
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn spawn_upload_printer(mut rx: watch::Receiver<SubmissionState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut shown = None;
        while rx.changed().await.is_ok() {
            let upload = rx.borrow_and_update().upload.clone();
            if upload.phase == UploadPhase::Uploading && shown != Some(upload.progress_percent) {
                shown = Some(upload.progress_percent);
                eprintln!("uploading resume: {}%", upload.progress_percent);
            }
        }
    })
}

fn spawn_toast_printer(toasts: &ToastBus) -> JoinHandle<()> {
    let mut rx = toasts.subscribe();
    tokio::spawn(async move {
        while let Ok(toast) = rx.recv().await {
            println!("({}) {}", toast.kind, toast.text);
        }
    })
}
