//! `videssay-dashboard` -- headless dashboard for the video-essay
//! pipeline.
//!
//! Connects to the pipeline API, loads the job list, auto-selects the
//! most recent job, and follows its multi-stage progress (script ->
//! audio -> video), logging every state change until interrupted.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                 | Description                      |
//! |-------------------------|----------|-------------------------|----------------------------------|
//! | `API_BASE_URL`          | no       | `http://localhost:8000` | Pipeline API origin              |
//! | `API_PREFIX`            | no       | `/api/v1`               | Job route prefix                 |
//! | `API_TOKEN`             | no       | `local-dev-token`       | Bearer token                     |
//! | `POLL_INTERVAL_SECS`    | no       | `5`                     | Seconds between poll ticks       |
//! | `JOB_LIST_LIMIT`        | no       | `20`                    | Jobs per list refresh            |
//! | `ENABLE_VIDEO`          | no       | `true`                  | Video feature flag               |
//! | `METRICS_DASHBOARD_URL` | no       | --                      | External metrics dashboard link  |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use videssay_client::JobsClient;
use videssay_sync::{DashboardConfig, DashboardEngine, DashboardEvent, NoticeLevel};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "videssay_dashboard=info,videssay_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DashboardConfig::from_env();

    tracing::info!(
        base_url = %config.api_base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        video_enabled = config.video_enabled,
        "Starting videssay-dashboard",
    );
    if let Some(link) = &config.metrics_dashboard_url {
        tracing::info!(url = %link, "Metrics dashboard");
    }

    // One upfront liveness probe so a bad URL or token fails loudly.
    let probe = JobsClient::new(&config.api_base_url, &config.api_prefix, &config.api_token);
    if let Err(e) = probe.health().await {
        tracing::warn!(error = %e, "Pipeline API health probe failed, continuing anyway");
    }

    let engine = match DashboardEngine::start(config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create artifact cache directory");
            std::process::exit(1);
        }
    };

    let mut events = engine.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    engine.bootstrap().await;

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl-c");
    tracing::info!("Interrupt received, shutting down");

    engine.shutdown().await;
    logger.abort();
}

/// Render one engine event as a log line.
fn log_event(event: &DashboardEvent) {
    match event {
        DashboardEvent::ListUpdated { count } => {
            tracing::debug!(count, "Job list updated");
        }
        DashboardEvent::SelectionChanged { job_id } => {
            tracing::info!(job_id = job_id.as_deref().unwrap_or("-"), "Selection changed");
        }
        DashboardEvent::JobUpdated { job_id } => {
            tracing::debug!(%job_id, "Job snapshot applied");
        }
        DashboardEvent::ArtifactReady { job_id, kind } => {
            tracing::info!(%job_id, %kind, "Artifact ready");
        }
        DashboardEvent::ArtifactRevoked { job_id, kind } => {
            tracing::debug!(%job_id, %kind, "Artifact handle revoked");
        }
        DashboardEvent::ArtifactUnavailable { job_id, kind } => {
            tracing::warn!(%job_id, %kind, "Artifact not available");
        }
        DashboardEvent::Notice { level, text } => match level {
            NoticeLevel::Info => tracing::info!("{text}"),
            NoticeLevel::Error => tracing::error!("{text}"),
        },
    }
}
