use std::time::Duration;

/// Default seconds between poll ticks for an active job.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default number of jobs requested per list refresh.
const DEFAULT_LIST_LIMIT: u32 = 20;

/// Engine configuration, injected at construction.
///
/// The engine never reads the environment itself; the binary populates
/// this struct (see [`DashboardConfig::from_env`]) and tests inject
/// fixtures directly.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Pipeline API origin (default: `http://localhost:8000`).
    pub api_base_url: String,
    /// Path prefix the job routes are mounted under (default: `/api/v1`).
    pub api_prefix: String,
    /// Bearer token attached to every job request.
    pub api_token: String,
    /// Period of the selected-job poll loop.
    pub poll_interval: Duration,
    /// Jobs requested per list refresh.
    pub list_limit: u32,
    /// Whether the deployment has video rendering enabled; gates the
    /// video trigger.
    pub video_enabled: bool,
    /// Optional link to an external metrics dashboard, surfaced
    /// verbatim to the UI.
    pub metrics_dashboard_url: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            api_prefix: "/api/v1".into(),
            api_token: "local-dev-token".into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            list_limit: DEFAULT_LIST_LIMIT,
            video_enabled: true,
            metrics_dashboard_url: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `API_BASE_URL`          | `http://localhost:8000` |
    /// | `API_PREFIX`            | `/api/v1`               |
    /// | `API_TOKEN`             | `local-dev-token`       |
    /// | `POLL_INTERVAL_SECS`    | `5`                     |
    /// | `JOB_LIST_LIMIT`        | `20`                    |
    /// | `ENABLE_VIDEO`          | `true`                  |
    /// | `METRICS_DASHBOARD_URL` | unset                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("API_BASE_URL").unwrap_or(defaults.api_base_url);
        let api_prefix = std::env::var("API_PREFIX").unwrap_or(defaults.api_prefix);
        let api_token = std::env::var("API_TOKEN").unwrap_or(defaults.api_token);

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let list_limit: u32 = std::env::var("JOB_LIST_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LIST_LIMIT);

        let video_enabled = std::env::var("ENABLE_VIDEO")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.video_enabled);

        let metrics_dashboard_url = std::env::var("METRICS_DASHBOARD_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            api_base_url,
            api_prefix,
            api_token,
            poll_interval: Duration::from_secs(poll_interval_secs),
            list_limit,
            video_enabled,
            metrics_dashboard_url,
        }
    }
}
