//! Shared fixtures for the engine integration tests.

use std::time::Duration;

use serde_json::json;

use videssay_sync::DashboardConfig;

pub const TOKEN: &str = "test-token";

/// Fresh server-style job id.
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A full job payload with sensible defaults; `overrides` replaces
/// individual fields.
pub fn job_json(id: &str, overrides: serde_json::Value) -> serde_json::Value {
    let mut base = json!({
        "id": id,
        "topic": "Rise of AI",
        "style": "Documentary",
        "length": 180,
        "status": "queued",
        "script_status": "queued",
        "audio_status": "not_requested",
        "video_status": "not_requested",
        "script": null,
        "transcript": null,
        "image_prompts": null,
        "review_score": null,
        "generation_time": null,
        "video_url": null,
        "audio_path": null,
        "frames_path": null,
        "youtube_context": null,
        "created_at": "2026-08-06T08:00:00Z",
        "updated_at": "2026-08-06T08:00:00Z",
        "started_at": null,
        "finished_at": null
    });

    if let (Some(fields), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            fields.insert(key.clone(), value.clone());
        }
    }
    base
}

/// Engine configuration pointed at a mock server.
pub fn test_config(base_url: &str, poll_interval: Duration) -> DashboardConfig {
    DashboardConfig {
        api_base_url: base_url.to_string(),
        api_prefix: "/api/v1".into(),
        api_token: TOKEN.into(),
        poll_interval,
        list_limit: 20,
        video_enabled: true,
        metrics_dashboard_url: None,
    }
}

/// A poll interval long enough to never fire during a test.
pub fn no_polling() -> Duration {
    Duration::from_secs(600)
}
