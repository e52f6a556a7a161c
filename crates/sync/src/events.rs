//! In-process event fan-out backed by a `tokio::sync::broadcast`
//! channel.
//!
//! The engine publishes a [`DashboardEvent`] after every observable
//! state change; any number of subscribers (UI layers, loggers, tests)
//! receive each event independently. Publishing never blocks and never
//! fails -- events are dropped when nobody is listening.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use videssay_core::artifact::ArtifactKind;
use videssay_core::types::JobId;

/// Broadcast channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Severity of a user-facing notice banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A state change worth rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// The job list was replaced by a fresh server snapshot.
    ListUpdated { count: usize },

    /// The viewed job changed (or was cleared).
    SelectionChanged { job_id: Option<JobId> },

    /// A job's detail snapshot was applied.
    JobUpdated { job_id: JobId },

    /// A binary artifact was fetched and is locally playable.
    ArtifactReady { job_id: JobId, kind: ArtifactKind },

    /// A previously held artifact handle was released.
    ArtifactRevoked { job_id: JobId, kind: ArtifactKind },

    /// The stage reports `completed` but the artifact could not be
    /// fetched; render an inline "not available" state, not a failure
    /// banner.
    ArtifactUnavailable { job_id: JobId, kind: ArtifactKind },

    /// Short human-readable status message for a transient banner.
    Notice { level: NoticeLevel, text: String },
}

/// Publish/subscribe hub for [`DashboardEvent`]s.
///
/// Cheap to clone; all clones feed the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventBus {
    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DashboardEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.sender.send(event);
    }

    /// Publish an info-level notice.
    pub fn notify_info(&self, text: impl Into<String>) {
        self.publish(DashboardEvent::Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        });
    }

    /// Publish an error-level notice.
    pub fn notify_error(&self, text: impl Into<String>) {
        self.publish(DashboardEvent::Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        });
    }
}
