//! Job snapshot types as exchanged with the pipeline API.
//!
//! A [`Job`] is always applied wholesale: the server's detail response
//! replaces the previous snapshot field for field, never merged. The
//! stage artifact fields (`script`, `video_url`, the audio handle) are
//! only meaningful while the corresponding stage status is
//! [`JobStatus::Completed`] -- check the status before reading them.

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::types::{JobId, Timestamp};

/// Pipeline status vocabulary, shared by the overall job status and the
/// three per-stage status fields.
///
/// `NotRequested` only ever appears on stage fields -- the audio and
/// video stages start there until the user triggers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Rerendering,
    NotRequested,
}

impl JobStatus {
    /// Wire representation, matching the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Rerendering => "rerendering",
            JobStatus::NotRequested => "not_requested",
        }
    }

    /// All vocabulary values, for table-driven tests.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Rerendering,
        JobStatus::NotRequested,
    ];
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation request and its pipeline progress, as returned by the
/// detail and list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Server-assigned identifier, immutable once created.
    pub id: JobId,

    /// Requested essay topic.
    pub topic: String,
    /// Requested narration style (e.g. "Documentary").
    pub style: String,
    /// Target narration length in seconds.
    pub length: i64,

    /// Overall pipeline status.
    pub status: JobStatus,
    /// Script generation stage.
    pub script_status: JobStatus,
    /// Text-to-speech stage.
    pub audio_status: JobStatus,
    /// Rendering stage.
    pub video_status: JobStatus,

    /// Narration script, present once the script stage completes.
    pub script: Option<String>,
    /// TTS-ready transcript, present once the script stage completes.
    pub transcript: Option<String>,
    /// Structured image prompt overrides (JSON object).
    pub image_prompts: Option<serde_json::Value>,

    /// Reviewer model score for the script, 0-100.
    pub review_score: Option<f64>,
    /// Wall-clock seconds spent generating, cumulative across stages.
    pub generation_time: Option<f64>,
    /// Reference to the rendered file, present only when
    /// `video_status == completed`.
    pub video_url: Option<String>,
    /// Server-side path of the synthesized audio file.
    pub audio_path: Option<String>,
    /// Server-side path of the rendered frames / cover image.
    pub frames_path: Option<String>,

    /// Optional YouTube research payload (search results, transcripts,
    /// summary text). Read-only on the client.
    pub youtube_context: Option<serde_json::Value>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl Job {
    /// Status of the stage that produces the given artifact.
    ///
    /// Frames are emitted by the rendering stage, so they share
    /// `video_status`.
    pub fn stage_status(&self, kind: ArtifactKind) -> JobStatus {
        match kind {
            ArtifactKind::Script => self.script_status,
            ArtifactKind::Audio => self.audio_status,
            ArtifactKind::Frames | ArtifactKind::Video => self.video_status,
        }
    }
}

/// Envelope returned by `GET /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobList {
    pub items: Vec<Job>,
}

/// Creation parameters submitted via `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct JobDraft {
    #[validate(length(min = 3, max = 255, message = "must be 3 to 255 characters"))]
    pub topic: String,

    #[validate(length(min = 3, max = 255, message = "must be 3 to 255 characters"))]
    pub style: String,

    /// Desired length in seconds. The server rejects anything at or
    /// below 30.
    #[validate(range(min = 31, message = "must be longer than 30 seconds"))]
    pub length: i64,

    /// Optional structured image prompt overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompts: Option<serde_json::Value>,
}

/// Editable fields submitted via `PATCH /jobs/{id}`.
///
/// Unset fields are omitted from the payload entirely -- the server
/// rejects a patch with no changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobEdits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompts: Option<serde_json::Value>,
}

impl JobEdits {
    /// True when no field is set (the patch would be rejected).
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.transcript.is_none() && self.image_prompts.is_none()
    }
}
