//! Artifact kinds served by `GET /jobs/{id}/artifact/{kind}`.

use serde::{Deserialize, Serialize};

/// One downloadable artifact of a job.
///
/// Script and frames decode as text; audio and video are opaque binary
/// payloads that the resolver wraps in a revocable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Script,
    Frames,
    Audio,
    Video,
}

impl ArtifactKind {
    /// Path segment used by the artifact endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Script => "script",
            ArtifactKind::Frames => "frames",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Video => "video",
        }
    }

    /// True for kinds fetched as opaque bytes and held behind a
    /// revocable handle.
    pub fn is_binary(self) -> bool {
        matches!(self, ArtifactKind::Audio | ArtifactKind::Video)
    }

    /// The two binary kinds, in resolver sync order.
    pub const BINARY: [ArtifactKind; 2] = [ArtifactKind::Audio, ArtifactKind::Video];
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
