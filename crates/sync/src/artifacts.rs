//! Artifact resolution and handle lifecycle.
//!
//! Binary artifacts (audio, video) are fetched once their stage
//! completes and cached as temp files behind an [`ArtifactHandle`];
//! revoking a handle deletes the file. A handle is bound to exactly one
//! `(job, kind)` pair, owned exclusively by the [`ArtifactResolver`],
//! and released when the stage status moves away from `completed`, when
//! the job is deselected, or on shutdown. Textual artifacts (script
//! text, frame listings) are decoded on the fly and carry no handle.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use tokio::sync::Mutex;

use videssay_client::{ApiError, JobsClient};
use videssay_core::artifact::ArtifactKind;
use videssay_core::job::{Job, JobStatus};
use videssay_core::types::JobId;

use crate::events::{DashboardEvent, EventBus};

/// A locally resolved, revocable reference to one binary artifact.
///
/// The handle owns the backing temp file; revoking (or dropping) the
/// handle removes the file, so a handle can never outlive its payload
/// or be released twice.
pub struct ArtifactHandle {
    job_id: JobId,
    kind: ArtifactKind,
    file: tempfile::NamedTempFile,
}

impl ArtifactHandle {
    /// Filesystem path of the locally playable payload.
    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Delete the backing file and consume the handle.
    fn revoke(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(job_id = %self.job_id, kind = %self.kind, error = %e, "Failed to remove artifact file");
        } else {
            tracing::debug!(job_id = %self.job_id, kind = %self.kind, path = %path.display(), "Artifact handle revoked");
        }
    }
}

struct ResolverState {
    /// Job whose handles may be held; anything else is revoked.
    owner: Option<JobId>,
    held: HashMap<(JobId, ArtifactKind), ArtifactHandle>,
}

/// Fetches artifacts and owns every live [`ArtifactHandle`].
pub struct ArtifactResolver {
    client: JobsClient,
    bus: EventBus,
    cache_dir: tempfile::TempDir,
    state: Mutex<ResolverState>,
}

impl ArtifactResolver {
    /// Create a resolver with a private cache directory for handle
    /// files. The directory (and any leftover files) is removed when
    /// the resolver is dropped.
    pub fn new(client: JobsClient, bus: EventBus) -> std::io::Result<Self> {
        Ok(Self {
            client,
            bus,
            cache_dir: tempfile::TempDir::new()?,
            state: Mutex::new(ResolverState {
                owner: None,
                held: HashMap::new(),
            }),
        })
    }

    /// Path of the held handle for `(job, kind)`, if one exists.
    pub async fn handle_path(&self, job_id: &JobId, kind: ArtifactKind) -> Option<PathBuf> {
        let state = self.state.lock().await;
        state
            .held
            .get(&(job_id.clone(), kind))
            .map(ArtifactHandle::path)
    }

    /// Switch the owning job. Handles held for any other job are
    /// revoked -- deselection releases the previous job's previews.
    pub async fn set_owner(&self, job_id: Option<JobId>) {
        let mut state = self.state.lock().await;
        if state.owner == job_id {
            return;
        }
        state.owner = job_id;

        let owner = state.owner.clone();
        let stale: Vec<_> = state
            .held
            .keys()
            .filter(|(id, _)| owner.as_ref() != Some(id))
            .cloned()
            .collect();
        for key in stale {
            if let Some(handle) = state.held.remove(&key) {
                handle.revoke();
                self.bus.publish(DashboardEvent::ArtifactRevoked {
                    job_id: key.0,
                    kind: key.1,
                });
            }
        }
    }

    /// Reconcile held handles with a fresh snapshot of the owning job.
    ///
    /// A stage newly at `completed` acquires a handle (revoking any
    /// stale one for the pair first); a stage that regressed away from
    /// `completed` -- a rerender invalidating the old preview -- is
    /// revoked. A stage that stays `completed` keeps its handle, so
    /// poll ticks do not refetch.
    pub async fn sync_job(&self, job: &Job) {
        for kind in ArtifactKind::BINARY {
            let key = (job.id.clone(), kind);
            let completed = job.stage_status(kind) == JobStatus::Completed;

            let needs_fetch = {
                let mut state = self.state.lock().await;
                if state.owner.as_ref() != Some(&job.id) {
                    tracing::debug!(job_id = %job.id, "Snapshot for non-owned job, skipping artifact sync");
                    return;
                }
                match (completed, state.held.contains_key(&key)) {
                    (true, held) => !held,
                    (false, true) => {
                        if let Some(handle) = state.held.remove(&key) {
                            handle.revoke();
                            self.bus.publish(DashboardEvent::ArtifactRevoked {
                                job_id: key.0.clone(),
                                kind,
                            });
                        }
                        false
                    }
                    (false, false) => false,
                }
            };

            if needs_fetch {
                self.acquire(job, kind).await;
            }
        }
    }

    /// Revoke every held handle (engine shutdown).
    pub async fn revoke_all(&self) {
        let mut state = self.state.lock().await;
        for (key, handle) in state.held.drain() {
            handle.revoke();
            self.bus.publish(DashboardEvent::ArtifactRevoked {
                job_id: key.0,
                kind: key.1,
            });
        }
    }

    /// Fetch the narration script as decoded text.
    pub async fn resolve_script(&self, job_id: &JobId) -> Result<String, ApiError> {
        self.client
            .fetch_artifact_text(job_id, ArtifactKind::Script)
            .await
    }

    /// Fetch the rendered frame listing as one file name per line.
    pub async fn resolve_frames(&self, job_id: &JobId) -> Result<Vec<String>, ApiError> {
        let body = self
            .client
            .fetch_artifact_text(job_id, ArtifactKind::Frames)
            .await?;
        Ok(body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    // ---- private helpers ----

    /// Fetch one binary artifact and install its handle.
    ///
    /// Failure leaves the handle absent and publishes an inline
    /// "not available" event instead of erroring to the caller.
    async fn acquire(&self, job: &Job, kind: ArtifactKind) {
        let bytes = match self.client.fetch_artifact_bytes(&job.id, kind).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(job_id = %job.id, kind = %kind, error = %e, "Artifact fetch failed");
                self.bus.publish(DashboardEvent::ArtifactUnavailable {
                    job_id: job.id.clone(),
                    kind,
                });
                return;
            }
        };

        let handle = match self.write_handle(job, kind, &bytes) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(job_id = %job.id, kind = %kind, error = %e, "Failed to cache artifact");
                self.bus.publish(DashboardEvent::ArtifactUnavailable {
                    job_id: job.id.clone(),
                    kind,
                });
                return;
            }
        };

        let mut state = self.state.lock().await;
        if state.owner.as_ref() != Some(&job.id) {
            // Deselected while the fetch was in flight.
            handle.revoke();
            return;
        }
        let key = (job.id.clone(), kind);
        if let Some(previous) = state.held.remove(&key) {
            previous.revoke();
            self.bus.publish(DashboardEvent::ArtifactRevoked {
                job_id: key.0.clone(),
                kind,
            });
        }
        state.held.insert(key, handle);
        self.bus.publish(DashboardEvent::ArtifactReady {
            job_id: job.id.clone(),
            kind,
        });
        tracing::info!(job_id = %job.id, kind = %kind, size = bytes.len(), "Artifact ready");
    }

    fn write_handle(
        &self,
        job: &Job,
        kind: ArtifactKind,
        bytes: &[u8],
    ) -> std::io::Result<ArtifactHandle> {
        let mut file = tempfile::NamedTempFile::new_in(self.cache_dir.path())?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(ArtifactHandle {
            job_id: job.id.clone(),
            kind,
            file,
        })
    }
}
