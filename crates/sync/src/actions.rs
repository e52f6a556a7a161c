//! User-initiated mutations against the pipeline.
//!
//! Every action owns an exclusive in-flight flag: a second invocation
//! while one is running fails fast with [`ActionError::Busy`], and the
//! UI disables the corresponding control while
//! [`DashboardEngine::action_in_flight`] reports true. Success and
//! failure both publish a short human-readable notice, and every
//! successful mutation funnels back into the store through the
//! snapshot pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use videssay_client::ApiError;
use videssay_core::error::CoreError;
use videssay_core::job::{Job, JobDraft, JobEdits};
use videssay_core::stage;
use videssay_core::types::JobId;
use videssay_core::validation;

use crate::engine::DashboardEngine;
use crate::events::DashboardEvent;

/// The user actions the coordinator serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Create,
    SaveEdits,
    RequestAudio,
    RequestVideo,
    Refresh,
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UserAction::Create => "Job creation",
            UserAction::SaveEdits => "Saving edits",
            UserAction::RequestAudio => "Audio request",
            UserAction::RequestVideo => "Video request",
            UserAction::Refresh => "Refresh",
        })
    }
}

/// Errors surfaced by the action coordinator.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The action's in-flight flag is already set.
    #[error("{0} is already in progress")]
    Busy(UserAction),

    /// Local validation rejected the payload before submission.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The pipeline call failed; state is unchanged.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Partial success: the edits were persisted but the rerender
    /// trigger failed. The edit surface must not report full success.
    #[error("Edits were saved, but the rerender did not start: {0}")]
    RerenderNotStarted(#[source] ApiError),
}

/// One in-flight flag per action.
#[derive(Default)]
pub(crate) struct ActionFlags {
    create: AtomicBool,
    save: AtomicBool,
    audio: AtomicBool,
    video: AtomicBool,
    refresh: AtomicBool,
}

impl ActionFlags {
    fn slot(&self, action: UserAction) -> &AtomicBool {
        match action {
            UserAction::Create => &self.create,
            UserAction::SaveEdits => &self.save,
            UserAction::RequestAudio => &self.audio,
            UserAction::RequestVideo => &self.video,
            UserAction::Refresh => &self.refresh,
        }
    }

    fn is_set(&self, action: UserAction) -> bool {
        self.slot(action).load(Ordering::SeqCst)
    }

    /// Claim the flag, or fail if the action is already running. The
    /// returned guard clears the flag when dropped.
    fn begin(&self, action: UserAction) -> Result<FlagGuard<'_>, ActionError> {
        let slot = self.slot(action);
        if slot.swap(true, Ordering::SeqCst) {
            return Err(ActionError::Busy(action));
        }
        Ok(FlagGuard { slot })
    }
}

struct FlagGuard<'a> {
    slot: &'a AtomicBool,
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::SeqCst);
    }
}

impl DashboardEngine {
    /// Whether an action's in-flight flag is set (UI control disable).
    pub fn action_in_flight(&self, action: UserAction) -> bool {
        self.flags.is_set(action)
    }

    /// Submit a new generation job.
    ///
    /// Validates locally first, inserts the created job at the front
    /// of the list, selects it, and seeds its detail straight from the
    /// creation response -- no redundant fetch.
    pub async fn create_job(self: &Arc<Self>, draft: JobDraft) -> Result<Job, ActionError> {
        let _guard = self.flags.begin(UserAction::Create)?;

        if let Err(e) = validation::validate_draft(&draft) {
            self.bus.notify_error(e.to_string());
            return Err(e.into());
        }

        match self.client.create_job(&draft).await {
            Ok(job) => {
                tracing::info!(job_id = %job.id, topic = %job.topic, "Job created");
                self.store.insert_and_select(job.clone()).await;
                self.bus.publish(DashboardEvent::ListUpdated {
                    count: self.store.jobs().await.len(),
                });
                self.resolver.set_owner(Some(job.id.clone())).await;
                self.bus.publish(DashboardEvent::SelectionChanged {
                    job_id: Some(job.id.clone()),
                });
                self.bus.publish(DashboardEvent::JobUpdated {
                    job_id: job.id.clone(),
                });
                self.evaluate_polling().await;
                self.bus.notify_info(format!("Job \"{}\" created", job.topic));
                Ok(job)
            }
            Err(e) => {
                self.bus.notify_error(format!("Failed to create job: {e}"));
                Err(e.into())
            }
        }
    }

    /// Persist edits, then trigger a rerender.
    ///
    /// Both phases must succeed before the edit surface may close. A
    /// failed rerender after a successful save is reported distinctly
    /// as [`ActionError::RerenderNotStarted`] -- the user must learn
    /// their edits were kept but nothing is rendering. Either way a
    /// fresh detail fetch reconciles local state.
    pub async fn save_edits_and_rerender(
        self: &Arc<Self>,
        id: &JobId,
        edits: JobEdits,
    ) -> Result<(), ActionError> {
        let _guard = self.flags.begin(UserAction::SaveEdits)?;

        if let Err(e) = validation::validate_edits(&edits) {
            self.bus.notify_error(e.to_string());
            return Err(e.into());
        }

        if let Err(e) = self.client.update_job(id, &edits).await {
            self.bus.notify_error(format!("Failed to save edits: {e}"));
            return Err(e.into());
        }

        let rerender = self.client.trigger_rerender(id).await;

        let epoch = self.store.selection_epoch().await;
        self.fetch_detail(epoch, id, true).await;

        match rerender {
            Ok(()) => {
                self.bus.notify_info("Edits saved; rerender started");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Edits saved but rerender trigger failed");
                self.bus
                    .notify_error(format!("Edits were saved, but the rerender did not start: {e}"));
                Err(ActionError::RerenderNotStarted(e))
            }
        }
    }

    /// Queue audio synthesis for a job whose script is complete.
    pub async fn request_audio(
        self: &Arc<Self>,
        id: &JobId,
        voice: Option<String>,
    ) -> Result<(), ActionError> {
        let _guard = self.flags.begin(UserAction::RequestAudio)?;

        let Some(job) = self.store.find_job(id).await else {
            return Err(self.reject(format!("Unknown job {id}")));
        };
        if !stage::can_request_audio(&job) {
            return Err(self.reject("Script must be completed before audio can be requested"));
        }

        match self.client.request_audio(id, voice.as_deref()).await {
            Ok(_accepted) => {
                let epoch = self.store.selection_epoch().await;
                self.fetch_detail(epoch, id, true).await;
                self.bus.notify_info("Audio synthesis requested");
                Ok(())
            }
            Err(e) => {
                self.bus.notify_error(format!("Failed to request audio: {e}"));
                Err(e.into())
            }
        }
    }

    /// Queue video rendering for a job whose audio is complete.
    pub async fn request_video(self: &Arc<Self>, id: &JobId) -> Result<(), ActionError> {
        let _guard = self.flags.begin(UserAction::RequestVideo)?;

        if !self.config.video_enabled {
            return Err(self.reject("Video rendering is disabled on this deployment"));
        }
        let Some(job) = self.store.find_job(id).await else {
            return Err(self.reject(format!("Unknown job {id}")));
        };
        if !stage::can_request_video(&job, self.config.video_enabled) {
            return Err(self.reject("Audio must be completed before video can be requested"));
        }

        match self.client.request_video(id).await {
            Ok(_accepted) => {
                let epoch = self.store.selection_epoch().await;
                self.fetch_detail(epoch, id, true).await;
                self.bus.notify_info("Video rendering requested");
                Ok(())
            }
            Err(e) => {
                self.bus.notify_error(format!("Failed to request video: {e}"));
                Err(e.into())
            }
        }
    }

    /// Manual detail re-fetch, independent of the poll loop.
    pub async fn refresh(self: &Arc<Self>, id: &JobId) -> Result<(), ActionError> {
        let _guard = self.flags.begin(UserAction::Refresh)?;

        let epoch = self.store.selection_epoch().await;
        match self.client.get_job(id).await {
            Ok(job) => {
                self.apply_snapshot(epoch, job).await;
                self.bus.notify_info("Job refreshed");
                Ok(())
            }
            Err(e) => {
                self.bus.notify_error(format!("Failed to refresh job: {e}"));
                Err(e.into())
            }
        }
    }

    /// Publish a validation notice and build the matching error.
    fn reject(&self, message: impl Into<String>) -> ActionError {
        let e = CoreError::Validation(message.into());
        self.bus.notify_error(e.to_string());
        ActionError::Invalid(e)
    }
}
