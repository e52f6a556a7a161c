//! The engine facade tying store, poller, resolver, and actions
//! together.
//!
//! Created once via [`DashboardEngine::start`]; the returned `Arc` is
//! cheap to clone into UI handlers. All state transitions funnel
//! through [`apply_snapshot`](DashboardEngine::apply_snapshot), which
//! re-evaluates the poll-loop decision and the artifact handles after
//! every accepted snapshot -- reactive recomputation instead of
//! edge-triggered start/stop calls scattered across handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use videssay_client::{ApiError, JobsClient};
use videssay_core::artifact::ArtifactKind;
use videssay_core::job::Job;
use videssay_core::stage;
use videssay_core::types::JobId;

use crate::actions::ActionFlags;
use crate::artifacts::ArtifactResolver;
use crate::config::DashboardConfig;
use crate::events::{DashboardEvent, EventBus};
use crate::poller::{self, PollerHandle};
use crate::store::{DetailOutcome, JobStore};

/// Client-side job-state synchronization engine.
pub struct DashboardEngine {
    pub(crate) config: DashboardConfig,
    pub(crate) client: JobsClient,
    pub(crate) store: JobStore,
    pub(crate) resolver: ArtifactResolver,
    pub(crate) bus: EventBus,
    pub(crate) flags: ActionFlags,
    poller: Mutex<Option<PollerHandle>>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

impl DashboardEngine {
    /// Build the engine from an injected configuration.
    ///
    /// Fails only if the artifact cache directory cannot be created.
    /// No network traffic happens here; call
    /// [`bootstrap`](Self::bootstrap) to load initial state.
    pub fn start(config: DashboardConfig) -> std::io::Result<Arc<Self>> {
        let client = JobsClient::new(&config.api_base_url, &config.api_prefix, &config.api_token);
        let bus = EventBus::default();
        let resolver = ArtifactResolver::new(client.clone(), bus.clone())?;

        Ok(Arc::new(Self {
            config,
            client,
            store: JobStore::default(),
            resolver,
            bus,
            flags: ActionFlags::default(),
            poller: Mutex::new(None),
            cancel: CancellationToken::new(),
        }))
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.bus.subscribe()
    }

    /// The injected configuration (feature flags, external links).
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Current job list, in server order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.store.jobs().await
    }

    /// Detail snapshot of the selected job, if any.
    pub async fn selected_job(&self) -> Option<Job> {
        self.store.selected_job().await
    }

    /// Path of the locally cached binary artifact, if its handle is
    /// currently held.
    pub async fn artifact_path(&self, job_id: &JobId, kind: ArtifactKind) -> Option<PathBuf> {
        self.resolver.handle_path(job_id, kind).await
    }

    /// Fetch the narration script text (no handle lifecycle).
    pub async fn resolve_script(&self, job_id: &JobId) -> Result<String, ApiError> {
        self.resolver.resolve_script(job_id).await
    }

    /// Fetch the rendered frame listing (no handle lifecycle).
    pub async fn resolve_frames(&self, job_id: &JobId) -> Result<Vec<String>, ApiError> {
        self.resolver.resolve_frames(job_id).await
    }

    /// Whether the poll loop is currently running.
    pub async fn polling_active(&self) -> bool {
        self.poller.lock().await.is_some()
    }

    /// Load initial state: list fetch, auto-selection of the most
    /// recent job, and its detail.
    pub async fn bootstrap(self: &Arc<Self>) {
        tracing::info!(base_url = %self.config.api_base_url, "Loading dashboard state");
        self.refresh_list(false).await;
    }

    /// Manual list refresh; never resets an existing selection.
    pub async fn refresh_jobs(self: &Arc<Self>) {
        self.refresh_list(false).await;
    }

    /// Switch the viewed job.
    ///
    /// Bumping the selection epoch first invalidates every fetch still
    /// in flight for the previous selection; the old poll loop is torn
    /// down and the previous job's artifact handles are revoked before
    /// the immediate detail fetch for the new id.
    pub async fn select_job(self: &Arc<Self>, id: &JobId) {
        if self.store.selected_id().await.as_ref() == Some(id) {
            let epoch = self.store.selection_epoch().await;
            self.fetch_detail(epoch, id, false).await;
            return;
        }

        let epoch = self.store.set_selection(id).await;
        self.stop_poller().await;
        self.resolver.set_owner(Some(id.clone())).await;
        self.bus.publish(DashboardEvent::SelectionChanged {
            job_id: Some(id.clone()),
        });
        self.fetch_detail(epoch, id, false).await;
        // Even if the fetch failed, the seeded list-entry snapshot may
        // already warrant polling.
        self.evaluate_polling().await;
    }

    /// Tear the engine down: stop the poll loop and release every
    /// artifact handle.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down dashboard engine");
        self.cancel.cancel();
        self.stop_poller().await;
        self.resolver.revoke_all().await;
    }

    // ---- internal state pipeline ----

    /// One poll tick: detail fetch plus a lightweight list refresh so
    /// sibling summaries stay current. Failures log and leave the loop
    /// running; only stabilization or selection change stops it.
    pub(crate) async fn poll_tick(self: &Arc<Self>, epoch: u64, job_id: &JobId) {
        if self.store.selection_epoch().await != epoch {
            return;
        }
        self.fetch_detail(epoch, job_id, true).await;
        self.refresh_list(true).await;
    }

    /// Fetch detail for `id` under `epoch` and apply it. `quiet`
    /// suppresses the user-facing failure notice (poll ticks log only).
    pub(crate) async fn fetch_detail(self: &Arc<Self>, epoch: u64, id: &JobId, quiet: bool) {
        match self.client.get_job(id).await {
            Ok(job) => {
                self.apply_snapshot(epoch, job).await;
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Detail fetch failed");
                if !quiet {
                    self.bus.notify_error(format!("Failed to load job: {e}"));
                }
            }
        }
    }

    /// Offer a snapshot fetched under `epoch` to the store and, when
    /// accepted for the selection, re-run the reactive consequences:
    /// artifact reconciliation and the poll-loop decision.
    pub(crate) async fn apply_snapshot(self: &Arc<Self>, epoch: u64, job: Job) -> bool {
        match self.store.apply_detail(epoch, job.clone()).await {
            DetailOutcome::Stale => {
                tracing::debug!(job_id = %job.id, epoch, "Discarding snapshot from superseded selection");
                false
            }
            DetailOutcome::ListOnly => {
                self.bus.publish(DashboardEvent::JobUpdated {
                    job_id: job.id.clone(),
                });
                true
            }
            DetailOutcome::Selected => {
                self.bus.publish(DashboardEvent::JobUpdated {
                    job_id: job.id.clone(),
                });
                self.resolver.sync_job(&job).await;
                self.evaluate_polling().await;
                true
            }
        }
    }

    /// Recompute the poll-loop decision from current state.
    ///
    /// Idempotent by construction: a loop already running for the
    /// current epoch is left alone; anything else is stopped and, if
    /// the stage model still wants polling, a fresh loop is spawned.
    pub(crate) async fn evaluate_polling(self: &Arc<Self>) {
        let (epoch, selected) = self.store.selection_state().await;
        let target = match &selected {
            Some(job) if stage::needs_polling(job) && !self.cancel.is_cancelled() => {
                Some(job.id.clone())
            }
            _ => None,
        };

        let mut guard = self.poller.lock().await;
        let already_running =
            matches!((guard.as_ref(), &target), (Some(handle), Some(_)) if handle.epoch() == epoch);
        if already_running {
            return;
        }

        if let Some(handle) = guard.take() {
            handle.stop();
        }
        if let Some(job_id) = target {
            *guard = Some(poller::spawn(
                Arc::clone(self),
                job_id,
                epoch,
                self.config.poll_interval,
                self.cancel.child_token(),
            ));
        }
    }

    /// List refresh shared by bootstrap, manual refresh, and poll
    /// ticks. `quiet` suppresses the failure notice.
    async fn refresh_list(self: &Arc<Self>, quiet: bool) {
        match self.client.list_jobs(self.config.list_limit).await {
            Ok(items) => {
                let outcome = self.store.replace_list(items).await;
                self.bus.publish(DashboardEvent::ListUpdated {
                    count: outcome.count,
                });
                if let Some((id, epoch)) = outcome.auto_selected {
                    self.resolver.set_owner(Some(id.clone())).await;
                    self.bus.publish(DashboardEvent::SelectionChanged {
                        job_id: Some(id.clone()),
                    });
                    self.fetch_detail(epoch, &id, quiet).await;
                    self.evaluate_polling().await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Job list refresh failed");
                if !quiet {
                    self.bus.notify_error(format!("Failed to refresh job list: {e}"));
                }
            }
        }
    }

    async fn stop_poller(&self) {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.stop();
        }
    }
}
