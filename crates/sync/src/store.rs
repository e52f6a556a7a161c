//! Authoritative in-memory cache of the job list and the selected
//! job's detail snapshot.
//!
//! All reads and writes other components see go through [`JobStore`].
//! Snapshots are applied wholesale -- the server's detail response
//! replaces the previous one, never a field-by-field merge -- and every
//! write is tagged with the selection epoch it was fetched under so
//! that results of a superseded selection are discarded instead of
//! clobbering the new one.

use tokio::sync::RwLock;

use videssay_core::job::Job;
use videssay_core::types::JobId;

/// What happened to a detail snapshot offered to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// The snapshot was fetched under a superseded selection and was
    /// discarded wholesale.
    Stale,
    /// The snapshot replaced the selected job (and its list entry).
    Selected,
    /// The snapshot belongs to a non-selected job; only its list entry
    /// was updated.
    ListOnly,
}

/// Result of a list replacement.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// Number of jobs in the new list.
    pub count: usize,
    /// Set when the empty selection auto-picked the first (most
    /// recent) item; carries the new selection epoch so the caller can
    /// fetch detail under the right tag.
    pub auto_selected: Option<(JobId, u64)>,
}

struct StoreState {
    /// Jobs in server order (most recent first).
    jobs: Vec<Job>,
    /// Id of the viewed job. May be set before a detail snapshot has
    /// landed.
    selected_id: Option<JobId>,
    /// Full detail snapshot of the viewed job.
    selected: Option<Job>,
    /// Bumped on every selection change; in-flight fetches carry the
    /// epoch they were issued under.
    epoch: u64,
}

/// Shared job cache. Cheap to share behind the engine's `Arc`.
pub struct JobStore {
    state: RwLock<StoreState>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(StoreState {
                jobs: Vec::new(),
                selected_id: None,
                selected: None,
                epoch: 0,
            }),
        }
    }
}

impl JobStore {
    /// Current job list, in server order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.state.read().await.jobs.clone()
    }

    /// Detail snapshot of the selected job, if any.
    pub async fn selected_job(&self) -> Option<Job> {
        self.state.read().await.selected.clone()
    }

    /// Id of the selected job, if any.
    pub async fn selected_id(&self) -> Option<JobId> {
        self.state.read().await.selected_id.clone()
    }

    /// Current selection epoch, for tagging a fetch issued now.
    pub async fn selection_epoch(&self) -> u64 {
        self.state.read().await.epoch
    }

    /// Epoch and selected snapshot read under one lock, for decisions
    /// that must see a consistent pair.
    pub async fn selection_state(&self) -> (u64, Option<Job>) {
        let state = self.state.read().await;
        (state.epoch, state.selected.clone())
    }

    /// Look up one job by id (selected detail preferred over the list
    /// entry).
    pub async fn find_job(&self, id: &JobId) -> Option<Job> {
        let state = self.state.read().await;
        if let Some(selected) = &state.selected {
            if &selected.id == id {
                return Some(selected.clone());
            }
        }
        state.jobs.iter().find(|j| &j.id == id).cloned()
    }

    /// Atomically replace the job list with a fresh server snapshot.
    ///
    /// An existing selection is never altered, even when the selected
    /// job has fallen out of the list window -- its detail keeps
    /// polling independently. An empty selection auto-picks the first
    /// item (most recent job), bumping the epoch.
    pub async fn replace_list(&self, items: Vec<Job>) -> ReplaceOutcome {
        let mut state = self.state.write().await;
        state.jobs = items;

        let auto_selected = if state.selected_id.is_none() {
            let first = state.jobs.first().cloned();
            first.map(|job| {
                state.epoch += 1;
                let id = job.id.clone();
                state.selected_id = Some(id.clone());
                state.selected = Some(job);
                (id, state.epoch)
            })
        } else {
            None
        };

        ReplaceOutcome {
            count: state.jobs.len(),
            auto_selected,
        }
    }

    /// Begin viewing a different job.
    ///
    /// Bumps the epoch so every fetch still in flight for the previous
    /// selection becomes stale. The detail is seeded from the list
    /// entry (when known) until the immediate fetch lands.
    pub async fn set_selection(&self, id: &JobId) -> u64 {
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.selected_id = Some(id.clone());
        state.selected = state.jobs.iter().find(|j| &j.id == id).cloned();
        state.epoch
    }

    /// Insert a freshly created job at the front of the list and
    /// select it, seeding detail from the creation response.
    pub async fn insert_and_select(&self, job: Job) -> u64 {
        let mut state = self.state.write().await;
        state.jobs.retain(|j| j.id != job.id);
        state.jobs.insert(0, job.clone());
        state.epoch += 1;
        state.selected_id = Some(job.id.clone());
        state.selected = Some(job);
        state.epoch
    }

    /// Offer a detail snapshot fetched under `epoch`.
    ///
    /// A stale epoch discards the snapshot entirely. A current epoch
    /// replaces the selected detail wholesale when the job is the
    /// selected one, and always refreshes the matching list entry so
    /// list and detail never disagree on status.
    pub async fn apply_detail(&self, epoch: u64, job: Job) -> DetailOutcome {
        let mut state = self.state.write().await;
        if epoch != state.epoch {
            return DetailOutcome::Stale;
        }

        if let Some(entry) = state.jobs.iter_mut().find(|j| j.id == job.id) {
            *entry = job.clone();
        }

        if state.selected_id.as_ref() == Some(&job.id) {
            state.selected = Some(job);
            DetailOutcome::Selected
        } else {
            DetailOutcome::ListOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use videssay_core::job::JobStatus;

    fn job(id: &str, status: JobStatus) -> Job {
        let now = chrono::Utc::now();
        Job {
            id: id.into(),
            topic: format!("Topic {id}"),
            style: "Documentary".into(),
            length: 180,
            status,
            script_status: status,
            audio_status: JobStatus::NotRequested,
            video_status: JobStatus::NotRequested,
            script: None,
            transcript: None,
            image_prompts: None,
            review_score: None,
            generation_time: None,
            video_url: None,
            audio_path: None,
            frames_path: None,
            youtube_context: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    #[tokio::test]
    async fn first_list_load_auto_selects_most_recent() {
        let store = JobStore::default();
        let outcome = store
            .replace_list(vec![job("b", JobStatus::Queued), job("a", JobStatus::Completed)])
            .await;

        assert_eq!(outcome.count, 2);
        let (id, epoch) = outcome.auto_selected.expect("auto-selected");
        assert_eq!(id, "b");
        assert_eq!(epoch, 1);
        assert_eq!(store.selected_id().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn list_refresh_keeps_existing_selection() {
        let store = JobStore::default();
        store.replace_list(vec![job("a", JobStatus::Queued)]).await;

        let outcome = store
            .replace_list(vec![job("c", JobStatus::Queued), job("b", JobStatus::Queued)])
            .await;

        assert!(outcome.auto_selected.is_none());
        // Selection survives even though "a" fell out of the window.
        assert_eq!(store.selected_id().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn stale_epoch_is_discarded() {
        let store = JobStore::default();
        store.replace_list(vec![job("a", JobStatus::Queued)]).await;
        let old_epoch = store.selection_epoch().await;

        let new_epoch = store.set_selection(&"a".to_string()).await;
        assert!(new_epoch > old_epoch);

        let mut stale = job("a", JobStatus::Completed);
        stale.topic = "stale".into();
        assert_eq!(
            store.apply_detail(old_epoch, stale).await,
            DetailOutcome::Stale
        );
        assert_ne!(store.selected_job().await.unwrap().topic, "stale");
    }

    #[tokio::test]
    async fn apply_detail_updates_selection_and_list_entry() {
        let store = JobStore::default();
        store.replace_list(vec![job("a", JobStatus::Queued)]).await;
        let epoch = store.selection_epoch().await;

        assert_eq!(
            store.apply_detail(epoch, job("a", JobStatus::Completed)).await,
            DetailOutcome::Selected
        );
        assert_eq!(store.selected_job().await.unwrap().status, JobStatus::Completed);
        assert_eq!(store.jobs().await[0].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn apply_detail_for_other_job_touches_list_only() {
        let store = JobStore::default();
        store
            .replace_list(vec![job("a", JobStatus::Queued), job("b", JobStatus::Queued)])
            .await;
        let epoch = store.selection_epoch().await;

        assert_eq!(
            store.apply_detail(epoch, job("b", JobStatus::Completed)).await,
            DetailOutcome::ListOnly
        );
        assert_eq!(store.selected_id().await.as_deref(), Some("a"));
        assert_eq!(store.jobs().await[1].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn insert_and_select_seeds_detail_from_response() {
        let store = JobStore::default();
        store.replace_list(vec![job("a", JobStatus::Completed)]).await;

        let epoch = store.insert_and_select(job("fresh", JobStatus::Queued)).await;

        assert_eq!(store.selection_epoch().await, epoch);
        assert_eq!(store.selected_id().await.as_deref(), Some("fresh"));
        let jobs = store.jobs().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "fresh");
    }
}
