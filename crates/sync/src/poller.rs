//! Poll loop for the selected job.
//!
//! One loop at most per selection. Each handle is tagged with the
//! selection epoch it was spawned for; the engine recomputes the
//! run/stop decision from current state on every snapshot change, so
//! starting an already-running loop is a no-op and a stage flipping
//! back to active between two evaluations cannot leave the loop dead.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use videssay_core::types::JobId;

use crate::engine::DashboardEngine;

/// A running poll loop, owned by the engine.
pub(crate) struct PollerHandle {
    epoch: u64,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    /// Selection epoch this loop was spawned for.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Ask the loop to exit at its next suspension point. In-flight
    /// tick results are already epoch-guarded, so there is nothing to
    /// wait for.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Spawn the poll loop for one selection.
///
/// The first interval tick fires immediately and is skipped -- the
/// selection fetch that triggered the spawn has just run.
pub(crate) fn spawn(
    engine: Arc<DashboardEngine>,
    job_id: JobId,
    epoch: u64,
    period: Duration,
    cancel: CancellationToken,
) -> PollerHandle {
    let loop_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::debug!(job_id = %job_id, epoch, "Poll loop started");
        loop {
            tokio::select! {
                _ = loop_cancel.cancelled() => break,
                _ = ticker.tick() => {
                    engine.poll_tick(epoch, &job_id).await;
                }
            }
        }
        tracing::debug!(job_id = %job_id, epoch, "Poll loop stopped");
    });

    PollerHandle {
        epoch,
        cancel,
        task,
    }
}
