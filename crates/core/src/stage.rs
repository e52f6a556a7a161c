//! Stage model: pure predicates over a [`Job`] snapshot.
//!
//! These functions are recomputed on every new snapshot and never
//! cached -- a stale answer would let the UI submit an action against a
//! stage that is already in flight. They decide two things: whether the
//! poller should be running, and which user actions are currently
//! allowed.

use crate::job::{Job, JobStatus};

/// Whether the poller should be active for this snapshot.
///
/// True if the overall status is `processing` or `rerendering`, or if
/// any of the three stage statuses is `processing` or `queued`. A
/// merely-queued stage counts: the server can move it to `processing`
/// without any further client action, so the client must keep watching.
pub fn needs_polling(job: &Job) -> bool {
    matches!(job.status, JobStatus::Processing | JobStatus::Rerendering)
        || [job.script_status, job.audio_status, job.video_status]
            .iter()
            .any(|s| matches!(s, JobStatus::Processing | JobStatus::Queued))
}

/// Whether the audio trigger is currently allowed.
///
/// Requires a completed script and no audio generation already in
/// flight. A `queued` audio stage does not disable the trigger -- the
/// server re-queues idempotently.
pub fn can_request_audio(job: &Job) -> bool {
    job.script_status == JobStatus::Completed && job.audio_status != JobStatus::Processing
}

/// Whether the video trigger is currently allowed.
///
/// Gated on the deployment-level video feature flag in addition to the
/// stage ordering: audio must be complete, and no render in flight.
pub fn can_request_video(job: &Job, video_feature_enabled: bool) -> bool {
    video_feature_enabled
        && job.audio_status == JobStatus::Completed
        && job.video_status != JobStatus::Processing
}

/// Whether the edit surface may open: there is nothing to edit until
/// the script stage has produced its artifacts.
pub fn can_edit_script(job: &Job) -> bool {
    job.script_status == JobStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    fn job_with(
        status: JobStatus,
        script: JobStatus,
        audio: JobStatus,
        video: JobStatus,
    ) -> Job {
        let now = chrono::Utc::now();
        Job {
            id: "j-1".into(),
            topic: "Rise of AI".into(),
            style: "Documentary".into(),
            length: 180,
            status,
            script_status: script,
            audio_status: audio,
            video_status: video,
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

    // -----------------------------------------------------------------
    // needs_polling: exhaustive status-combination table
    // -----------------------------------------------------------------

    /// Sweeps every combination of the four tracked status fields and
    /// checks the predicate against the rule stated independently:
    /// poll-worthy iff the overall status is active, or some stage is
    /// running or waiting to run.
    #[test]
    fn needs_polling_exhaustive_table() {
        for status in JobStatus::ALL {
            for script in JobStatus::ALL {
                for audio in JobStatus::ALL {
                    for video in JobStatus::ALL {
                        let overall_active =
                            status == JobStatus::Processing || status == JobStatus::Rerendering;
                        let stage_active = [script, audio, video].iter().any(|s| {
                            *s == JobStatus::Processing || *s == JobStatus::Queued
                        });
                        let expected = overall_active || stage_active;

                        let job = job_with(status, script, audio, video);
                        assert_eq!(
                            needs_polling(&job),
                            expected,
                            "status={status} script={script} audio={audio} video={video}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn fresh_job_polls_while_script_queued() {
        let job = job_with(
            JobStatus::Queued,
            JobStatus::Queued,
            JobStatus::NotRequested,
            JobStatus::NotRequested,
        );
        assert!(needs_polling(&job));
    }

    #[test]
    fn settled_job_does_not_poll() {
        let job = job_with(
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Completed,
        );
        assert!(!needs_polling(&job));

        let failed = job_with(
            JobStatus::Failed,
            JobStatus::Failed,
            JobStatus::NotRequested,
            JobStatus::NotRequested,
        );
        assert!(!needs_polling(&failed));
    }

    // -----------------------------------------------------------------
    // Action predicates
    // -----------------------------------------------------------------

    #[test]
    fn audio_requires_completed_script() {
        for script in JobStatus::ALL {
            let job = job_with(
                JobStatus::Completed,
                script,
                JobStatus::NotRequested,
                JobStatus::NotRequested,
            );
            assert_eq!(can_request_audio(&job), script == JobStatus::Completed);
        }
    }

    #[test]
    fn audio_blocked_only_while_processing() {
        for audio in JobStatus::ALL {
            let job = job_with(
                JobStatus::Completed,
                JobStatus::Completed,
                audio,
                JobStatus::NotRequested,
            );
            assert_eq!(can_request_audio(&job), audio != JobStatus::Processing);
        }
    }

    #[test]
    fn video_requires_completed_audio_and_feature_flag() {
        for audio in JobStatus::ALL {
            let job = job_with(
                JobStatus::Completed,
                JobStatus::Completed,
                audio,
                JobStatus::NotRequested,
            );
            assert_eq!(
                can_request_video(&job, true),
                audio == JobStatus::Completed
            );
            assert!(!can_request_video(&job, false));
        }
    }

    #[test]
    fn video_blocked_while_render_in_flight() {
        let job = job_with(
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Completed,
            JobStatus::Processing,
        );
        assert!(!can_request_video(&job, true));
    }

    #[test]
    fn edit_surface_gated_on_script_completion() {
        for script in JobStatus::ALL {
            let job = job_with(
                JobStatus::Processing,
                script,
                JobStatus::NotRequested,
                JobStatus::NotRequested,
            );
            assert_eq!(can_edit_script(&job), script == JobStatus::Completed);
        }
    }
}
