//! `videssay-client` -- REST client for the video-essay pipeline API.
//!
//! [`JobsClient`](api::JobsClient) wraps the bearer-token-authenticated
//! job endpoints (creation, listing, detail, edits, stage triggers,
//! artifact downloads) using [`reqwest`]. Transport-level retry and
//! backoff are deliberately not implemented here; callers decide when
//! to retry.

pub mod api;

pub use api::{ApiError, JobsClient};
