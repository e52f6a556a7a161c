//! Typed wrappers around the pipeline's job endpoints.
//!
//! One [`JobsClient`] per deployment. Every call attaches the bearer
//! token and maps non-2xx responses to [`ApiError::Api`] with the raw
//! body preserved for diagnostics.

use videssay_core::artifact::ArtifactKind;
use videssay_core::job::{Job, JobDraft, JobEdits, JobList};
use videssay_core::types::JobId;

/// HTTP client for one pipeline deployment.
#[derive(Clone)]
pub struct JobsClient {
    client: reqwest::Client,
    /// Origin without the API prefix, e.g. `http://localhost:8000`.
    base_url: String,
    /// Base plus prefix, e.g. `http://localhost:8000/api/v1`.
    api_root: String,
    token: String,
}

/// Errors from the pipeline REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The pipeline returned a non-2xx status code.
    #[error("Pipeline API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl JobsClient {
    /// Create a client for a deployment.
    ///
    /// * `base_url` - origin, e.g. `http://localhost:8000`.
    /// * `api_prefix` - path prefix the job routes are mounted under,
    ///   e.g. `/api/v1`.
    /// * `token` - bearer token attached to every job request.
    pub fn new(base_url: &str, api_prefix: &str, token: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_prefix, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across components).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        api_prefix: &str,
        token: &str,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let prefix = format!("/{}", api_prefix.trim_matches('/'));
        let api_root = format!("{base_url}{prefix}");
        Self {
            client,
            base_url,
            api_root,
            token: token.to_string(),
        }
    }

    /// Submit a new generation job.
    ///
    /// Returns the full created job, which callers can use to seed
    /// their detail state without a follow-up fetch.
    pub async fn create_job(&self, draft: &JobDraft) -> Result<Job, ApiError> {
        let response = self
            .client
            .post(format!("{}/jobs", self.api_root))
            .bearer_auth(&self.token)
            .json(draft)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List the most recent jobs in server order.
    pub async fn list_jobs(&self, limit: u32) -> Result<Vec<Job>, ApiError> {
        let response = self
            .client
            .get(format!("{}/jobs", self.api_root))
            .query(&[("limit", limit)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let list: JobList = Self::parse_response(response).await?;
        Ok(list.items)
    }

    /// Fetch one job's full detail snapshot.
    pub async fn get_job(&self, id: &JobId) -> Result<Job, ApiError> {
        let response = self
            .client
            .get(format!("{}/jobs/{id}", self.api_root))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Persist edited script / transcript / image prompts.
    ///
    /// Only set fields are transmitted; the server rejects an empty
    /// patch, which local validation catches first.
    pub async fn update_job(&self, id: &JobId, edits: &JobEdits) -> Result<Job, ApiError> {
        let response = self
            .client
            .patch(format!("{}/jobs/{id}", self.api_root))
            .bearer_auth(&self.token)
            .json(edits)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ask the pipeline to regenerate the job from the script stage.
    pub async fn trigger_rerender(&self, id: &JobId) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/jobs/{id}/rerender", self.api_root))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Queue audio synthesis, optionally with a specific voice.
    ///
    /// Returns the refreshed job so the new `queued` audio status shows
    /// immediately.
    pub async fn request_audio(&self, id: &JobId, voice: Option<&str>) -> Result<Job, ApiError> {
        let mut request = self
            .client
            .post(format!("{}/jobs/{id}/audio", self.api_root))
            .bearer_auth(&self.token);
        if let Some(voice) = voice {
            request = request.query(&[("voice", voice)]);
        }

        Self::parse_response(request.send().await?).await
    }

    /// Queue video rendering. The deployment may have the feature
    /// disabled, in which case the server answers 400.
    pub async fn request_video(&self, id: &JobId) -> Result<Job, ApiError> {
        let response = self
            .client
            .post(format!("{}/jobs/{id}/video", self.api_root))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a textual artifact (script text, frame file listing).
    pub async fn fetch_artifact_text(
        &self,
        id: &JobId,
        kind: ArtifactKind,
    ) -> Result<String, ApiError> {
        debug_assert!(!kind.is_binary(), "use fetch_artifact_bytes for {kind}");
        let response = self.fetch_artifact(id, kind).await?;
        Ok(response.text().await?)
    }

    /// Download a binary artifact (audio, video) as opaque bytes.
    pub async fn fetch_artifact_bytes(
        &self,
        id: &JobId,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.fetch_artifact(id, kind).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Probe the unauthenticated liveness endpoint at the origin root.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    async fn fetch_artifact(
        &self,
        id: &JobId,
        kind: ArtifactKind,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(job_id = %id, kind = %kind, "Fetching artifact");
        let response = self
            .client
            .get(format!("{}/jobs/{id}/artifact/{kind}", self.api_root))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::ensure_success(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] carrying
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
