// crates/runboard-client/src/client.rs
// ============================================================================
// Module: Run Feed Client
// Description: Async HTTP client for the Runboard API.
// Purpose: Fetch run documents, single runs, and footprints with size limits.
// Dependencies: reqwest, runboard-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Thin wrapper over a `reqwest` client. Redirects are not followed and
//! response bodies are read chunk by chunk up to a byte limit. Non-2xx
//! responses surface the server's `error` field when present.
//!
//! Server responses are untrusted; decoding failures are reported, never
//! papered over.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::redirect::Policy;
use runboard_core::Footprint;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum response body size accepted by the client.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Maximum error body size read from a non-2xx response.
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;
/// Error message used when a failing response carries no `error` field.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch data";
/// Collection route path segments.
const MODEL_RUNS_PATH: [&str; 2] = ["api", "model-runs"];
/// Footprint route path segments.
const FOOTPRINTS_PATH: [&str; 2] = ["api", "footprints"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Client configuration.
///
/// # Invariants
/// - `base_url` is an absolute `http` or `https` URL.
/// - `max_response_bytes` is greater than zero.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, for example `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Optional whole-request timeout; none by default.
    pub timeout: Option<Duration>,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
}

impl ClientConfig {
    /// Creates a config for `base_url` with default limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

/// Client and feed errors.
///
/// # Invariants
/// - [`FeedError::Status`] renders as the bare message so it can be shown
///   to users unchanged.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Configuration error.
    #[error("feed client config error: {0}")]
    Config(String),
    /// Network or connection error.
    #[error("feed transport error: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server `error` field, or the fallback message.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("feed decode error: {0}")]
    Decode(String),
    /// Response size exceeds limits.
    #[error("feed response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

/// Collection route payload.
#[derive(Debug, Deserialize)]
struct ModelRunsPayload {
    /// Stored documents.
    #[serde(rename = "modelRuns")]
    model_runs: Vec<Value>,
}

/// Single run route payload.
#[derive(Debug, Deserialize)]
struct ModelRunPayload {
    /// Stored document.
    #[serde(rename = "modelRun")]
    model_run: Value,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Runboard API client.
#[derive(Debug, Clone)]
pub struct RunFeedClient {
    /// HTTP client.
    client: Client,
    /// Parsed base URL.
    base_url: Url,
    /// Maximum response body size in bytes.
    max_response_bytes: usize,
}

impl RunFeedClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] when the base URL or limits are invalid
    /// and [`FeedError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, FeedError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|err| FeedError::Config(format!("invalid base url: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(FeedError::Config("base url must be http or https".to_string()));
        }
        if config.max_response_bytes == 0 {
            return Err(FeedError::Config(
                "max_response_bytes must be greater than zero".to_string(),
            ));
        }
        let mut builder = Client::builder().redirect(Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| FeedError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Fetches every document of the server's selected collection.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn fetch_runs(&self) -> Result<Vec<Value>, FeedError> {
        let url = self.endpoint(&MODEL_RUNS_PATH)?;
        let body = self.get(url).await?;
        let payload: ModelRunsPayload = decode(&body)?;
        Ok(payload.model_runs)
    }

    /// Fetches a single run, or `None` when the server reports it missing.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure, other non-2xx statuses,
    /// or an undecodable body.
    pub async fn fetch_run(&self, run_id: &str) -> Result<Option<Value>, FeedError> {
        let mut url = self.endpoint(&MODEL_RUNS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| FeedError::Config("base url cannot hold a path".to_string()))?
            .push(run_id);
        let body = match self.get(url).await {
            Ok(body) => body,
            Err(FeedError::Status {
                status, ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => return Ok(None),
            Err(err) => return Err(err),
        };
        let payload: ModelRunPayload = decode(&body)?;
        Ok(Some(payload.model_run))
    }

    /// Fetches one page of run footprints.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn fetch_footprints(
        &self,
        limit: Option<usize>,
        skip: Option<usize>,
    ) -> Result<Vec<Footprint>, FeedError> {
        let mut url = self.endpoint(&FOOTPRINTS_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(skip) = skip {
                query.append_pair("skip", &skip.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        let body = self.get(url).await?;
        decode(&body)
    }

    /// Builds an endpoint URL under the base path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FeedError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FeedError::Config("base url cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issues a GET and returns the body of a 2xx response.
    async fn get(&self, url: Url) -> Result<Vec<u8>, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FeedError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = read_response_body_with_limit(response, MAX_ERROR_BODY_BYTES).await.ok();
            return Err(status_error(status, body.as_deref()));
        }
        read_response_body_with_limit(response, self.max_response_bytes).await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a response body while enforcing a byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| FeedError::Transport(err.to_string()))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(FeedError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(FeedError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}

/// Extracts a non-empty string `error` field from a JSON body.
fn error_field(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Builds the status error for a failing response.
///
/// `body` is `None` when the error body could not be read in full.
fn status_error(status: StatusCode, body: Option<&[u8]>) -> FeedError {
    FeedError::Status {
        status: status.as_u16(),
        message: body
            .and_then(error_field)
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
    }
}

/// Decodes a JSON response body.
fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, FeedError> {
    serde_json::from_slice(body).map_err(|err| FeedError::Decode(err.to_string()))
}
