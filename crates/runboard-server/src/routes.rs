// crates/runboard-server/src/routes.rs
// ============================================================================
// Module: API Routes
// Description: Read-only HTTP handlers over the run repository.
// Purpose: Serve run documents, single runs, and footprints as JSON.
// Dependencies: axum, runboard-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Handlers resolve the collection selection per request, run the repository
//! read on the blocking pool, and answer with either the success payload or
//! the `{ "error", "details" }` envelope. Every response is audited.
//!
//! Stored documents are passed through untouched on the run routes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use runboard_core::CollectionSelection;
use runboard_core::Footprint;
use runboard_core::RepositoryError;
use runboard_core::RunRecord;
use runboard_core::RunRepository;
use runboard_core::SharedRunRepository;
use runboard_core::footprint::DEFAULT_FOOTPRINT_LIMIT;
use runboard_core::footprint::MAX_FOOTPRINT_LIMIT;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::audit::AuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::RequestOutcome;
use crate::server::SelectionSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Health probe route.
pub const HEALTH_ROUTE: &str = "/api/health";
/// Full collection route.
pub const MODEL_RUNS_ROUTE: &str = "/api/model-runs";
/// Single run route.
pub const MODEL_RUN_ROUTE: &str = "/api/model-runs/{run_id}";
/// Footprint listing route.
pub const FOOTPRINTS_ROUTE: &str = "/api/footprints";
/// Health probe status text.
pub const HEALTH_STATUS: &str = "Runboard API is up and running!";
/// Error message for failed collection reads.
pub const FETCH_RUNS_FAILED: &str = "Failed to fetch model runs";
/// Error message for failed single-run reads.
pub const FETCH_RUN_FAILED: &str = "Failed to fetch model run";
/// Error message for failed footprint reads.
pub const FETCH_FOOTPRINTS_FAILED: &str = "Failed to fetch footprints";
/// Error message for unknown run identifiers.
pub const RUN_NOT_FOUND: &str = "Run not found";
/// Error message for rejected query strings.
pub const INVALID_QUERY: &str = "Invalid query parameters";

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Success payload of the collection route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRunsBody {
    /// Stored documents in collection order.
    #[serde(rename = "modelRuns")]
    pub model_runs: Vec<Value>,
}

/// Success payload of the single run route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRunBody {
    /// Stored document.
    #[serde(rename = "modelRun")]
    pub model_run: Value,
}

/// Error envelope for every failing route.
///
/// # Invariants
/// - `details` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable, human-readable error message.
    pub error: String,
    /// Underlying error text.
    pub details: String,
}

/// Health probe payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    /// Status text.
    pub status: String,
}

/// Query string of the footprint route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FootprintQuery {
    /// Maximum number of footprints to return.
    pub limit: Option<usize>,
    /// Number of runs to skip.
    pub skip: Option<usize>,
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for API handlers.
pub(crate) struct ServerState {
    /// Repository serving reads.
    pub(crate) repository: SharedRunRepository,
    /// Per-request collection selection.
    pub(crate) selection: SelectionSource,
    /// Audit sink for request events.
    pub(crate) audit: Arc<dyn AuditSink>,
}

/// Identity of a request being handled.
struct RequestScope {
    /// Matched route template.
    route: &'static str,
    /// Remote peer.
    peer: SocketAddr,
    /// Selection resolved for the request, when it reads the repository.
    selection: Option<CollectionSelection>,
}

/// Handler result awaiting audit.
struct Reply {
    /// Response status.
    status: StatusCode,
    /// Outcome classification.
    outcome: RequestOutcome,
    /// Number of records returned.
    record_count: Option<usize>,
    /// Error detail for the audit record.
    error: Option<String>,
    /// Rendered response.
    response: Response,
}

impl Reply {
    /// Builds a 200 reply.
    fn ok<T: Serialize>(body: &T, record_count: Option<usize>) -> Self {
        Self {
            status: StatusCode::OK,
            outcome: RequestOutcome::Ok,
            record_count,
            error: None,
            response: (StatusCode::OK, Json(body)).into_response(),
        }
    }

    /// Builds an error-envelope reply.
    fn failure(status: StatusCode, outcome: RequestOutcome, error: &str, details: String) -> Self {
        let body = ErrorBody {
            error: error.to_string(),
            details: details.clone(),
        };
        Self {
            status,
            outcome,
            record_count: None,
            error: Some(details),
            response: (status, Json(body)).into_response(),
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the API router.
pub(crate) fn build_router(state: Arc<ServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(handle_health))
        .route(MODEL_RUNS_ROUTE, get(handle_model_runs))
        .route(MODEL_RUN_ROUTE, get(handle_model_run))
        .route(FOOTPRINTS_ROUTE, get(handle_footprints))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Answers the health probe.
async fn handle_health(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let scope = RequestScope {
        route: HEALTH_ROUTE,
        peer,
        selection: None,
    };
    let body = HealthBody {
        status: HEALTH_STATUS.to_string(),
    };
    finish(&state, &scope, Reply::ok(&body, None))
}

/// Returns every document of the selected collection.
async fn handle_model_runs(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let selection = state.selection.resolve();
    let read_selection = selection.clone();
    let result =
        read_blocking(&state, move |repository| repository.fetch_all(&read_selection)).await;
    let reply = match result {
        Ok(documents) => {
            let count = documents.len();
            Reply::ok(
                &ModelRunsBody {
                    model_runs: documents,
                },
                Some(count),
            )
        }
        Err(err) => Reply::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            RequestOutcome::Error,
            FETCH_RUNS_FAILED,
            err.to_string(),
        ),
    };
    let scope = RequestScope {
        route: MODEL_RUNS_ROUTE,
        peer,
        selection: Some(selection),
    };
    finish(&state, &scope, reply)
}

/// Returns the first document with a matching `run_id`.
async fn handle_model_run(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(run_id): Path<String>,
) -> Response {
    let selection = state.selection.resolve();
    let read_selection = selection.clone();
    let lookup_id = run_id.clone();
    let result = read_blocking(&state, move |repository| {
        repository.find_by_run_id(&read_selection, &lookup_id)
    })
    .await;
    let reply = match result {
        Ok(Some(document)) => Reply::ok(
            &ModelRunBody {
                model_run: document,
            },
            Some(1),
        ),
        Ok(None) => {
            Reply::failure(StatusCode::NOT_FOUND, RequestOutcome::NotFound, RUN_NOT_FOUND, run_id)
        }
        Err(err) => Reply::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            RequestOutcome::Error,
            FETCH_RUN_FAILED,
            err.to_string(),
        ),
    };
    let scope = RequestScope {
        route: MODEL_RUN_ROUTE,
        peer,
        selection: Some(selection),
    };
    finish(&state, &scope, reply)
}

/// Returns one page of run footprints.
async fn handle_footprints(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    query: Result<Query<FootprintQuery>, QueryRejection>,
) -> Response {
    let window = query
        .map_err(|rejection| rejection.body_text())
        .and_then(|Query(query)| footprint_window(&query));
    let (skip, limit) = match window {
        Ok(window) => window,
        Err(details) => {
            let scope = RequestScope {
                route: FOOTPRINTS_ROUTE,
                peer,
                selection: None,
            };
            let reply = Reply::failure(
                StatusCode::BAD_REQUEST,
                RequestOutcome::BadRequest,
                INVALID_QUERY,
                details,
            );
            return finish(&state, &scope, reply);
        }
    };
    let selection = state.selection.resolve();
    let read_selection = selection.clone();
    let result = read_blocking(&state, move |repository| {
        let records: Vec<RunRecord> = repository
            .fetch_all(&read_selection)?
            .into_iter()
            .map(RunRecord::from_document)
            .collect();
        Ok(Footprint::page(&records, skip, limit))
    })
    .await;
    let reply = match result {
        Ok(footprints) => Reply::ok(&footprints, Some(footprints.len())),
        Err(err) => Reply::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            RequestOutcome::Error,
            FETCH_FOOTPRINTS_FAILED,
            err.to_string(),
        ),
    };
    let scope = RequestScope {
        route: FOOTPRINTS_ROUTE,
        peer,
        selection: Some(selection),
    };
    finish(&state, &scope, reply)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates footprint paging and returns `(skip, limit)`.
pub(crate) fn footprint_window(query: &FootprintQuery) -> Result<(usize, usize), String> {
    let limit = query.limit.unwrap_or(DEFAULT_FOOTPRINT_LIMIT);
    if limit == 0 || limit > MAX_FOOTPRINT_LIMIT {
        return Err(format!("limit must be between 1 and {MAX_FOOTPRINT_LIMIT}"));
    }
    Ok((query.skip.unwrap_or(0), limit))
}

/// Runs a repository read on the blocking pool.
async fn read_blocking<T, F>(state: &ServerState, read: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&SharedRunRepository) -> Result<T, RepositoryError> + Send + 'static,
{
    let repository = state.repository.clone();
    tokio::task::spawn_blocking(move || read(&repository))
        .await
        .map_err(|err| RepositoryError::Query(format!("blocking read task failed: {err}")))?
}

/// Records the audit event for a reply and returns its response.
fn finish(state: &ServerState, scope: &RequestScope, reply: Reply) -> Response {
    let event = RequestAuditEvent::new(RequestAuditEventParams {
        route: scope.route,
        peer_ip: Some(scope.peer.ip().to_string()),
        database: scope.selection.as_ref().map(|selection| selection.database.clone()),
        collection: scope.selection.as_ref().map(|selection| selection.collection.clone()),
        outcome: reply.outcome,
        status: reply.status.as_u16(),
        record_count: reply.record_count,
        error: reply.error,
    });
    state.audit.record(&event);
    reply.response
}
