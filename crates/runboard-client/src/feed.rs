// crates/runboard-client/src/feed.rs
// ============================================================================
// Module: Run Feed
// Description: Refreshable run records with loading and error state.
// Purpose: Back dashboard rendering with a consistent, observable snapshot.
// Dependencies: runboard-core, tokio
// ============================================================================

//! ## Overview
//! A [`RunFeed`] holds the last successfully fetched record array together
//! with a loading flag and the last error message. Mounting issues the
//! initial request; [`RunFeed::refresh`] issues another on demand.
//!
//! Every state change is published on a `tokio::sync::watch` channel so
//! observers can re-render.
//!
//! ## Invariants
//! - Starting a request sets `loading` and clears `error`.
//! - A failed request keeps the previous records.
//! - `loading` stays set while any request is in flight.
//! - With [`ResponseOrdering::LastIssuedWins`], a completion from a request
//!   that has been superseded leaves records and error untouched.
//! - A request whose future is dropped before completion is withdrawn: it no
//!   longer counts as in flight and no longer supersedes older requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use runboard_core::RunRecord;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::client::ClientConfig;
use crate::client::FeedError;
use crate::client::RunFeedClient;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Policy for applying completions of overlapping requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// Only the most recently issued request may update records or error.
    #[default]
    LastIssuedWins,
    /// Every completion is applied in arrival order.
    LastResponseWins,
}

/// Feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// HTTP client settings.
    pub client: ClientConfig,
    /// Overlapping request policy.
    pub ordering: ResponseOrdering,
}

impl FeedConfig {
    /// Creates a config for `base_url` with default client limits and
    /// ordering.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ClientConfig::new(base_url),
            ordering: ResponseOrdering::default(),
        }
    }
}

/// Point-in-time view of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    /// Records from the last applied successful fetch.
    pub records: Vec<RunRecord>,
    /// True while any request is in flight.
    pub loading: bool,
    /// Message from the last applied failure.
    pub error: Option<String>,
}

/// Mutable feed state guarded by the feed lock.
#[derive(Debug, Default)]
struct FeedState {
    /// Published view.
    snapshot: FeedSnapshot,
    /// Generations issued but not yet completed or withdrawn.
    outstanding: BTreeSet<u64>,
    /// Generation of the most recently issued request.
    issued: u64,
    /// Generation of the most recently applied completion.
    applied: u64,
}

impl FeedState {
    /// Returns true when a completion of `generation` may update the
    /// snapshot under `ordering`.
    fn accepts(&self, generation: u64, ordering: ResponseOrdering) -> bool {
        match ordering {
            ResponseOrdering::LastResponseWins => true,
            ResponseOrdering::LastIssuedWins => {
                generation > self.applied
                    && self.outstanding.last().is_none_or(|newest| *newest < generation)
            }
        }
    }
}

/// State shared by feed clones.
#[derive(Debug)]
struct FeedShared {
    /// Guarded state.
    state: Mutex<FeedState>,
    /// Change notifications for observers.
    changes: watch::Sender<FeedSnapshot>,
}

// ============================================================================
// SECTION: Feed
// ============================================================================

/// Refreshable, observable collection of run records.
///
/// Clones share state; a refresh through any clone is visible to all.
#[derive(Debug, Clone)]
pub struct RunFeed {
    /// API client.
    client: RunFeedClient,
    /// Overlapping request policy.
    ordering: ResponseOrdering,
    /// Shared state.
    shared: Arc<FeedShared>,
}

impl RunFeed {
    /// Creates an idle feed without issuing a request.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when the client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = RunFeedClient::new(&config.client)?;
        let (changes, _) = watch::channel(FeedSnapshot::default());
        Ok(Self {
            client,
            ordering: config.ordering,
            shared: Arc::new(FeedShared {
                state: Mutex::new(FeedState::default()),
                changes,
            }),
        })
    }

    /// Creates a feed and issues the initial request in the background.
    ///
    /// The returned feed already reports `loading`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] outside a tokio runtime and
    /// [`FeedError`] when the client cannot be built.
    pub fn mount(config: &FeedConfig) -> Result<Self, FeedError> {
        let handle = Handle::try_current()
            .map_err(|err| FeedError::Config(format!("mount requires a tokio runtime: {err}")))?;
        let feed = Self::new(config)?;
        let task = feed.clone();
        let request = task.begin();
        handle.spawn(async move {
            let result = task.client.fetch_runs().await;
            request.finish(&task, result);
        });
        Ok(feed)
    }

    /// Issues a new request and returns the snapshot after it completes.
    ///
    /// Dropping the returned future abandons the request; the feed then
    /// treats it as never issued.
    pub async fn refresh(&self) -> FeedSnapshot {
        let request = self.begin();
        let result = self.client.fetch_runs().await;
        request.finish(self, result);
        self.snapshot()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot.clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.shared.changes.subscribe()
    }

    /// Waits until no request is in flight and returns that snapshot.
    pub async fn settled(&self) -> FeedSnapshot {
        let mut receiver = self.subscribe();
        let idle = receiver.wait_for(|snapshot| !snapshot.loading).await;
        idle.map_or_else(|_| self.snapshot(), |snapshot| snapshot.clone())
    }

    /// Returns the underlying API client.
    #[must_use]
    pub const fn client(&self) -> &RunFeedClient {
        &self.client
    }

    /// Marks a request as started and returns its in-flight token.
    fn begin(&self) -> InflightRequest {
        let mut state = self.lock();
        state.issued = state.issued.saturating_add(1);
        let generation = state.issued;
        state.outstanding.insert(generation);
        state.snapshot.loading = true;
        state.snapshot.error = None;
        self.publish(&state);
        InflightRequest {
            shared: Arc::clone(&self.shared),
            generation,
            finished: false,
        }
    }

    /// Applies a completed request according to the ordering policy.
    fn complete(&self, generation: u64, result: Result<Vec<Value>, FeedError>) {
        let mut state = self.lock();
        state.outstanding.remove(&generation);
        state.snapshot.loading = !state.outstanding.is_empty();
        if state.accepts(generation, self.ordering) {
            state.applied = state.applied.max(generation);
            match result {
                Ok(documents) => {
                    state.snapshot.records =
                        documents.into_iter().map(RunRecord::from_document).collect();
                    state.snapshot.error = None;
                }
                Err(err) => state.snapshot.error = Some(err.to_string()),
            }
        }
        self.publish(&state);
    }

    /// Publishes the snapshot held by `state`.
    fn publish(&self, state: &FeedState) {
        self.shared.publish(state);
    }

    /// Locks the feed state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.shared.lock()
    }
}

impl FeedShared {
    /// Locks the feed state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the snapshot held by `state`.
    fn publish(&self, state: &FeedState) {
        self.changes.send_replace(state.snapshot.clone());
    }

    /// Removes an abandoned request from the outstanding set.
    fn withdraw(&self, generation: u64) {
        let mut state = self.lock();
        if state.outstanding.remove(&generation) {
            state.snapshot.loading = !state.outstanding.is_empty();
            self.publish(&state);
        }
    }
}

// ============================================================================
// SECTION: In-flight Token
// ============================================================================

/// Token for one issued request.
///
/// Dropping the token without [`InflightRequest::finish`] withdraws the
/// request.
#[derive(Debug)]
struct InflightRequest {
    /// State of the issuing feed.
    shared: Arc<FeedShared>,
    /// Generation assigned at issue time.
    generation: u64,
    /// Set once the completion has been applied.
    finished: bool,
}

impl InflightRequest {
    /// Applies `result` to `feed` and disarms the token.
    fn finish(mut self, feed: &RunFeed, result: Result<Vec<Value>, FeedError>) {
        self.finished = true;
        feed.complete(self.generation, result);
    }
}

impl Drop for InflightRequest {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.withdraw(self.generation);
        }
    }
}
