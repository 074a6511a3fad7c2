// crates/runboard-client/src/lib.rs
// ============================================================================
// Module: Runboard Client Library
// Description: HTTP client and observable run feed.
// Purpose: Give dashboard consumers records, loading, and error state.
// Dependencies: reqwest, runboard-core, serde, tokio
// ============================================================================

//! ## Overview
//! [`RunFeedClient`] issues the API requests. [`RunFeed`] wraps it with the
//! state a dashboard renders from: the last successful record array, a
//! loading flag, and the last error message, refreshed on demand.
//! [`DashboardView`] picks what to show from a [`FeedSnapshot`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod feed;
pub mod view;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientConfig;
pub use client::FeedError;
pub use client::RunFeedClient;
pub use feed::FeedConfig;
pub use feed::FeedSnapshot;
pub use feed::ResponseOrdering;
pub use feed::RunFeed;
pub use view::DashboardView;
