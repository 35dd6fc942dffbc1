// src/error.rs
//! Error taxonomy. Per-feature failures are dropped (counted, never raised),
//! per-adapter failures are `FeedError` and absorbed at the aggregation
//! boundary; only store failures and invalid input reach the caller.

use thiserror::Error;

/// One provider's fetch or parse failed: network error, timeout, non-2xx
/// status, or a body that does not parse. Carries the provider name and the
/// underlying cause. Absorbed by the aggregator as an empty result.
#[derive(Debug, Error)]
#[error("feed '{provider}' unavailable: {source}")]
pub struct FeedError {
    pub provider: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl FeedError {
    pub fn new(provider: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self {
            provider,
            source: source.into(),
        }
    }
}

/// Report store I/O failure. Fatal for the call that hit it; propagated.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report store unavailable: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("report store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("report store lock poisoned")]
    Poisoned,
}

/// What a caller of the aggregation engine can actually see.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
