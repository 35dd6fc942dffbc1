// src/lib.rs
// Public library surface for the transport layer and integration tests.
//
// Wiring at startup looks like:
//   let settings = config::Settings::from_env();
//   let store = store::ReportStore::open(&settings.reports_db)?;
//   let client = feeds::client::build()?;
//   let engine = aggregate::Aggregator::new(store, feeds::default_adapters(&settings, &client));
//   let ledger = reactions::ReactionLedger::new();

pub mod aggregate;
pub mod config;
pub mod error;
pub mod feeds;
pub mod geo;
pub mod reactions;
pub mod store;
pub mod update;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregator, UpdatesResponse};
pub use crate::error::{Error, FeedError, StoreError};
pub use crate::reactions::{ReactionAction, ReactionCounts, ReactionLedger};
pub use crate::store::{ReportStore, StoredReport};
pub use crate::update::{Kind, Update};
