// src/feeds/mod.rs
pub mod client;
pub mod geojson;
pub mod providers;

use std::sync::Arc;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::config::Settings;
use crate::error::FeedError;
use crate::update::Update;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feeds_updates_total", "Updates normalized from providers.");
        describe_counter!(
            "feeds_dropped_total",
            "Records dropped during normalization (missing geometry/coords, out of region)."
        );
        describe_counter!(
            "feeds_provider_errors_total",
            "Provider fetch/parse errors (absorbed by the aggregator)."
        );
    });
}

/// One adapter call's worth of normalized output. Drops are a deliberate
/// policy, not errors, but they stay observable here and on the counters.
#[derive(Debug, Default)]
pub struct Normalized {
    pub updates: Vec<Update>,
    pub dropped: usize,
    /// Diagnostic note for "empty but not failed" outcomes (e.g. FIRMS
    /// returned zero region-matching points from both datasets).
    pub note: Option<String>,
}

impl Normalized {
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One external provider. `fetch_updates` is a single best-effort call —
/// no retries, no backoff — bounded by the shared client's timeouts.
/// It must fail with `FeedError`, never panic.
#[async_trait::async_trait]
pub trait FeedAdapter: Send + Sync {
    async fn fetch_updates(&self) -> Result<Normalized, FeedError>;
    fn name(&self) -> &'static str;
}

/// Record `kept` / `dropped` for one provider on the shared counters.
pub(crate) fn record_normalize_counts(provider: &'static str, kept: usize, dropped: usize) {
    ensure_metrics_described();
    counter!("feeds_updates_total", "provider" => provider).increment(kept as u64);
    counter!("feeds_dropped_total", "provider" => provider).increment(dropped as u64);
}

/// The four production adapters, in stable merge order.
pub fn default_adapters(
    settings: &Settings,
    client: &reqwest::Client,
) -> Vec<Arc<dyn FeedAdapter>> {
    vec![
        Arc::new(providers::usgs::QuakeAdapter::new(client.clone())),
        Arc::new(providers::nws::WeatherAlertAdapter::new(client.clone())),
        Arc::new(providers::eonet::HazardEventAdapter::new(client.clone())),
        Arc::new(providers::firms::FireHotspotAdapter::new(
            client.clone(),
            settings.firms_map_key.clone(),
        )),
    ]
}
