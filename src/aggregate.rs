// src/aggregate.rs
//! The aggregation engine: fans out to the report store and every feed
//! adapter, converts everything to canonical Updates, applies the uniform
//! recency/radius filters, ranks by recency and truncates.
//!
//! Failure contract: adapter failures are absorbed (warn + counter + empty
//! batch) and only shrink the result; the call itself fails only on invalid
//! input or a store I/O error.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::feeds::{ensure_metrics_described, FeedAdapter};
use crate::geo::haversine_km;
use crate::store::ReportStore;
use crate::update::{is_recent, Update};

const MILES_TO_KM: f64 = 1.609344;

#[derive(Debug, Serialize)]
pub struct UpdatesResponse {
    pub count: usize,
    pub updates: Vec<Update>,
}

pub struct Aggregator {
    store: ReportStore,
    adapters: Vec<Arc<dyn FeedAdapter>>,
}

impl Aggregator {
    /// Owned resources in, injected at startup.
    pub fn new(store: ReportStore, adapters: Vec<Arc<dyn FeedAdapter>>) -> Self {
        Self { store, adapters }
    }

    /// Local view: center + radius (miles) + max age + limit.
    pub async fn local_updates(
        &self,
        lat: f64,
        lon: f64,
        radius_miles: f64,
        max_age_hours: i64,
        limit: usize,
    ) -> Result<UpdatesResponse, Error> {
        validate_center(lat, lon)?;
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "radius_miles must be positive, got {radius_miles}"
            )));
        }
        validate_age(max_age_hours)?;
        let limit = limit.max(1);
        let radius_km = radius_miles * MILES_TO_KM;

        let reports = self
            .store
            .find_near(lat, lon, radius_km, limit, Some(max_age_hours))
            .await?;
        let mut updates: Vec<Update> = reports.iter().map(|r| r.to_update()).collect();
        updates.extend(self.gather_feeds().await);

        // Uniform filter over every update, store-originated included: the
        // store pre-filtered its own rows, but feed records see radius and
        // age here for the first time.
        updates.retain(|u| {
            is_recent(u.timestamp.as_deref(), max_age_hours)
                && haversine_km((lat, lon), (u.latitude, u.longitude)) <= radius_km
        });

        Ok(rank_and_truncate(updates, limit))
    }

    /// Global view: no geographic filter; the store contributes its entire
    /// history and the age filter only applies when requested.
    pub async fn global_updates(
        &self,
        limit: usize,
        max_age_hours: Option<i64>,
    ) -> Result<UpdatesResponse, Error> {
        if let Some(hours) = max_age_hours {
            validate_age(hours)?;
        }
        let limit = limit.max(1);

        let reports = self.store.all_reports().await?;
        let mut updates: Vec<Update> = reports.iter().map(|r| r.to_update()).collect();
        updates.extend(self.gather_feeds().await);

        if let Some(hours) = max_age_hours {
            updates.retain(|u| is_recent(u.timestamp.as_deref(), hours));
        }

        Ok(rank_and_truncate(updates, limit))
    }

    /// Fetch every adapter concurrently; the join resolves once each has
    /// returned or failed, so wall clock is bounded by the slowest single
    /// adapter timeout. Dropping the returned future cancels the in-flight
    /// requests.
    async fn gather_feeds(&self) -> Vec<Update> {
        ensure_metrics_described();
        let fetches = self.adapters.iter().map(|a| {
            let adapter = Arc::clone(a);
            async move { (adapter.name(), adapter.fetch_updates().await) }
        });

        let mut out = Vec::new();
        for (name, result) in join_all(fetches).await {
            match result {
                Ok(batch) => {
                    if let Some(note) = &batch.note {
                        debug!(provider = name, note, "feed returned empty batch");
                    }
                    if batch.dropped > 0 {
                        debug!(provider = name, dropped = batch.dropped, "records dropped");
                    }
                    out.extend(batch.updates);
                }
                Err(e) => {
                    warn!(provider = name, error = ?e, "feed unavailable, skipping");
                    counter!("feeds_provider_errors_total", "provider" => name).increment(1);
                }
            }
        }
        out
    }
}

/// Sort by serialized timestamp descending (missing timestamps compare as
/// empty and land last); stable, so ties keep adapter merge order. Count is
/// capped at the limit.
fn rank_and_truncate(mut updates: Vec<Update>, limit: usize) -> UpdatesResponse {
    updates.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
    updates.truncate(limit);
    UpdatesResponse {
        count: updates.len(),
        updates,
    }
}

fn validate_center(lat: f64, lon: f64) -> Result<(), Error> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidInput(format!(
            "latitude out of range: {lat}"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidInput(format!(
            "longitude out of range: {lon}"
        )));
    }
    Ok(())
}

fn validate_age(max_age_hours: i64) -> Result<(), Error> {
    if max_age_hours <= 0 {
        return Err(Error::InvalidInput(format!(
            "max_age_hours must be positive, got {max_age_hours}"
        )));
    }
    Ok(())
}
