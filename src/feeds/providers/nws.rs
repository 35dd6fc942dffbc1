// src/feeds/providers/nws.rs
//! NWS active weather alerts. Alert polygons reduce to their vertex-mean
//! centroid; severity is copied verbatim with "Unknown" as the default, and
//! the timestamp prefers effective, then onset, then sent time.

use async_trait::async_trait;

use crate::error::FeedError;
use crate::feeds::geojson::FeatureCollection;
use crate::feeds::providers::{first_prop_str, prop_str};
use crate::feeds::{client, record_normalize_counts, FeedAdapter, Normalized};
use crate::update::{now_iso, Kind, Update};

const ALERTS_ACTIVE_URL: &str = "https://api.weather.gov/alerts/active";
const PROVIDER: &str = "nws";

pub struct WeatherAlertAdapter {
    client: reqwest::Client,
    url: String,
}

impl WeatherAlertAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: ALERTS_ACTIVE_URL.to_string(),
        }
    }

    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedAdapter for WeatherAlertAdapter {
    async fn fetch_updates(&self) -> Result<Normalized, FeedError> {
        let fc: FeatureCollection =
            client::get_json(&self.client, &self.url, "application/geo+json")
                .await
                .map_err(|e| FeedError::new(PROVIDER, e))?;
        Ok(normalize(fc))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Pure normalization. Many active alerts carry a null geometry (zone-coded
/// alerts); those have no resolvable point and are dropped.
pub fn normalize(fc: FeatureCollection) -> Normalized {
    let mut updates = Vec::with_capacity(fc.features.len());
    let mut dropped = 0usize;

    for f in &fc.features {
        let Some((lon, lat)) = f.geometry.as_ref().and_then(|g| g.centroid()) else {
            dropped += 1;
            continue;
        };
        let props = f.props();

        let title = prop_str(&props, "event").unwrap_or("NWS Alert").to_string();
        let severity = prop_str(&props, "severity").unwrap_or("Unknown").to_string();
        let timestamp = first_prop_str(&props, &["effective", "onset", "sent"])
            .map(str::to_string)
            .unwrap_or_else(now_iso);
        let source_url = first_prop_str(&props, &["@id", "id"]).map(str::to_string);

        updates.push(Update {
            kind: Kind::WeatherAlert,
            title,
            icon: "warning".to_string(),
            timestamp: Some(timestamp),
            latitude: lat,
            longitude: lon,
            severity: Some(severity),
            source_url,
            raw: props,
            record_id: None,
        });
    }

    record_normalize_counts(PROVIDER, updates.len(), dropped);
    Normalized {
        updates,
        dropped,
        note: None,
    }
}
