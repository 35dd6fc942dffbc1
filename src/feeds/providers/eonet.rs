// src/feeds/providers/eonet.rs
//! NASA EONET open natural-hazard events (last 7 days). Any geometry is
//! accepted and reduced to its vertex-mean centroid; the icon comes from a
//! fixed category keyword table.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FeedError;
use crate::feeds::geojson::FeatureCollection;
use crate::feeds::providers::{first_prop_str, prop_str};
use crate::feeds::{client, record_normalize_counts, FeedAdapter, Normalized};
use crate::update::{now_iso, Kind, Update};

const EVENTS_URL: &str = "https://eonet.gsfc.nasa.gov/api/v3/events/geojson?status=open&days=7";
const PROVIDER: &str = "eonet";

pub struct HazardEventAdapter {
    client: reqwest::Client,
    url: String,
}

impl HazardEventAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: EVENTS_URL.to_string(),
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
impl FeedAdapter for HazardEventAdapter {
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

/// Icon tag for a lowercased category string (substring match).
fn icon_for_category(cat: &str) -> &'static str {
    if cat.contains("wildfire") || cat.contains("fire") {
        "wildfire"
    } else if cat.contains("volcano") {
        "volcano"
    } else if cat.contains("earthquake") || cat.contains("seismic") {
        "quake"
    } else if ["storm", "cyclone", "hurricane", "typhoon"]
        .iter()
        .any(|k| cat.contains(k))
    {
        "storm"
    } else if cat.contains("flood") {
        "flood"
    } else if cat.contains("landslide") {
        "landslide"
    } else if ["ice", "snow", "blizzard"].iter().any(|k| cat.contains(k)) {
        "snow"
    } else if ["dust", "smoke", "haze"].iter().any(|k| cat.contains(k)) {
        "haze"
    } else {
        "warning"
    }
}

/// Category string: `category`, or the title of the first entry in
/// `categories`, or empty.
fn category_of(props: &serde_json::Map<String, Value>) -> String {
    if let Some(c) = prop_str(props, "category") {
        return c.to_ascii_lowercase();
    }
    props
        .get("categories")
        .and_then(Value::as_array)
        .and_then(|cats| cats.first())
        .and_then(|c| c.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Pure normalization: centroid-reduce every event; events whose geometry
/// cannot be reduced are dropped.
pub fn normalize(fc: FeatureCollection) -> Normalized {
    let mut updates = Vec::with_capacity(fc.features.len());
    let mut dropped = 0usize;

    for f in &fc.features {
        let Some((lon, lat)) = f.geometry.as_ref().and_then(|g| g.centroid()) else {
            dropped += 1;
            continue;
        };
        let props = f.props();

        let title = first_prop_str(&props, &["title", "category"])
            .unwrap_or("Event")
            .to_string();
        let icon = icon_for_category(&category_of(&props)).to_string();
        let timestamp = first_prop_str(&props, &["time", "updated"])
            .map(str::to_string)
            .unwrap_or_else(now_iso);
        let source_url = first_prop_str(&props, &["link", "url"]).map(str::to_string);

        updates.push(Update {
            kind: Kind::HazardEvent,
            title,
            icon,
            timestamp: Some(timestamp),
            latitude: lat,
            longitude: lon,
            severity: None,
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
