// src/feeds/providers/usgs.rs
//! USGS earthquake feed (all quakes, past hour). Point features only;
//! magnitude becomes the free-form severity, epoch-millisecond `time`
//! becomes the canonical timestamp.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::error::FeedError;
use crate::feeds::geojson::FeatureCollection;
use crate::feeds::providers::{first_prop_str, prop_str};
use crate::feeds::{client, record_normalize_counts, FeedAdapter, Normalized};
use crate::update::{now_iso, Kind, Update};

const ALL_HOUR_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson";
const PROVIDER: &str = "usgs";

pub struct QuakeAdapter {
    client: reqwest::Client,
    url: String,
}

impl QuakeAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: ALL_HOUR_URL.to_string(),
        }
    }

    /// Point the adapter at a test server.
    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedAdapter for QuakeAdapter {
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

/// Pure normalization: one Update per point feature, the rest dropped.
pub fn normalize(fc: FeatureCollection) -> Normalized {
    let mut updates = Vec::with_capacity(fc.features.len());
    let mut dropped = 0usize;

    for f in &fc.features {
        let point = f
            .geometry
            .as_ref()
            .filter(|g| g.kind == "Point")
            .and_then(|g| g.centroid());
        let Some((lon, lat)) = point else {
            dropped += 1;
            continue;
        };
        let props = f.props();

        let title = first_prop_str(&props, &["place", "title"])
            .unwrap_or("Earthquake")
            .to_string();
        let severity = props
            .get("mag")
            .and_then(Value::as_f64)
            .map(|m| format!("M{m}"));
        // Preference chain: epoch-ms `time` when numeric and convertible,
        // else the `updated` string, else now.
        let timestamp = props
            .get("time")
            .and_then(Value::as_f64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single())
            .map(|t| t.to_rfc3339())
            .or_else(|| prop_str(&props, "updated").map(str::to_string))
            .unwrap_or_else(now_iso);
        let source_url = first_prop_str(&props, &["url", "detail"]).map(str::to_string);

        updates.push(Update {
            kind: Kind::Quake,
            title,
            icon: "quake".to_string(),
            timestamp: Some(timestamp),
            latitude: lat,
            longitude: lon,
            severity,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fc(v: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn point_feature_with_epoch_millis() {
        let out = normalize(fc(json!({"features": [{
            "geometry": {"type": "Point", "coordinates": [-122.1, 37.4, 8.3]},
            "properties": {
                "place": "5 km NE of Palo Alto, CA",
                "mag": 4.2,
                "time": 1756166400000i64,
                "url": "https://earthquake.usgs.gov/eq/1"
            }
        }]})));
        assert_eq!(out.updates.len(), 1);
        let u = &out.updates[0];
        assert_eq!(u.kind, Kind::Quake);
        assert_eq!(u.title, "5 km NE of Palo Alto, CA");
        assert_eq!(u.severity.as_deref(), Some("M4.2"));
        assert_eq!(u.timestamp.as_deref(), Some("2025-08-26T00:00:00+00:00"));
        assert_eq!((u.latitude, u.longitude), (37.4, -122.1));
        assert_eq!(u.source_url.as_deref(), Some("https://earthquake.usgs.gov/eq/1"));
    }

    #[test]
    fn non_point_geometry_is_dropped() {
        let out = normalize(fc(json!({"features": [{
            "geometry": {"type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,1.0]]]},
            "properties": {"mag": 5.0}
        }]})));
        assert!(out.updates.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn fallbacks_for_missing_fields() {
        let out = normalize(fc(json!({"features": [{
            "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
            "properties": {"updated": "2025-08-25T10:00:00+00:00"}
        }]})));
        let u = &out.updates[0];
        assert_eq!(u.title, "Earthquake");
        assert!(u.severity.is_none());
        assert_eq!(u.timestamp.as_deref(), Some("2025-08-25T10:00:00+00:00"));
    }

    #[test]
    fn unconvertible_numeric_time_falls_back_to_updated() {
        // `time` is numeric but far outside the representable millisecond
        // range; the chain continues to `updated` instead of losing the
        // timestamp entirely.
        let out = normalize(fc(json!({"features": [{
            "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
            "properties": {"time": 1e30, "updated": "2025-08-25T10:00:00+00:00"}
        }]})));
        assert_eq!(
            out.updates[0].timestamp.as_deref(),
            Some("2025-08-25T10:00:00+00:00")
        );
    }

    #[test]
    fn string_time_falls_back_to_now() {
        // `time` non-numeric and no `updated`: timestamp defaults to now.
        let out = normalize(fc(json!({"features": [{
            "geometry": {"type": "Point", "coordinates": [10.0, 20.0]},
            "properties": {"time": "yesterday-ish"}
        }]})));
        assert!(out.updates[0].timestamp.is_some());
    }
}
