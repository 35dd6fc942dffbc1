// src/update.rs
//! The canonical normalized record every adapter and the report store
//! produce. An `Update` is an immutable value object: adapters build fresh
//! records on every aggregation call and never touch them afterwards.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance tag. Closed set; adding a provider means adding a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "report")]
    Report,
    #[serde(rename = "quake")]
    Quake,
    #[serde(rename = "weather-alert")]
    WeatherAlert,
    #[serde(rename = "hazard-event")]
    HazardEvent,
    #[serde(rename = "fire-hotspot")]
    FireHotspot,
}

/// One point-in-space event, regardless of provenance.
///
/// Invariants: `lat`/`lon` always hold a resolvable point (records without
/// one are dropped at normalization) and `title` is never empty (adapters
/// supply per-provider fallbacks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub kind: Kind,
    pub title: String,
    /// Presentational tag ("pin", "quake", "wildfire", ...).
    pub icon: String,
    /// ISO-8601 instant. `None` for malformed source records: such records
    /// never pass an age filter and sort last in unfiltered views.
    #[serde(rename = "time")]
    pub timestamp: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Free-form severity ("M4.2", "Severe", a confidence figure). No
    /// cross-provider normalization of scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(rename = "sourceUrl", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Original provider property bag, retained for debugging/display.
    pub raw: Map<String, Value>,
    /// Store-assigned id, present for store-originated reports only.
    /// Joins the record to the reaction ledger.
    #[serde(rename = "rid", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl Update {
    /// Sort key for recency ranking: the serialized timestamp, with missing
    /// timestamps treated as the empty string so they compare last under a
    /// descending sort.
    pub fn sort_key(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

/// Parse an ISO-8601-ish instant as the providers actually emit them:
/// RFC 3339 with offset, naive datetime (`T` or space separated, optional
/// fractional seconds, assumed UTC), or a bare date (UTC midnight).
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = nd.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&ndt));
    }
    None
}

/// Recency filter: the timestamp parses and lies within `max_age_hours` of
/// now. Missing or unparseable timestamps never pass.
pub fn is_recent(timestamp: Option<&str>, max_age_hours: i64) -> bool {
    let Some(ts) = timestamp else { return false };
    let Some(t) = parse_instant(ts) else {
        return false;
    };
    (Utc::now() - t).num_seconds() <= max_age_hours * 3600
}

/// Current instant serialized the way stored and feed timestamps are.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
