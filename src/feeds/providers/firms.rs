// src/feeds/providers/firms.rs
//! NASA FIRMS fire hotspots. Tabular CSV rather than GeoJSON: rows need a
//! parseable latitude/longitude under any of several header spellings, and a
//! fixed US-region prefilter (CONUS, Alaska, Hawaii boxes) discards the
//! rest. Two datasets are tried in order; the first that yields a point
//! wins, and a double miss is an empty batch with a note, not a failure.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::FeedError;
use crate::feeds::{client, record_normalize_counts, FeedAdapter, Normalized};
use crate::update::{now_iso, Kind, Update};

const AREA_CSV_BASE: &str = "https://firms.modaps.eosdis.nasa.gov";
const DATASETS: [&str; 2] = ["VIIRS_NOAA20_NRT", "VIIRS_SNPP_NRT"];
const WINDOW_HOURS: u32 = 1;
const ROW_CAP: usize = 1500;
const PROVIDER: &str = "firms";

const LAT_HEADERS: [&str; 4] = ["latitude", "LATITUDE", "lat", "LAT"];
const LON_HEADERS: [&str; 4] = ["longitude", "LONGITUDE", "lon", "LON"];

/// Columns copied into `Update::raw` (lowercase or uppercase spellings).
const RAW_COLUMNS: [&str; 6] = [
    "acq_date",
    "acq_time",
    "instrument",
    "confidence",
    "frp",
    "daynight",
];

pub struct FireHotspotAdapter {
    client: reqwest::Client,
    base_url: String,
    map_key: Option<String>,
}

impl FireHotspotAdapter {
    pub fn new(client: reqwest::Client, map_key: Option<String>) -> Self {
        Self {
            client,
            base_url: AREA_CSV_BASE.to_string(),
            map_key,
        }
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        map_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            map_key,
        }
    }

    fn dataset_url(&self, key: &str, dataset: &str) -> String {
        format!(
            "{}/api/area/csv/{key}/{dataset}/world/{WINDOW_HOURS}",
            self.base_url
        )
    }
}

#[async_trait]
impl FeedAdapter for FireHotspotAdapter {
    async fn fetch_updates(&self) -> Result<Normalized, FeedError> {
        let Some(key) = self.map_key.as_deref() else {
            return Ok(Normalized::default().with_note("FIRMS_MAP_KEY not set"));
        };

        let mut misses = Vec::new();
        let mut all_failed = true;
        for dataset in DATASETS {
            let url = self.dataset_url(key, dataset);
            let body = match client::get_text(&self.client, &url, "text/csv").await {
                Ok(body) => body,
                Err(e) => {
                    misses.push(format!("{dataset}: {e:#}"));
                    continue;
                }
            };
            all_failed = false;

            let out = normalize(&body, dataset);
            if !out.updates.is_empty() {
                return Ok(out);
            }
            misses.push(format!("{dataset}: 0 region-matching points"));
        }

        // Both datasets unreachable is a feed failure; reachable-but-empty
        // is a valid empty batch with diagnostics.
        if all_failed {
            return Err(FeedError::new(
                PROVIDER,
                anyhow::anyhow!(misses.join(" | ")),
            ));
        }
        Ok(Normalized::default().with_note(format!("FIRMS empty. {}", misses.join(" | "))))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Fixed geographic prefilter: continental US, Alaska, Hawaii boxes.
fn in_coverage(lat: f64, lon: f64) -> bool {
    // CONUS
    if (24.5..=49.5).contains(&lat) && (-125.0..=-66.0).contains(&lon) {
        return true;
    }
    // Alaska (rough)
    if (51.0..=71.0).contains(&lat) && (-170.0..=-129.0).contains(&lon) {
        return true;
    }
    // Hawaii
    if (18.5..=22.5).contains(&lat) && (-161.0..=-154.0).contains(&lon) {
        return true;
    }
    false
}

/// Split one headered CSV body into rows of (header, value) pairs.
/// FIRMS emits plain comma-separated values with no quoting, so a straight
/// split is enough; a UTF-8 BOM on the header line is stripped.
fn parse_csv_rows(body: &str) -> Vec<Map<String, Value>> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    let mut lines = body.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();
    if headers.len() < 2 {
        return Vec::new();
    }

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Map::new();
        for (h, v) in headers.iter().zip(line.split(',')) {
            row.insert((*h).to_string(), Value::String(v.trim().to_string()));
        }
        rows.push(row);
    }
    rows
}

fn numeric_field(row: &Map<String, Value>, headers: &[&str]) -> Option<f64> {
    headers
        .iter()
        .filter_map(|h| row.get(*h))
        .filter_map(Value::as_str)
        .find_map(|s| s.parse::<f64>().ok())
}

fn string_field<'a>(row: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    row.get(name)
        .or_else(|| row.get(name.to_ascii_uppercase().as_str()))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Pure normalization of one dataset's CSV body.
pub fn normalize(body: &str, dataset: &str) -> Normalized {
    let rows = parse_csv_rows(body);
    let mut updates = Vec::new();
    let mut dropped = 0usize;

    for row in rows.into_iter().take(ROW_CAP) {
        let (Some(lat), Some(lon)) = (
            numeric_field(&row, &LAT_HEADERS),
            numeric_field(&row, &LON_HEADERS),
        ) else {
            dropped += 1;
            continue;
        };
        if !in_coverage(lat, lon) {
            dropped += 1;
            continue;
        }

        let severity = ["confidence", "brightness", "frp"]
            .iter()
            .find_map(|k| string_field(&row, k))
            .map(str::to_string);
        let timestamp = string_field(&row, "acq_date")
            .map(str::to_string)
            .unwrap_or_else(now_iso);

        let mut raw = Map::new();
        raw.insert("source".to_string(), Value::String("FIRMS".to_string()));
        raw.insert("dataset".to_string(), Value::String(dataset.to_string()));
        for col in RAW_COLUMNS {
            if let Some(v) = string_field(&row, col) {
                raw.insert(col.to_string(), Value::String(v.to_string()));
            }
        }

        updates.push(Update {
            kind: Kind::FireHotspot,
            title: "Fire hotspot".to_string(),
            icon: "fire".to_string(),
            timestamp: Some(timestamp),
            latitude: lat,
            longitude: lon,
            severity,
            source_url: None,
            raw,
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

    const HEADER: &str =
        "latitude,longitude,bright_ti4,acq_date,acq_time,instrument,confidence,frp,daynight";

    #[test]
    fn parses_rows_and_keeps_us_points() {
        let body = format!(
            "{HEADER}\n\
             37.4,-120.5,330.1,2025-08-26,1830,VIIRS,n,12.3,D\n\
             10.0,10.0,310.0,2025-08-26,1830,VIIRS,l,4.0,D\n"
        );
        let out = normalize(&body, "VIIRS_NOAA20_NRT");
        assert_eq!(out.updates.len(), 1);
        assert_eq!(out.dropped, 1); // (10, 10) is outside all three regions
        let u = &out.updates[0];
        assert_eq!(u.kind, Kind::FireHotspot);
        assert_eq!(u.title, "Fire hotspot");
        assert_eq!((u.latitude, u.longitude), (37.4, -120.5));
        assert_eq!(u.severity.as_deref(), Some("n"));
        assert_eq!(u.timestamp.as_deref(), Some("2025-08-26"));
        assert_eq!(u.raw.get("dataset").unwrap(), "VIIRS_NOAA20_NRT");
        assert_eq!(u.raw.get("frp").unwrap(), "12.3");
    }

    #[test]
    fn uppercase_headers_accepted() {
        let body = "LATITUDE,LONGITUDE,ACQ_DATE,CONFIDENCE\n61.2,-150.0,2025-08-26,h\n";
        let out = normalize(body, "VIIRS_SNPP_NRT");
        assert_eq!(out.updates.len(), 1); // Alaska box
        assert_eq!(out.updates[0].severity.as_deref(), Some("h"));
    }

    #[test]
    fn rows_missing_coordinates_dropped() {
        let body = format!("{HEADER}\n,,330.1,2025-08-26,1830,VIIRS,n,12.3,D\n");
        let out = normalize(&body, "VIIRS_NOAA20_NRT");
        assert!(out.updates.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn bom_and_garbage_body_yield_empty() {
        let out = normalize("\u{feff}latitude,longitude\n", "VIIRS_NOAA20_NRT");
        assert!(out.updates.is_empty());
        let out = normalize("service unavailable", "VIIRS_NOAA20_NRT");
        assert!(out.updates.is_empty());
    }

    #[test]
    fn row_cap_bounds_output() {
        let mut body = String::from("latitude,longitude\n");
        for _ in 0..2000 {
            body.push_str("40.0,-100.0\n");
        }
        let out = normalize(&body, "VIIRS_NOAA20_NRT");
        assert_eq!(out.updates.len(), 1500);
    }

    #[test]
    fn hawaii_box_matches() {
        let body = "latitude,longitude\n20.7,-156.3\n";
        assert_eq!(normalize(body, "VIIRS_NOAA20_NRT").updates.len(), 1);
    }

    #[tokio::test]
    async fn missing_map_key_is_empty_with_note() {
        let adapter = FireHotspotAdapter::new(reqwest::Client::new(), None);
        let out = adapter.fetch_updates().await.unwrap();
        assert!(out.updates.is_empty());
        assert!(out.note.as_deref().unwrap().contains("FIRMS_MAP_KEY"));
    }
}
