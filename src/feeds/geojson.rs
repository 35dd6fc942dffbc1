// src/feeds/geojson.rs
//! Minimal GeoJSON envelope shared by the point/polygon providers.
//! Properties stay an opaque bag: each provider's `normalize` picks the
//! fields it understands and keeps the rest as `Update::raw`.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Default)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Property bag, empty if the feature carried none.
    pub fn props(&self) -> Map<String, Value> {
        self.properties.clone().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// Representative `(lon, lat)` for any geometry.
    ///
    /// Non-point geometries reduce to the arithmetic mean of all constituent
    /// vertices. That is a deliberate cheap approximation, not a true
    /// polygon centroid — ranking depends on it, so it must stay as-is.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.kind == "Point" {
            if let Some((lon, lat)) = coord_pair(&self.coordinates) {
                return Some((lon, lat));
            }
        }
        let mut pts = Vec::new();
        flatten_lonlats(&self.coordinates, &mut pts);
        if pts.is_empty() {
            return None;
        }
        let n = pts.len() as f64;
        let (sx, sy) = pts
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        Some((sx / n, sy / n))
    }
}

fn coord_pair(v: &Value) -> Option<(f64, f64)> {
    let arr = v.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    Some((arr[0].as_f64()?, arr[1].as_f64()?))
}

/// Collect `(lon, lat)` pairs from arbitrarily nested coordinate arrays.
fn flatten_lonlats(v: &Value, out: &mut Vec<(f64, f64)>) {
    let Some(arr) = v.as_array() else { return };
    if let Some(pair) = coord_pair(v) {
        // A leaf like [lon, lat, ...]: both heads are numbers.
        if arr[0].is_number() && arr[1].is_number() {
            out.push(pair);
            return;
        }
    }
    for inner in arr {
        flatten_lonlats(inner, out);
    }
}
