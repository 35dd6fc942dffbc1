// src/config.rs
//! Env-driven settings. `.env` is honored in local/dev runs; everything has
//! a workable default so tests and demos run with no configuration at all.

use std::path::PathBuf;

/// Default radius for local views when the caller supplies none.
pub const DEFAULT_RADIUS_KM: f64 = 40.0;
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_MAX_AGE_HOURS: i64 = 48;

#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite file backing the report store.
    pub reports_db: PathBuf,
    /// NASA FIRMS map key; without it the fire-hotspot adapter returns an
    /// empty batch with a note instead of fetching.
    pub firms_map_key: Option<String>,
    pub default_radius_km: f64,
    pub default_limit: usize,
    pub max_age_hours: i64,
}

impl Settings {
    /// Resolution order for the DB path: `PULSEMAP_REPORTS_DB`, then
    /// `PULSEMAP_DATA_DIR`/reports.db, then ./data/reports.db.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let reports_db = std::env::var("PULSEMAP_REPORTS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let dir = std::env::var("PULSEMAP_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data"));
                dir.join("reports.db")
            });

        Self {
            reports_db,
            firms_map_key: std::env::var("FIRMS_MAP_KEY").ok().filter(|k| !k.is_empty()),
            default_radius_km: DEFAULT_RADIUS_KM,
            default_limit: DEFAULT_LIMIT,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reports_db: PathBuf::from("data").join("reports.db"),
            firms_map_key: None,
            default_radius_km: DEFAULT_RADIUS_KM,
            default_limit: DEFAULT_LIMIT,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
        }
    }
}
