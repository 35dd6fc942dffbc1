// src/store.rs
//! SQLite-backed report store. Rows are append-only: created by
//! `add_report`, never updated, removed only by `clear_all`. The connection
//! is one shared handle behind a mutex, with every query pushed onto the
//! blocking pool. Construct and inject it explicitly — there is no
//! process-wide singleton.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task;

use crate::error::StoreError;
use crate::geo::haversine_km;
use crate::update::{Kind, Update};

/// Safety cap on candidate rows pulled per radius query. The two-phase
/// filter (recency-bounded SQL, then exact haversine in-process) keeps cost
/// bounded without a spatial index.
const CANDIDATE_CAP: i64 = 2000;

/// One persisted community report. The property bag carries whatever the
/// classification layer produced at write time; the store treats it as
/// opaque JSON.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub text: String,
    pub props: Map<String, Value>,
    pub created_at: String,
}

impl StoredReport {
    /// Merged property bag in the wire shape: base fields, stored props on
    /// top, `rid`/`id` defaulted from the row id.
    pub fn properties(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::String("user_report".to_string()));
        out.insert("text".to_string(), Value::String(self.text.clone()));
        out.insert(
            "reported_at".to_string(),
            Value::String(self.created_at.clone()),
        );
        for (k, v) in &self.props {
            out.insert(k.clone(), v.clone());
        }
        let rid = Value::String(self.id.to_string());
        out.entry("rid".to_string()).or_insert_with(|| rid.clone());
        out.entry("id".to_string()).or_insert(rid);
        out
    }

    /// GeoJSON Feature in the wire shape the transport layer serves.
    pub fn to_feature(&self) -> Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [self.lon, self.lat]},
            "properties": self.properties(),
        })
    }

    /// Lazy read-time conversion to the canonical Update shape.
    pub fn to_update(&self) -> Update {
        let props = self.properties();
        let title = ["title", "text"]
            .iter()
            .find_map(|k| props.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .unwrap_or("User report")
            .to_string();
        let icon = props
            .get("icon")
            .and_then(Value::as_str)
            .unwrap_or("pin")
            .to_string();
        let severity = props
            .get("severity")
            .and_then(Value::as_str)
            .map(str::to_string);

        Update {
            kind: Kind::Report,
            title,
            icon,
            timestamp: Some(self.created_at.clone()),
            latitude: self.lat,
            longitude: self.lon,
            severity,
            source_url: None,
            raw: props,
            record_id: Some(self.id.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ReportStore {
    db: Arc<Mutex<Connection>>,
}

impl ReportStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              lat REAL NOT NULL,
              lon REAL NOT NULL,
              text TEXT NOT NULL,
              props_json TEXT,
              created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append a report with a server-assigned timestamp and return the
    /// stored row.
    pub async fn add_report(
        &self,
        lat: f64,
        lon: f64,
        text: String,
        props: Map<String, Value>,
    ) -> Result<StoredReport, StoreError> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let created_at = Utc::now().to_rfc3339();
            let props_json = Value::Object(props.clone()).to_string();
            let conn = db.lock().map_err(|_| StoreError::Poisoned)?;
            conn.execute(
                "INSERT INTO reports (lat, lon, text, props_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![lat, lon, text, props_json, created_at],
            )?;
            let id = conn.last_insert_rowid();
            Ok(StoredReport {
                id,
                lat,
                lon,
                text,
                props,
                created_at,
            })
        })
        .await?
    }

    /// Reports within `radius_km` of `(lat, lon)`, nearest first, at most
    /// `limit` (clamped to at least 1). Candidates are the most recent
    /// `CANDIDATE_CAP` rows, age-bounded when `max_age_hours` is given; the
    /// exact haversine test runs in-process.
    pub async fn find_near(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: usize,
        max_age_hours: Option<i64>,
    ) -> Result<Vec<StoredReport>, StoreError> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Poisoned)?;
            let mut rows = match max_age_hours {
                Some(hours) => {
                    let cutoff = (Utc::now() - Duration::hours(hours)).to_rfc3339();
                    let mut stmt = conn.prepare(
                        "SELECT id, lat, lon, text, props_json, created_at FROM reports \
                         WHERE datetime(created_at) >= datetime(?1) \
                         ORDER BY id DESC LIMIT ?2",
                    )?;
                    let mapped = stmt.query_map(params![cutoff, CANDIDATE_CAP], row_to_report)?;
                    mapped.collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, lat, lon, text, props_json, created_at FROM reports \
                         ORDER BY id DESC LIMIT ?1",
                    )?;
                    let mapped = stmt.query_map(params![CANDIDATE_CAP], row_to_report)?;
                    mapped.collect::<Result<Vec<_>, _>>()?
                }
            };

            let center = (lat, lon);
            let mut scored: Vec<(f64, StoredReport)> = rows
                .drain(..)
                .filter_map(|r| {
                    let d = haversine_km(center, (r.lat, r.lon));
                    (d <= radius_km).then_some((d, r))
                })
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            Ok(scored
                .into_iter()
                .take(limit.max(1))
                .map(|(_, r)| r)
                .collect())
        })
        .await?
    }

    /// Full table, most-recent-first.
    pub async fn all_reports(&self) -> Result<Vec<StoredReport>, StoreError> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Poisoned)?;
            let mut stmt = conn.prepare(
                "SELECT id, lat, lon, text, props_json, created_at FROM reports ORDER BY id DESC",
            )?;
            let mapped = stmt.query_map([], row_to_report)?;
            Ok(mapped.collect::<Result<Vec<_>, _>>()?)
        })
        .await?
    }

    /// Irreversible bulk delete.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Poisoned)?;
            conn.execute("DELETE FROM reports", [])?;
            Ok(())
        })
        .await?
    }
}

fn row_to_report(row: &Row<'_>) -> rusqlite::Result<StoredReport> {
    let props_json: Option<String> = row.get(4)?;
    // A bag that fails to parse is kept verbatim, not discarded.
    let props = match props_json.as_deref() {
        Some(s) => match serde_json::from_str::<Map<String, Value>>(s) {
            Ok(m) => m,
            Err(_) => {
                let mut m = Map::new();
                m.insert("raw_props".to_string(), Value::String(s.to_string()));
                m
            }
        },
        None => Map::new(),
    };
    Ok(StoredReport {
        id: row.get(0)?,
        lat: row.get(1)?,
        lon: row.get(2)?,
        text: row.get(3)?,
        props,
        created_at: row.get(5)?,
    })
}
