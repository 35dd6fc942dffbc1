// tests/providers_http.rs
//! Adapters against a real local HTTP server: happy-path fixtures,
//! non-2xx statuses and garbage bodies.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pulsemap::feeds::providers::{eonet, firms, nws, usgs};
use pulsemap::feeds::FeedAdapter;
use pulsemap::Kind;

fn client() -> reqwest::Client {
    pulsemap::feeds::client::build().unwrap()
}

/// Capture adapter logs in test output (`RUST_LOG` overrides).
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pulsemap=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[tokio::test]
async fn quake_adapter_fetches_and_normalizes() {
    let server = MockServer::start().await;
    let body = json!({"type": "FeatureCollection", "features": [{
        "geometry": {"type": "Point", "coordinates": [-122.1, 37.4, 8.0]},
        "properties": {"place": "Palo Alto, CA", "mag": 4.0, "time": 1756166400000i64}
    }]});
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter = usgs::QuakeAdapter::with_url(client(), format!("{}/quakes", server.uri()));
    let out = adapter.fetch_updates().await.unwrap();
    assert_eq!(out.updates.len(), 1);
    assert_eq!(out.updates[0].kind, Kind::Quake);
    assert_eq!(out.updates[0].severity.as_deref(), Some("M4"));
}

#[tokio::test]
async fn non_2xx_is_a_feed_error() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter =
        nws::WeatherAlertAdapter::with_url(client(), format!("{}/alerts", server.uri()));
    let err = adapter.fetch_updates().await.unwrap_err();
    assert_eq!(err.provider, "nws");
}

#[tokio::test]
async fn malformed_body_is_a_feed_error() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let adapter =
        eonet::HazardEventAdapter::with_url(client(), format!("{}/events", server.uri()));
    let err = adapter.fetch_updates().await.unwrap_err();
    assert_eq!(err.provider, "eonet");
}

#[tokio::test]
async fn firms_falls_back_to_second_dataset() {
    let server = MockServer::start().await;
    // First dataset parses but has no region-matching point.
    Mock::given(method("GET"))
        .and(path("/api/area/csv/KEY/VIIRS_NOAA20_NRT/world/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("latitude,longitude\n10.0,10.0\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/area/csv/KEY/VIIRS_SNPP_NRT/world/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("latitude,longitude,confidence\n37.0,-120.0,h\n"),
        )
        .mount(&server)
        .await;

    let adapter = firms::FireHotspotAdapter::with_base_url(
        client(),
        server.uri(),
        Some("KEY".to_string()),
    );
    let out = adapter.fetch_updates().await.unwrap();
    assert_eq!(out.updates.len(), 1);
    assert_eq!(out.updates[0].raw.get("dataset").unwrap(), "VIIRS_SNPP_NRT");
}

#[tokio::test]
async fn firms_double_miss_is_empty_with_note() {
    let server = MockServer::start().await;
    for dataset in ["VIIRS_NOAA20_NRT", "VIIRS_SNPP_NRT"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/area/csv/KEY/{dataset}/world/1")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("latitude,longitude\n10.0,10.0\n"),
            )
            .mount(&server)
            .await;
    }

    let adapter = firms::FireHotspotAdapter::with_base_url(
        client(),
        server.uri(),
        Some("KEY".to_string()),
    );
    let out = adapter.fetch_updates().await.unwrap();
    assert!(out.updates.is_empty());
    assert!(out.note.as_deref().unwrap().starts_with("FIRMS empty"));
}

#[tokio::test]
async fn nws_alert_over_http_keeps_unknown_severity_default() {
    let server = MockServer::start().await;
    let body = json!({"features": [{
        "geometry": {"type": "Point", "coordinates": [-75.0, 40.0]},
        "properties": {"event": "Flood Watch", "sent": "2025-08-26T00:00:00+00:00"}
    }]});
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let adapter =
        nws::WeatherAlertAdapter::with_url(client(), format!("{}/alerts", server.uri()));
    let out = adapter.fetch_updates().await.unwrap();
    assert_eq!(out.updates[0].severity.as_deref(), Some("Unknown"));
}
