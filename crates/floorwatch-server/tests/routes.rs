//! Router tests: requests go through the full axum stack via `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use floorwatch_core::{
    EngineConfig, EngineError, KpiEngine, Machine, MemoryStore, Sample, TelemetryReader,
    TimeWindow,
};
use floorwatch_server::build_router;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

fn machine(uid: &str, device: &str) -> Machine {
    Machine {
        machine_uid: uid.into(),
        machine_id: device.into(),
        machine_name: format!("Annealer {uid}"),
        machine_plant: Some("South".into()),
        machine_model: None,
        machine_customer: None,
        machine_location: None,
        machine_longitude: None,
        machine_latitude: None,
        machine_type_name: "Annealer".into(),
        company_id: "acme".into(),
        parts: Vec::new(),
    }
}

fn app() -> Router {
    let mut store = MemoryStore::new();
    store.add_machine(machine("1", "dev-1"));
    store.add_machine(machine("2", "dev-2"));
    for i in 0..6 {
        store.push_sample(
            Sample::new("dev-1", t0() + chrono::Duration::seconds(30 * i))
                .with("MC_STATUS", "1")
                .with("LINE_SPEED", 100)
                .with("ACT_COLD_DIA", 10)
                .with("This Month Production", 1_000 + 25 * i),
        );
    }
    let engine = KpiEngine::from_store(store, EngineConfig::default()).unwrap();
    build_router(Arc::new(engine), Duration::from_secs(5))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ---------------------------------------------------------------------------
// Index / health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], floorwatch_core::VERSION);
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["diameter_policy"], "first");
    assert!(body["endpoints"]["/health"].is_string());
}

// ---------------------------------------------------------------------------
// Device data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_device_data_returns_kpi_record() {
    let (status, body) = get(
        app(),
        "/device_data/dev-1/2025-03-01T08:00:00Z/2025-03-01T09:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Availability"], 100.0);
    assert_eq!(body["Quality"], 100.0);
    assert!(body["Performance"].as_f64().unwrap() > 0.0);
    assert!(body["OEE"].is_number());
}

#[tokio::test]
async fn test_device_data_accepts_space_separated_dates() {
    let (status, _) = get(
        app(),
        "/device_data/dev-1/2025-03-01%2008:00:00/2025-03-01%2009:00:00",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_device_data_unknown_device_is_404() {
    let (status, body) = get(app(), "/device_data/dev-9/2025-03-01/2025-03-02").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("dev-9"));
}

#[tokio::test]
async fn test_device_data_bad_window_is_400() {
    let (status, body) = get(app(), "/device_data/dev-1/yesterday/2025-03-02").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = get(app(), "/device_data/dev-1/2025-03-02/2025-03-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_machine_data_lists_company_machines() {
    let (status, body) = get(app(), "/machine_data/acme/2025-03-01/2025-03-02").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["machine_uid"], "1");
    assert_eq!(rows[0]["produced_length"], 125);
    assert_eq!(rows[0]["produced_reels"], 0);
    // Live status is evaluated against the wall clock; the samples are long past.
    assert_eq!(rows[0]["status"], 2);
    assert_eq!(rows[1]["produced_length"], 0);
}

#[tokio::test]
async fn test_machine_data_unknown_company_is_404() {
    let (status, body) = get(app(), "/machine_data/initech/2025-03-01/2025-03-02").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_single_machine_is_one_element_array() {
    let (status, body) = get(app(), "/single_machine_data/2").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["machine_id"], "dev-2");
    assert_eq!(rows[0]["machine_name"], "Annealer 2");
}

#[tokio::test]
async fn test_single_machine_unknown_is_404() {
    let (status, _) = get(app(), "/single_machine_data/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Store failures
// ---------------------------------------------------------------------------

/// Reader whose every call behaves the same way.
enum BrokenReader {
    Unavailable,
    Slow(Duration),
    Panics,
}

impl TelemetryReader for BrokenReader {
    fn read(&self, _device_id: &str, _window: &TimeWindow) -> floorwatch_core::Result<Vec<Sample>> {
        match self {
            Self::Unavailable => Err(EngineError::TransientFailure("store offline".into())),
            Self::Slow(delay) => {
                std::thread::sleep(*delay);
                Ok(Vec::new())
            }
            Self::Panics => panic!("reader blew up"),
        }
    }

    fn latest(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> floorwatch_core::Result<Option<Sample>> {
        let window = TimeWindow::new(since, since).unwrap();
        Ok(self.read(device_id, &window)?.pop())
    }
}

fn broken_app(reader: BrokenReader, timeout: Duration) -> Router {
    let engine = KpiEngine::new(
        Arc::new(reader),
        Arc::new(MemoryStore::new()),
        EngineConfig::default(),
    )
    .unwrap();
    build_router(Arc::new(engine), timeout)
}

const DEVICE_URI: &str = "/device_data/dev-1/2025-03-01/2025-03-02";

#[tokio::test]
async fn test_unavailable_store_is_503() {
    let app = broken_app(BrokenReader::Unavailable, Duration::from_secs(5));
    let (status, body) = get(app, DEVICE_URI).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("store offline"));
}

#[tokio::test]
async fn test_slow_store_times_out_as_503() {
    let app = broken_app(
        BrokenReader::Slow(Duration::from_millis(500)),
        Duration::from_millis(50),
    );
    let (status, body) = get(app, DEVICE_URI).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_panicking_query_is_500() {
    let app = broken_app(BrokenReader::Panics, Duration::from_secs(5));
    let (status, body) = get(app, DEVICE_URI).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
