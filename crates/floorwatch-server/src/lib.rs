//! HTTP KPI server for the factory-floor dashboard.
//!
//! Serves machine summaries, machine metadata and device OEE records as JSON.
//! Every query runs on the blocking pool under a per-request timeout; the
//! engine itself is synchronous and stateless.
//!
//! Failures map to a status code and a `{"error": "..."}` body:
//! - not found → 404
//! - invalid input → 400
//! - transient failure or timeout → 503
//! - a panicked query → 500

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Serialize;

use floorwatch_core::{
    EngineError, KpiEngine, Machine, MachineSummary, OeeReport, ServerConfig, TimeWindow,
};

/// Shared server state.
struct AppState {
    engine: Arc<KpiEngine>,
    request_timeout: Duration,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed request: status code plus the message sent to the client.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match err {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EngineError::TransientFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::warn!("{} {}", self.status, self.message);
        } else {
            log::debug!("{} {}", self.status, self.message);
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run an engine query on the blocking pool, bounded by the request timeout.
async fn run_query<T, F>(state: &AppState, query: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&KpiEngine) -> floorwatch_core::Result<T> + Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    let task = tokio::task::spawn_blocking(move || query(&engine));
    match tokio::time::timeout(state.request_timeout, task).await {
        Err(_) => Err(EngineError::TransientFailure(format!(
            "query timed out after {}s",
            state.request_timeout.as_secs_f64()
        ))
        .into()),
        Ok(Err(join_err)) => {
            log::error!("query task failed: {join_err}");
            Err(ApiError::internal("internal error while computing the query"))
        }
        Ok(Ok(result)) => Ok(Json(result?)),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_machine_data(
    State(state): State<Arc<AppState>>,
    Path((company_id, start_date, end_date)): Path<(String, String, String)>,
) -> ApiResult<Vec<MachineSummary>> {
    let window = TimeWindow::parse(&start_date, &end_date)?;
    run_query(&state, move |engine| {
        engine.machine_summaries(&company_id, &window)
    })
    .await
}

async fn handle_single_machine(
    State(state): State<Arc<AppState>>,
    Path(machine_id): Path<String>,
) -> ApiResult<Vec<Machine>> {
    run_query(&state, move |engine| {
        engine.machine(&machine_id).map(|m| vec![m])
    })
    .await
}

async fn handle_device_data(
    State(state): State<Arc<AppState>>,
    Path((device_id, start_date, end_date)): Path<(String, String, String)>,
) -> ApiResult<OeeReport> {
    let window = TimeWindow::parse(&start_date, &end_date)?;
    run_query(&state, move |engine| engine.device_kpis(&device_id, &window)).await
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: floorwatch_core::VERSION,
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let config = state.engine.config();
    Json(serde_json::json!({
        "name": "Floorwatch KPI Server",
        "version": floorwatch_core::VERSION,
        "diameter_policy": config.diameter_policy.to_string(),
        "live_lookback_minutes": config.live_lookback_minutes,
        "endpoints": {
            "/": "This API index",
            "/machine_data/{company_id}/{start_date}/{end_date}": {
                "method": "GET",
                "description": "Machines of a company with live status, produced length and reel count",
            },
            "/single_machine_data/{machine_id}": {
                "method": "GET",
                "description": "Metadata of one machine, as a one-element array",
            },
            "/device_data/{device_id}/{start_date}/{end_date}": {
                "method": "GET",
                "description": "OEE, availability, performance and quality of one device",
            },
            "/health": "Health check",
        },
        "date_formats": [
            "2025-03-01T06:00:00Z",
            "2025-03-01 06:00:00",
            "2025-03-01",
        ],
    }))
}

/// Build the axum router.
pub fn build_router(engine: Arc<KpiEngine>, request_timeout: Duration) -> Router {
    let state = Arc::new(AppState {
        engine,
        request_timeout,
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route(
            "/machine_data/{company_id}/{start_date}/{end_date}",
            get(handle_machine_data),
        )
        .route("/single_machine_data/{machine_id}", get(handle_single_machine))
        .route(
            "/device_data/{device_id}/{start_date}/{end_date}",
            get(handle_device_data),
        )
        .with_state(state)
}

/// Run the HTTP KPI server until the listener fails.
pub async fn run_server(engine: Arc<KpiEngine>, config: &ServerConfig) -> std::io::Result<()> {
    let app = build_router(engine, Duration::from_secs(config.request_timeout_secs));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("floorwatch server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
