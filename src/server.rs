//! Extension bridge.
//! Small HTTP API the browser extension / userscript talks to:
//!   GET  /api/status            -> {running, calibrated, calibrating, collected}
//!   POST /api/click {column}    -> {success, message}
//!   POST /api/calibrate {}      -> {success, message}
//!   POST /api/calibrate/cancel  -> {success, message}
//!   POST /api/save | /api/load  -> {success, message}
//! CORS is wide open (`*`) so pages on any origin can reach the bridge.

use crate::controller::{Clicker, Status};
use crate::error::ClickerError;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ActionResponse {
    success: bool,
    message: String,
}

fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> Response {
    let body = ActionResponse {
        success,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn error_status(err: &ClickerError) -> StatusCode {
    match err {
        ClickerError::NotCalibrated | ClickerError::InvalidColumn(_) => StatusCode::BAD_REQUEST,
        ClickerError::NotFound(_) => StatusCode::NOT_FOUND,
        ClickerError::Parse { .. } | ClickerError::InvalidGeometry(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ClickerError::InjectionFailed(_)
        | ClickerError::ListenerUnavailable(_)
        | ClickerError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: ClickerError) -> Response {
    warn!(error = %err, "Request failed");
    reply(error_status(&err), false, err.to_string())
}

/// Parses an optional JSON body. Empty bodies count as `{}`.
fn parse_body(body: &Bytes) -> Result<Value, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|_| reply(StatusCode::BAD_REQUEST, false, "Invalid JSON"))
}

pub fn router(clicker: Clicker) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    Router::new()
        .route("/api/status", get(status))
        .route("/api/click", post(click))
        .route("/api/calibrate", post(calibrate))
        .route("/api/calibrate/cancel", post(cancel))
        .route("/api/save", post(save))
        .route("/api/load", post(load))
        .fallback(not_found)
        .with_state(clicker)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn status(State(clicker): State<Clicker>) -> Json<Status> {
    Json(clicker.status())
}

async fn click(State(clicker): State<Clicker>, body: Bytes) -> Response {
    let data = match parse_body(&body) {
        Ok(data) => data,
        Err(resp) => return resp,
    };

    // Anything but a JSON integer is an invalid column, as is a missing field.
    let column = match data.get("column") {
        Some(value) => match value.as_i64() {
            Some(column) => column,
            None => return failure(ClickerError::InvalidColumn(value.to_string())),
        },
        None => return failure(ClickerError::InvalidColumn("(missing)".into())),
    };

    // Injection blocks; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || clicker.click_column(column)).await;
    match result {
        Ok(Ok(_)) => reply(StatusCode::OK, true, format!("Clicked column {}", column + 1)),
        Ok(Err(e)) => failure(e),
        Err(e) => failure(ClickerError::InjectionFailed(format!("click task failed: {e}"))),
    }
}

async fn calibrate(State(clicker): State<Clicker>, body: Bytes) -> Response {
    if let Err(resp) = parse_body(&body) {
        return resp;
    }
    match clicker.start_calibration() {
        Ok(_) => reply(StatusCode::OK, true, "Calibration started"),
        Err(e) => failure(e),
    }
}

async fn cancel(State(clicker): State<Clicker>) -> Response {
    if clicker.cancel_calibration() {
        reply(StatusCode::OK, true, "Calibration cancelled")
    } else {
        reply(StatusCode::OK, true, "No calibration in progress")
    }
}

async fn save(State(clicker): State<Clicker>) -> Response {
    match clicker.save() {
        Ok(path) => reply(
            StatusCode::OK,
            true,
            format!("Calibration saved to {}", path.display()),
        ),
        Err(e) => failure(e),
    }
}

async fn load(State(clicker): State<Clicker>) -> Response {
    match clicker.load() {
        Ok(_) => reply(StatusCode::OK, true, "Calibration loaded successfully"),
        Err(e) => failure(e),
    }
}

async fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, false, "Endpoint not found")
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind extension bridge to {addr}"))
}

/// Serves the bridge on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    clicker: Clicker,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!("Extension bridge listening on http://{}/", listener.local_addr()?);

    axum::serve(listener, router(clicker))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Extension bridge stopped unexpectedly")?;
    info!("Extension bridge stopped");
    Ok(())
}
