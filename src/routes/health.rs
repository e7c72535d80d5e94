use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    uptime: u64,
    timestamp: String,
}

async fn root(State(state): State<AppState>) -> Response {
    let connected = match state.database() {
        Some(db) => db.ping().await.is_ok(),
        None => false,
    };

    let response = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        database: if connected {
            "connected"
        } else {
            "disconnected"
        },
        timestamp: Utc::now().to_rfc3339(),
    };

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "alive",
        uptime: state.uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    })
    .into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let ready = match state.database() {
        Some(db) => db.ping().await.is_ok(),
        None => false,
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(serde_json::json!({ "ready": ready }))).into_response()
}
