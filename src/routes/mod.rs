mod activity;
mod analytics;
mod health;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route("/api/activity", post(activity::record_activity))
        .route("/api/quiz-attempts", post(activity::record_quiz_attempt))
        .route(
            "/api/users/:user_id/analytics",
            get(analytics::get_snapshot),
        )
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
