use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::response::json_error;
use crate::services::analytics;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let Some(db) = state.database() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "analytics store temporarily unavailable",
        )
        .into_response();
    };

    match analytics::get_snapshot(&db, &user_id).await {
        Ok(snapshot) => Json(SuccessResponse {
            success: true,
            data: snapshot,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, user_id, "snapshot query failed");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "analytics store temporarily unavailable",
            )
            .into_response()
        }
    }
}
