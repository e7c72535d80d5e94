use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::events::{ActivityType, Difficulty};
use crate::response::json_error;
use crate::services::activity::{self, ActivityInput, QuizAttemptInput};
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordActivityRequest {
    user_id: String,
    #[serde(default)]
    subject_id: Option<String>,
    activity_type: ActivityType,
    duration_seconds: i64,
    #[serde(default)]
    xp_earned: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuizAttemptRequest {
    user_id: String,
    subject_id: String,
    difficulty: Difficulty,
    quiz_type: String,
    score: f64,
    #[serde(default)]
    time_spent_seconds: i64,
}

pub async fn record_activity(
    State(state): State<AppState>,
    Json(request): Json<RecordActivityRequest>,
) -> Response {
    let Some(db) = state.database() else {
        return service_unavailable();
    };

    let input = ActivityInput {
        user_id: request.user_id,
        subject_id: request.subject_id,
        activity_type: request.activity_type,
        duration_seconds: request.duration_seconds,
        xp_earned: request.xp_earned,
    };

    match activity::record_activity(&db, &state.recommender(), input).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(SuccessResponse {
                success: true,
                data: outcome,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "record activity failed");
            service_unavailable()
        }
    }
}

pub async fn record_quiz_attempt(
    State(state): State<AppState>,
    Json(request): Json<RecordQuizAttemptRequest>,
) -> Response {
    let Some(db) = state.database() else {
        return service_unavailable();
    };

    let input = QuizAttemptInput {
        user_id: request.user_id,
        subject_id: request.subject_id,
        difficulty: request.difficulty,
        quiz_type: request.quiz_type,
        score: request.score,
        time_spent_seconds: request.time_spent_seconds,
    };

    match activity::record_quiz_attempt(&db, &state.recommender(), input).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(SuccessResponse {
                success: true,
                data: outcome,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "record quiz attempt failed");
            service_unavailable()
        }
    }
}

fn service_unavailable() -> Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE",
        "analytics store temporarily unavailable",
    )
    .into_response()
}
