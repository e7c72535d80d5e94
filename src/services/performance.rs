use chrono::Utc;

use crate::db::operations::events::{self, QuizAttemptRow};
use crate::db::operations::metrics::{self, PerformanceMetric};
use crate::db::operations::subjects;
use crate::db::Database;
use crate::services::classifier;
use crate::services::recommendation::{AdviceRequest, RecommendationAssembler};

pub fn mean_score(attempts: &[QuizAttemptRow]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    attempts.iter().map(|a| a.score).sum::<f64>() / attempts.len() as f64
}

pub fn minutes_from_seconds(seconds: i64) -> i32 {
    (seconds as f64 / 60.0).round() as i32
}

/// Full recompute of the per-(user, subject) metric row from the complete
/// attempt history. Returns `None` without writing when the pair has no
/// attempts yet; metric rows only exist once at least one attempt does.
/// Safe to run redundantly: the result is a deterministic function of the
/// underlying event set.
pub async fn recompute(
    db: &Database,
    recommender: &RecommendationAssembler,
    user_id: &str,
    subject_id: &str,
) -> Result<Option<PerformanceMetric>, sqlx::Error> {
    let attempts = events::get_attempts(db, user_id, subject_id, None).await?;
    if attempts.is_empty() {
        return Ok(None);
    }

    let average_score = mean_score(&attempts);
    let total_quizzes = attempts.len() as i32;
    let study_seconds = events::total_study_seconds(db, user_id, subject_id).await?;
    let total_minutes = minutes_from_seconds(study_seconds);

    let window = classifier::recent_window(&attempts, Utc::now());
    let areas = classifier::classify(&window);

    let subject_name = subjects::get_subject_name(db, subject_id)
        .await?
        .unwrap_or_else(|| subject_id.to_string());

    let recommendations = recommender
        .assemble(&AdviceRequest {
            subject_name,
            average_score,
            total_quizzes: total_quizzes as i64,
            total_minutes: total_minutes as i64,
        })
        .await;

    let metric = PerformanceMetric {
        user_id: user_id.to_string(),
        subject_id: subject_id.to_string(),
        average_score,
        total_quizzes,
        total_study_time_minutes: total_minutes,
        weak_areas: areas.weak,
        strong_areas: areas.strong,
        recommendations,
        last_updated: Utc::now(),
    };

    metrics::upsert_performance_metric(db, &metric).await?;

    tracing::debug!(
        user_id,
        subject_id,
        average = metric.average_score,
        quizzes = metric.total_quizzes,
        "performance metric recomputed"
    );

    Ok(Some(metric))
}
