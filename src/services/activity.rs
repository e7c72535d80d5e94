use chrono::{Duration, Utc};
use serde::Serialize;

use crate::db::operations::events::{
    self, ActivityType, Difficulty, NewQuizAttempt, NewStudySession,
};
use crate::db::operations::metrics::PerformanceMetric;
use crate::db::operations::streaks::LearningStreak;
use crate::db::Database;
use crate::services::recommendation::RecommendationAssembler;
use crate::services::{performance, streak};

#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub user_id: String,
    pub subject_id: Option<String>,
    pub activity_type: ActivityType,
    pub duration_seconds: i64,
    pub xp_earned: i64,
}

#[derive(Debug, Clone)]
pub struct QuizAttemptInput {
    pub user_id: String,
    pub subject_id: String,
    pub difficulty: Difficulty,
    pub quiz_type: String,
    pub score: f64,
    pub time_spent_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOutcome {
    pub session_id: String,
    pub streak: LearningStreak,
    pub metric: Option<PerformanceMetric>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptOutcome {
    pub attempt_id: String,
    pub streak: LearningStreak,
    pub metric: Option<PerformanceMetric>,
}

/// Persists the raw session event, then advances the streak and, for
/// subject-scoped activity, recomputes the subject metric synchronously.
pub async fn record_activity(
    db: &Database,
    recommender: &RecommendationAssembler,
    input: ActivityInput,
) -> Result<ActivityOutcome, sqlx::Error> {
    let completed_at = Utc::now();
    let started_at = completed_at - Duration::seconds(input.duration_seconds.max(0));

    let session_id = events::insert_study_session(
        db,
        &NewStudySession {
            user_id: input.user_id.clone(),
            subject_id: input.subject_id.clone(),
            activity_type: input.activity_type,
            duration_seconds: input.duration_seconds,
            xp_earned: input.xp_earned,
            started_at,
            completed_at,
        },
    )
    .await?;

    let streak = streak::record_activity(db, &input.user_id, completed_at.date_naive()).await?;

    let metric = match input.subject_id.as_deref() {
        Some(subject_id) => {
            performance::recompute(db, recommender, &input.user_id, subject_id).await?
        }
        None => None,
    };

    Ok(ActivityOutcome {
        session_id,
        streak,
        metric,
    })
}

/// Intake glue for quiz attempts produced upstream: persists the immutable
/// attempt, counts it as streak activity, and recomputes the subject metric.
pub async fn record_quiz_attempt(
    db: &Database,
    recommender: &RecommendationAssembler,
    input: QuizAttemptInput,
) -> Result<QuizAttemptOutcome, sqlx::Error> {
    let completed_at = Utc::now();

    let attempt_id = events::insert_quiz_attempt(
        db,
        &NewQuizAttempt {
            user_id: input.user_id.clone(),
            subject_id: input.subject_id.clone(),
            difficulty: input.difficulty,
            quiz_type: input.quiz_type,
            score: input.score,
            time_spent_seconds: input.time_spent_seconds,
            completed_at,
        },
    )
    .await?;

    let streak = streak::record_activity(db, &input.user_id, completed_at.date_naive()).await?;

    let metric =
        performance::recompute(db, recommender, &input.user_id, &input.subject_id).await?;

    Ok(QuizAttemptOutcome {
        attempt_id,
        streak,
        metric,
    })
}
