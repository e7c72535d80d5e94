use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::db::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Quiz,
    Chat,
    TextbookUpload,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Quiz => "quiz",
            ActivityType::Chat => "chat",
            ActivityType::TextbookUpload => "textbook_upload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStudySession {
    pub user_id: String,
    pub subject_id: Option<String>,
    pub activity_type: ActivityType,
    pub duration_seconds: i64,
    pub xp_earned: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuizAttempt {
    pub user_id: String,
    pub subject_id: String,
    pub difficulty: Difficulty,
    pub quiz_type: String,
    pub score: f64,
    pub time_spent_seconds: i64,
    pub completed_at: DateTime<Utc>,
}

/// Attempt fields the engine computes over; raw rows stay immutable.
#[derive(Debug, Clone)]
pub struct QuizAttemptRow {
    pub difficulty: Difficulty,
    pub quiz_type: String,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionActivityRow {
    pub duration_seconds: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttemptActivityRow {
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserTotals {
    pub average_score: f64,
    pub total_quizzes: i64,
    pub total_study_seconds: i64,
    pub total_xp: i64,
}

pub async fn insert_study_session(
    db: &Database,
    record: &NewStudySession,
) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "study_sessions"
            ("id", "userId", "subjectId", "activityType", "durationSeconds", "xpEarned", "startedAt", "completedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&id)
    .bind(&record.user_id)
    .bind(&record.subject_id)
    .bind(record.activity_type.as_str())
    .bind(record.duration_seconds)
    .bind(record.xp_earned)
    .bind(record.started_at.naive_utc())
    .bind(record.completed_at.naive_utc())
    .execute(db.pool())
    .await?;

    Ok(id)
}

pub async fn insert_quiz_attempt(
    db: &Database,
    record: &NewQuizAttempt,
) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO "quiz_attempts"
            ("id", "userId", "subjectId", "difficulty", "quizType", "score", "timeSpentSeconds", "completedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&id)
    .bind(&record.user_id)
    .bind(&record.subject_id)
    .bind(record.difficulty.as_str())
    .bind(&record.quiz_type)
    .bind(record.score)
    .bind(record.time_spent_seconds)
    .bind(record.completed_at.naive_utc())
    .execute(db.pool())
    .await?;

    Ok(id)
}

/// Attempts for one user+subject, newest first. `since` bounds the window
/// when given; history is otherwise unbounded.
pub async fn get_attempts(
    db: &Database,
    user_id: &str,
    subject_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<QuizAttemptRow>, sqlx::Error> {
    let rows = if let Some(since) = since {
        sqlx::query(
            r#"
            SELECT "difficulty", "quizType", "score", "completedAt"
            FROM "quiz_attempts"
            WHERE "userId" = $1 AND "subjectId" = $2 AND "completedAt" >= $3
            ORDER BY "completedAt" DESC
            "#,
        )
        .bind(user_id)
        .bind(subject_id)
        .bind(since.naive_utc())
        .fetch_all(db.pool())
        .await?
    } else {
        sqlx::query(
            r#"
            SELECT "difficulty", "quizType", "score", "completedAt"
            FROM "quiz_attempts"
            WHERE "userId" = $1 AND "subjectId" = $2
            ORDER BY "completedAt" DESC
            "#,
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_all(db.pool())
        .await?
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let completed_at: NaiveDateTime = row
                .try_get("completedAt")
                .unwrap_or_else(|_| Utc::now().naive_utc());
            QuizAttemptRow {
                difficulty: Difficulty::from_db(
                    &row.try_get::<String, _>("difficulty").unwrap_or_default(),
                ),
                quiz_type: row.try_get("quizType").unwrap_or_default(),
                score: row.try_get("score").unwrap_or(0.0),
                completed_at: completed_at.and_utc(),
            }
        })
        .collect())
}

pub async fn total_study_seconds(
    db: &Database,
    user_id: &str,
    subject_id: &str,
) -> Result<i64, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT CAST(COALESCE(SUM("durationSeconds"), 0) AS BIGINT)
        FROM "study_sessions"
        WHERE "userId" = $1 AND "subjectId" = $2
        "#,
    )
    .bind(user_id)
    .bind(subject_id)
    .fetch_one(db.pool())
    .await?;

    Ok(total)
}

pub async fn get_user_totals(db: &Database, user_id: &str) -> Result<UserTotals, sqlx::Error> {
    let quiz_row = sqlx::query(
        r#"
        SELECT COUNT(*) AS "quizzes", COALESCE(AVG("score"), 0) AS "avgScore"
        FROM "quiz_attempts"
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await?;

    let session_row = sqlx::query(
        r#"
        SELECT
            CAST(COALESCE(SUM("durationSeconds"), 0) AS BIGINT) AS "seconds",
            CAST(COALESCE(SUM("xpEarned"), 0) AS BIGINT) AS "xp"
        FROM "study_sessions"
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db.pool())
    .await?;

    Ok(UserTotals {
        average_score: quiz_row.try_get("avgScore").unwrap_or(0.0),
        total_quizzes: quiz_row.try_get("quizzes").unwrap_or(0),
        total_study_seconds: session_row.try_get("seconds").unwrap_or(0),
        total_xp: session_row.try_get("xp").unwrap_or(0),
    })
}

pub async fn get_sessions_since(
    db: &Database,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<SessionActivityRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "durationSeconds", "completedAt"
        FROM "study_sessions"
        WHERE "userId" = $1 AND "completedAt" >= $2
        "#,
    )
    .bind(user_id)
    .bind(since.naive_utc())
    .fetch_all(db.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let completed_at: NaiveDateTime = row
                .try_get("completedAt")
                .unwrap_or_else(|_| Utc::now().naive_utc());
            SessionActivityRow {
                duration_seconds: row.try_get("durationSeconds").unwrap_or(0),
                completed_at: completed_at.and_utc(),
            }
        })
        .collect())
}

pub async fn get_user_attempts_since(
    db: &Database,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<AttemptActivityRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "score", "completedAt"
        FROM "quiz_attempts"
        WHERE "userId" = $1 AND "completedAt" >= $2
        "#,
    )
    .bind(user_id)
    .bind(since.naive_utc())
    .fetch_all(db.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let completed_at: NaiveDateTime = row
                .try_get("completedAt")
                .unwrap_or_else(|_| Utc::now().naive_utc());
            AttemptActivityRow {
                score: row.try_get("score").unwrap_or(0.0),
                completed_at: completed_at.and_utc(),
            }
        })
        .collect())
}
