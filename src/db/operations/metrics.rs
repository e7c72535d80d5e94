use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub user_id: String,
    pub subject_id: String,
    pub average_score: f64,
    pub total_quizzes: i32,
    pub total_study_time_minutes: i32,
    pub weak_areas: Vec<String>,
    pub strong_areas: Vec<String>,
    pub recommendations: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

pub async fn get_performance_metric(
    db: &Database,
    user_id: &str,
    subject_id: &str,
) -> Result<Option<PerformanceMetric>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT *
        FROM "performance_metrics"
        WHERE "userId" = $1 AND "subjectId" = $2
        "#,
    )
    .bind(user_id)
    .bind(subject_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(row.map(|r| map_metric(&r)))
}

pub async fn list_performance_metrics(
    db: &Database,
    user_id: &str,
) -> Result<Vec<PerformanceMetric>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT *
        FROM "performance_metrics"
        WHERE "userId" = $1
        ORDER BY "subjectId"
        "#,
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.iter().map(map_metric).collect())
}

/// Full-row replacement keyed by user+subject. The read-then-write runs in
/// one transaction with the row locked; the recompute is deterministic for a
/// given attempt set, so last-writer-wins between concurrent triggers.
pub async fn upsert_performance_metric(
    db: &Database,
    metric: &PerformanceMetric,
) -> Result<(), sqlx::Error> {
    let weak = serde_json::to_value(&metric.weak_areas).unwrap_or_default();
    let strong = serde_json::to_value(&metric.strong_areas).unwrap_or_default();
    let recommendations = serde_json::to_value(&metric.recommendations).unwrap_or_default();

    let mut tx = db.pool().begin().await?;

    let existing: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT "userId" FROM "performance_metrics"
        WHERE "userId" = $1 AND "subjectId" = $2
        FOR UPDATE
        "#,
    )
    .bind(&metric.user_id)
    .bind(&metric.subject_id)
    .fetch_optional(&mut *tx)
    .await?;

    if existing.is_some() {
        sqlx::query(
            r#"
            UPDATE "performance_metrics" SET
                "averageScore" = $3,
                "totalQuizzes" = $4,
                "totalStudyTimeMinutes" = $5,
                "weakAreas" = $6,
                "strongAreas" = $7,
                "recommendations" = $8,
                "lastUpdated" = $9
            WHERE "userId" = $1 AND "subjectId" = $2
            "#,
        )
        .bind(&metric.user_id)
        .bind(&metric.subject_id)
        .bind(metric.average_score)
        .bind(metric.total_quizzes)
        .bind(metric.total_study_time_minutes)
        .bind(&weak)
        .bind(&strong)
        .bind(&recommendations)
        .bind(metric.last_updated.naive_utc())
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO "performance_metrics"
                ("userId", "subjectId", "averageScore", "totalQuizzes", "totalStudyTimeMinutes",
                 "weakAreas", "strongAreas", "recommendations", "lastUpdated")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&metric.user_id)
        .bind(&metric.subject_id)
        .bind(metric.average_score)
        .bind(metric.total_quizzes)
        .bind(metric.total_study_time_minutes)
        .bind(&weak)
        .bind(&strong)
        .bind(&recommendations)
        .bind(metric.last_updated.naive_utc())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

fn map_metric(row: &sqlx::postgres::PgRow) -> PerformanceMetric {
    let last_updated: NaiveDateTime = row
        .try_get("lastUpdated")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    PerformanceMetric {
        user_id: row.try_get("userId").unwrap_or_default(),
        subject_id: row.try_get("subjectId").unwrap_or_default(),
        average_score: row.try_get("averageScore").unwrap_or(0.0),
        total_quizzes: row.try_get("totalQuizzes").unwrap_or(0),
        total_study_time_minutes: row.try_get("totalStudyTimeMinutes").unwrap_or(0),
        weak_areas: json_strings(row, "weakAreas"),
        strong_areas: json_strings(row, "strongAreas"),
        recommendations: json_strings(row, "recommendations"),
        last_updated: last_updated.and_utc(),
    }
}

fn json_strings(row: &sqlx::postgres::PgRow, column: &str) -> Vec<String> {
    row.try_get::<serde_json::Value, _>(column)
        .ok()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
