use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Row};

use crate::db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStreak {
    pub user_id: String,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_study_date: Option<NaiveDate>,
}

impl LearningStreak {
    /// Zero-streak semantics for users without a row yet.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
        }
    }
}

pub async fn get_streak(
    db: &Database,
    user_id: &str,
) -> Result<Option<LearningStreak>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "userId", "currentStreak", "longestStreak", "lastStudyDate"
        FROM "learning_streaks"
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(row.map(|r| map_streak(&r)))
}

/// Row-locked read for the streak read-modify-write. Must run inside the
/// caller's transaction so concurrent activity for the same user serializes.
pub async fn get_streak_for_update(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Option<LearningStreak>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "userId", "currentStreak", "longestStreak", "lastStudyDate"
        FROM "learning_streaks"
        WHERE "userId" = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| map_streak(&r)))
}

pub async fn upsert_streak(
    conn: &mut PgConnection,
    streak: &LearningStreak,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "learning_streaks" ("userId", "currentStreak", "longestStreak", "lastStudyDate", "updatedAt")
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT ("userId") DO UPDATE SET
            "currentStreak" = EXCLUDED."currentStreak",
            "longestStreak" = EXCLUDED."longestStreak",
            "lastStudyDate" = EXCLUDED."lastStudyDate",
            "updatedAt" = NOW()
        "#,
    )
    .bind(&streak.user_id)
    .bind(streak.current_streak)
    .bind(streak.longest_streak)
    .bind(streak.last_study_date)
    .execute(conn)
    .await?;

    Ok(())
}

fn map_streak(row: &sqlx::postgres::PgRow) -> LearningStreak {
    LearningStreak {
        user_id: row.try_get("userId").unwrap_or_default(),
        current_streak: row.try_get("currentStreak").unwrap_or(0),
        longest_streak: row.try_get("longestStreak").unwrap_or(0),
        last_study_date: row.try_get("lastStudyDate").ok(),
    }
}
