use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const INIT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "subjects" (
    "id" TEXT PRIMARY KEY,
    "name" TEXT NOT NULL,
    "createdAt" TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS "study_sessions" (
    "id" TEXT PRIMARY KEY,
    "userId" TEXT NOT NULL,
    "subjectId" TEXT,
    "activityType" TEXT NOT NULL,
    "durationSeconds" BIGINT NOT NULL,
    "xpEarned" BIGINT NOT NULL DEFAULT 0,
    "startedAt" TIMESTAMP NOT NULL,
    "completedAt" TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_study_sessions_user_completed"
    ON "study_sessions" ("userId", "completedAt");

CREATE TABLE IF NOT EXISTS "quiz_attempts" (
    "id" TEXT PRIMARY KEY,
    "userId" TEXT NOT NULL,
    "subjectId" TEXT NOT NULL,
    "difficulty" TEXT NOT NULL,
    "quizType" TEXT NOT NULL,
    "score" DOUBLE PRECISION NOT NULL,
    "timeSpentSeconds" BIGINT NOT NULL DEFAULT 0,
    "completedAt" TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_quiz_attempts_user_subject_completed"
    ON "quiz_attempts" ("userId", "subjectId", "completedAt");

CREATE TABLE IF NOT EXISTS "learning_streaks" (
    "userId" TEXT PRIMARY KEY,
    "currentStreak" INTEGER NOT NULL DEFAULT 0,
    "longestStreak" INTEGER NOT NULL DEFAULT 0,
    "lastStudyDate" DATE,
    "updatedAt" TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS "performance_metrics" (
    "userId" TEXT NOT NULL,
    "subjectId" TEXT NOT NULL,
    "averageScore" DOUBLE PRECISION NOT NULL,
    "totalQuizzes" INTEGER NOT NULL,
    "totalStudyTimeMinutes" INTEGER NOT NULL,
    "weakAreas" JSONB NOT NULL DEFAULT '[]',
    "strongAreas" JSONB NOT NULL DEFAULT '[]',
    "recommendations" JSONB NOT NULL DEFAULT '[]',
    "lastUpdated" TIMESTAMP NOT NULL DEFAULT NOW(),
    PRIMARY KEY ("userId", "subjectId")
);
"#;

pub async fn run(pool: &PgPool) -> Result<(), MigrationError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "_migrations" (
            "id" SERIAL PRIMARY KEY,
            "name" TEXT NOT NULL UNIQUE,
            "applied_at" TIMESTAMP NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let applied: Vec<String> =
        sqlx::query_scalar(r#"SELECT "name" FROM "_migrations" ORDER BY "id""#)
            .fetch_all(pool)
            .await?;

    let migrations = [("001_init_schema", INIT_SCHEMA)];

    for (name, sql) in migrations {
        if applied.iter().any(|n| n == name) {
            continue;
        }

        tracing::info!(migration = name, "applying migration");

        let mut tx = pool.begin().await?;
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query(r#"INSERT INTO "_migrations" ("name") VALUES ($1)"#)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
