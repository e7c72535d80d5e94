use std::collections::HashMap;

use sqlx::Row;

use crate::db::Database;

pub async fn get_subject_name(
    db: &Database,
    subject_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "name" FROM "subjects" WHERE "id" = $1"#)
        .bind(subject_id)
        .fetch_optional(db.pool())
        .await
}

pub async fn get_subject_names(
    db: &Database,
    subject_ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    if subject_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(r#"SELECT "id", "name" FROM "subjects" WHERE "id" = ANY($1)"#)
        .bind(subject_ids)
        .fetch_all(db.pool())
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id: String = row.try_get("id").ok()?;
            let name: String = row.try_get("name").ok()?;
            Some((id, name))
        })
        .collect())
}
