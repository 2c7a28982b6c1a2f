//! Settings document operations for PostgreSQL.

use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};

use super::animal::SqlResult;
use crate::AppSettings;

/// Retrieves the settings document of `user_id`.
pub async fn get(tx: &mut Transaction<'_, Postgres>, user_id: &str) -> SqlResult<Option<AppSettings>> {
    let row = sqlx::query("SELECT document FROM settings WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(row) => {
            let Json(settings) = row.try_get::<Json<AppSettings>, _>("document")?;
            Ok(Some(settings))
        }
        None => Ok(None),
    }
}

/// Inserts or replaces the settings document of `user_id`.
pub async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    settings: &AppSettings,
) -> SqlResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (user_id, document, created_at, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id)
        DO UPDATE SET document = EXCLUDED.document, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id)
    .bind(Json(settings))
    .bind(settings.created_at)
    .bind(settings.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
