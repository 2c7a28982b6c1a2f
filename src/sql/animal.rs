//! Animal document operations for PostgreSQL.
//!
//! Each animal is one JSONB row in `animals`, keyed by its UUID and scoped by
//! `user_id`. The row timestamps track the row itself; the document carries
//! its own `createdAt`/`updatedAt`.

use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};

use crate::{Animal, AnimalId, DataStoreError};

/// Result type for database operations.
pub type SqlResult<T> = Result<T, DataStoreError>;

fn decode(row: &sqlx::postgres::PgRow) -> SqlResult<Animal> {
    let Json(animal) = row.try_get::<Json<Animal>, _>("document")?;
    Ok(animal)
}

/// Lists the animals of `user_id`, newest row first.
pub async fn list(tx: &mut Transaction<'_, Postgres>, user_id: &str) -> SqlResult<Vec<Animal>> {
    let rows = sqlx::query(
        r#"
        SELECT document FROM animals
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    rows.iter().map(decode).collect()
}

/// Retrieves one animal of `user_id`.
///
/// # Returns
/// * `Ok(Some(Animal))` - Animal found
/// * `Ok(None)` - No row with this id for this user
pub async fn get(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    id: &AnimalId,
) -> SqlResult<Option<Animal>> {
    let row = sqlx::query(
        r#"
        SELECT document FROM animals
        WHERE animal_id = $1 AND user_id = $2
        "#,
    )
    .bind(*id.as_uuid())
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.as_ref().map(decode).transpose()
}

/// Inserts a new animal row.
///
/// # Returns
/// * `Ok(())` - Row inserted
/// * `Err(DataStoreError::AlreadyExists)` - This user already has an animal with the id
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    animal: &Animal,
) -> SqlResult<()> {
    sqlx::query(
        r#"
        INSERT INTO animals (animal_id, user_id, document, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(*animal.id.as_uuid())
    .bind(user_id)
    .bind(Json(animal))
    .bind(animal.created_at)
    .bind(animal.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Replaces the document of an existing animal.
///
/// # Returns
/// * `Ok(true)` - Row existed and was replaced
/// * `Ok(false)` - No row with this id for this user
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    animal: &Animal,
) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE animals
        SET document = $3, updated_at = $4
        WHERE animal_id = $1 AND user_id = $2
        "#,
    )
    .bind(*animal.id.as_uuid())
    .bind(user_id)
    .bind(Json(animal))
    .bind(animal.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes an animal row.
///
/// # Returns
/// * `Ok(true)` - Row existed and was deleted
/// * `Ok(false)` - No row with this id for this user
pub async fn delete(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    id: &AnimalId,
) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM animals WHERE animal_id = $1 AND user_id = $2")
        .bind(*id.as_uuid())
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}
