//! PostgreSQL document storage for pet-ledger.
//!
//! This module provides transaction-scoped functions per document kind and
//! [`PgDataStore`], which runs each [`DataStore`] call in its own transaction.

use axum::async_trait;
use sqlx::PgPool;

use crate::{Animal, AnimalId, AppSettings, DataStore, DataStoreError};

/// Animal document operations.
pub mod animal;

/// Settings document operations.
pub mod settings;

/// Runs the migrations embedded from `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// The newest successfully applied migration version, or `None` when nothing
/// has been applied yet.
pub async fn latest_applied_migration(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !tracked {
        return Ok(None);
    }
    sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
}

/// A [`DataStore`] backed by PostgreSQL JSONB tables.
#[derive(Clone)]
pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    /// Wraps an existing pool. Migrations must already be applied.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, DataStoreError> {
        let pool = PgPool::connect(database_url).await?;
        migrate(&pool)
            .await
            .map_err(|e| DataStoreError::Internal(e.to_string()))?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for PgDataStore {
    async fn list_animals(&self, user_id: &str) -> Result<Vec<Animal>, DataStoreError> {
        let mut tx = self.pool.begin().await?;
        let animals = animal::list(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(animals)
    }

    async fn get_animal(
        &self,
        user_id: &str,
        id: &AnimalId,
    ) -> Result<Option<Animal>, DataStoreError> {
        let mut tx = self.pool.begin().await?;
        let found = animal::get(&mut tx, user_id, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    async fn create_animal(&self, user_id: &str, record: &Animal) -> Result<(), DataStoreError> {
        let mut tx = self.pool.begin().await?;
        animal::create(&mut tx, user_id, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_animal(&self, user_id: &str, record: &Animal) -> Result<bool, DataStoreError> {
        let mut tx = self.pool.begin().await?;
        let replaced = animal::update(&mut tx, user_id, record).await?;
        tx.commit().await?;
        Ok(replaced)
    }

    async fn delete_animal(&self, user_id: &str, id: &AnimalId) -> Result<bool, DataStoreError> {
        let mut tx = self.pool.begin().await?;
        let removed = animal::delete(&mut tx, user_id, id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<AppSettings>, DataStoreError> {
        let mut tx = self.pool.begin().await?;
        let found = settings::get(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(found)
    }

    async fn put_settings(
        &self,
        user_id: &str,
        document: &AppSettings,
    ) -> Result<(), DataStoreError> {
        let mut tx = self.pool.begin().await?;
        settings::upsert(&mut tx, user_id, document).await?;
        tx.commit().await?;
        Ok(())
    }
}
