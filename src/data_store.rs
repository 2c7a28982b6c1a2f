//! # Data Storage Abstraction
//!
//! The `DataStore` trait is the seam between the ledger and a document store.
//! Every record is addressed by the identifier of the user who owns it; a
//! store never returns one user's documents to another.
//!
//! ## Storage Model
//!
//! ```text
//! user ──┬── Animal documents (whole-record replace)
//!        └── AppSettings document (at most one)
//! ```
//!
//! ## Implementations
//!
//! - **InMemoryDataStore**: `Mutex<HashMap>` storage for tests and ephemeral runs
//! - **JsonFileDataStore**: pretty-printed JSON files in a data directory
//! - **PgDataStore**: PostgreSQL JSONB documents
//!
//! ## Usage Examples
//!
//! ```rust
//! use pet_ledger::{DataStore, InMemoryDataStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn DataStore> = Arc::new(InMemoryDataStore::new());
//! assert_eq!(Arc::strong_count(&store), 1);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;

use crate::{Animal, AnimalId, AppSettings, DataStoreError};

/// Document storage scoped by owning user.
///
/// Implementors must be safe to share across request handlers.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Lists every animal owned by `user_id`, in no particular order.
    async fn list_animals(&self, user_id: &str) -> Result<Vec<Animal>, DataStoreError>;

    /// Retrieves one animal.
    ///
    /// # Returns
    /// * `Ok(Some(Animal))` - Animal found
    /// * `Ok(None)` - No such animal for this user
    async fn get_animal(
        &self,
        user_id: &str,
        id: &AnimalId,
    ) -> Result<Option<Animal>, DataStoreError>;

    /// Stores a new animal.
    ///
    /// # Returns
    /// * `Ok(())` - Animal stored
    /// * `Err(DataStoreError::AlreadyExists)` - An animal with this id already exists
    async fn create_animal(&self, user_id: &str, animal: &Animal) -> Result<(), DataStoreError>;

    /// Replaces an existing animal document.
    ///
    /// # Returns
    /// * `Ok(true)` - Animal existed and was replaced
    /// * `Ok(false)` - No such animal for this user
    async fn update_animal(&self, user_id: &str, animal: &Animal) -> Result<bool, DataStoreError>;

    /// Removes an animal document.
    ///
    /// # Returns
    /// * `Ok(true)` - Animal existed and was removed
    /// * `Ok(false)` - No such animal for this user
    async fn delete_animal(&self, user_id: &str, id: &AnimalId) -> Result<bool, DataStoreError>;

    /// Retrieves the settings document of `user_id`, if one was ever stored.
    async fn get_settings(&self, user_id: &str) -> Result<Option<AppSettings>, DataStoreError>;

    /// Stores the settings document of `user_id`, replacing any previous one.
    async fn put_settings(
        &self,
        user_id: &str,
        settings: &AppSettings,
    ) -> Result<(), DataStoreError>;
}

/// In-memory storage protected by mutexes.
///
/// Data lives only as long as the store does.
pub struct InMemoryDataStore {
    animals: Mutex<HashMap<String, Vec<Animal>>>,
    settings: Mutex<HashMap<String, AppSettings>>,
}

impl InMemoryDataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            animals: Mutex::new(HashMap::new()),
            settings: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> DataStoreError {
    DataStoreError::Internal("Failed to acquire lock".to_string())
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn list_animals(&self, user_id: &str) -> Result<Vec<Animal>, DataStoreError> {
        let animals = self.animals.lock().map_err(poisoned)?;
        Ok(animals.get(user_id).cloned().unwrap_or_default())
    }

    async fn get_animal(
        &self,
        user_id: &str,
        id: &AnimalId,
    ) -> Result<Option<Animal>, DataStoreError> {
        let animals = self.animals.lock().map_err(poisoned)?;
        Ok(animals
            .get(user_id)
            .and_then(|list| list.iter().find(|a| a.id == *id))
            .cloned())
    }

    async fn create_animal(&self, user_id: &str, animal: &Animal) -> Result<(), DataStoreError> {
        let mut animals = self.animals.lock().map_err(poisoned)?;
        let list = animals.entry(user_id.to_string()).or_default();
        if list.iter().any(|a| a.id == animal.id) {
            return Err(DataStoreError::AlreadyExists);
        }
        list.push(animal.clone());
        Ok(())
    }

    async fn update_animal(&self, user_id: &str, animal: &Animal) -> Result<bool, DataStoreError> {
        let mut animals = self.animals.lock().map_err(poisoned)?;
        let Some(slot) = animals
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().find(|a| a.id == animal.id))
        else {
            return Ok(false);
        };
        *slot = animal.clone();
        Ok(true)
    }

    async fn delete_animal(&self, user_id: &str, id: &AnimalId) -> Result<bool, DataStoreError> {
        let mut animals = self.animals.lock().map_err(poisoned)?;
        let Some(list) = animals.get_mut(user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|a| a.id != *id);
        Ok(list.len() != before)
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<AppSettings>, DataStoreError> {
        let settings = self.settings.lock().map_err(poisoned)?;
        Ok(settings.get(user_id).cloned())
    }

    async fn put_settings(
        &self,
        user_id: &str,
        settings: &AppSettings,
    ) -> Result<(), DataStoreError> {
        let mut map = self.settings.lock().map_err(poisoned)?;
        map.insert(user_id.to_string(), settings.clone());
        Ok(())
    }
}
