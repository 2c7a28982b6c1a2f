//! JSON-file document storage for development.
//!
//! Two files live in the data directory:
//!
//! ```text
//! animals.json   {"<user id>": [Animal, ...], ...}
//! settings.json  {"<user id>": AppSettings, ...}
//! ```
//!
//! Both are rewritten whole, pretty-printed, on every mutation. A missing file
//! reads as empty and the directory is created on the first write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use axum::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::{Animal, AnimalId, AppSettings, DataStore, DataStoreError};

type AnimalFile = BTreeMap<String, Vec<Animal>>;
type SettingsFile = BTreeMap<String, AppSettings>;

/// File name of the animals document inside the data directory.
pub const ANIMALS_FILE: &str = "animals.json";
/// File name of the settings document inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Stores documents as JSON files under a data directory.
pub struct JsonFileDataStore {
    data_dir: PathBuf,
    // Serializes read-modify-write cycles on the files.
    lock: Mutex<()>,
}

impl JsonFileDataStore {
    /// Creates a store rooted at `data_dir`. Nothing is touched on disk yet.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// The directory holding the JSON files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn animals_path(&self) -> PathBuf {
        self.data_dir.join(ANIMALS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    async fn read_animals(&self) -> Result<AnimalFile, DataStoreError> {
        read_document(&self.animals_path()).await
    }

    async fn write_animals(&self, animals: &AnimalFile) -> Result<(), DataStoreError> {
        write_document(&self.data_dir, &self.animals_path(), animals).await
    }
}

async fn read_document<T>(path: &Path) -> Result<T, DataStoreError>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T>(dir: &Path, path: &Path, document: &T) -> Result<(), DataStoreError>
where
    T: Serialize,
{
    tokio::fs::create_dir_all(dir).await?;
    let json = serde_json::to_vec_pretty(document)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!(path = %path.display(), "wrote document");
    Ok(())
}

#[async_trait]
impl DataStore for JsonFileDataStore {
    async fn list_animals(&self, user_id: &str) -> Result<Vec<Animal>, DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut animals = self.read_animals().await?;
        Ok(animals.remove(user_id).unwrap_or_default())
    }

    async fn get_animal(
        &self,
        user_id: &str,
        id: &AnimalId,
    ) -> Result<Option<Animal>, DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut animals = self.read_animals().await?;
        Ok(animals
            .remove(user_id)
            .and_then(|list| list.into_iter().find(|a| a.id == *id)))
    }

    async fn create_animal(&self, user_id: &str, animal: &Animal) -> Result<(), DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut animals = self.read_animals().await?;
        let list = animals.entry(user_id.to_string()).or_default();
        if list.iter().any(|a| a.id == animal.id) {
            return Err(DataStoreError::AlreadyExists);
        }
        list.push(animal.clone());
        self.write_animals(&animals).await
    }

    async fn update_animal(&self, user_id: &str, animal: &Animal) -> Result<bool, DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut animals = self.read_animals().await?;
        let Some(slot) = animals
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().find(|a| a.id == animal.id))
        else {
            return Ok(false);
        };
        *slot = animal.clone();
        self.write_animals(&animals).await?;
        Ok(true)
    }

    async fn delete_animal(&self, user_id: &str, id: &AnimalId) -> Result<bool, DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut animals = self.read_animals().await?;
        let Some(list) = animals.get_mut(user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|a| a.id != *id);
        if list.len() == before {
            return Ok(false);
        }
        self.write_animals(&animals).await?;
        Ok(true)
    }

    async fn get_settings(&self, user_id: &str) -> Result<Option<AppSettings>, DataStoreError> {
        let _guard = self.lock.lock().await;
        let mut settings: SettingsFile = read_document(&self.settings_path()).await?;
        Ok(settings.remove(user_id))
    }

    async fn put_settings(
        &self,
        user_id: &str,
        settings: &AppSettings,
    ) -> Result<(), DataStoreError> {
        let _guard = self.lock.lock().await;
        let path = self.settings_path();
        let mut all: SettingsFile = read_document(&path).await?;
        all.insert(user_id.to_string(), settings.clone());
        write_document(&self.data_dir, &path, &all).await
    }
}
