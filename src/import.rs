//! Loading legacy JSON data into a [`DataStore`].
//!
//! Two layouts exist in the wild. The original single-user layout keeps a
//! flat array of animals in `animals.json` and one settings object in
//! `settings.json`. The development layout keys both files by user id
//! (`{"alice": [...]}`), which is also what [`JsonFileDataStore`] writes.
//! Either way, every imported record is re-owned by the target user.
//!
//! [`JsonFileDataStore`]: crate::JsonFileDataStore

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use serde_json::Value;

use crate::{Animal, AppSettings, DataStore, DataStoreError, UserId};

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Animals written to the target store.
    pub migrated: u32,
    /// Animals that could not be decoded or written.
    pub failed: u32,
    /// Animals already present in the target store.
    pub skipped: u32,
    /// Whether a settings document was written.
    pub settings_imported: bool,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Animals read from the source, whatever happened to them.
    pub fn total(&self) -> u32 {
        self.migrated + self.failed + self.skipped
    }
}

impl Display for ImportReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "migrated {}/{} animals ({} failed, {} skipped); settings {}",
            self.migrated,
            self.total(),
            self.failed,
            self.skipped,
            if self.settings_imported {
                "imported"
            } else {
                "not imported"
            }
        )
    }
}

/// Reads a legacy file; a missing or blank file is `None`.
pub fn read_legacy_file(path: &Path) -> Result<Option<Value>, DataStoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(None),
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The animal documents in `source` that belong to `user`.
///
/// A flat array is taken whole. A keyed object yields the entry under
/// `source_user`, or `user` when no source user is given.
pub fn legacy_animals(
    source: Value,
    user: &UserId,
    source_user: Option<&str>,
) -> Result<Vec<Value>, DataStoreError> {
    match source {
        Value::Array(animals) => Ok(animals),
        Value::Object(mut by_user) => {
            let key = source_user.unwrap_or(user.as_str());
            match by_user.remove(key) {
                Some(Value::Array(animals)) => Ok(animals),
                Some(_) => Err(DataStoreError::SerializationError(format!(
                    "animals of {:?} are not a list",
                    key
                ))),
                None => Ok(Vec::new()),
            }
        }
        _ => Err(DataStoreError::SerializationError(
            "animals file must hold a list or an object keyed by user".to_string(),
        )),
    }
}

/// The settings document in `source` for `user`, if any.
///
/// A single settings object is recognised by its `currency` section; anything
/// else is treated as keyed by user id.
pub fn legacy_settings(
    source: Value,
    user: &UserId,
    source_user: Option<&str>,
) -> Result<Option<AppSettings>, DataStoreError> {
    let single = matches!(&source, Value::Object(map) if map.contains_key("currency"));
    let document = match source {
        Value::Object(_) if single => Some(source),
        Value::Object(mut by_user) => by_user.remove(source_user.unwrap_or(user.as_str())),
        _ => {
            return Err(DataStoreError::SerializationError(
                "settings file must hold an object".to_string(),
            ));
        }
    };
    document
        .map(serde_json::from_value)
        .transpose()
        .map_err(DataStoreError::from)
}

fn describe(document: &Value) -> String {
    let field = |key: &str| document.get(key).and_then(Value::as_str).unwrap_or("?");
    format!("{} ({})", field("name"), field("id"))
}

/// Writes `documents` as animals owned by `user`.
pub async fn import_animals(
    store: &dyn DataStore,
    user: &UserId,
    documents: Vec<Value>,
    report: &mut ImportReport,
) {
    for document in documents {
        let label = describe(&document);
        let mut animal: Animal = match serde_json::from_value(document) {
            Ok(animal) => animal,
            Err(e) => {
                tracing::warn!("cannot decode animal {}: {}", label, e);
                report.failed += 1;
                report.errors.push(format!("Failed to decode {}: {}", label, e));
                continue;
            }
        };
        animal.user_id = Some(user.as_str().to_string());
        crate::sort_timeline(&mut animal.events);

        match store.create_animal(user.as_str(), &animal).await {
            Ok(()) => {
                tracing::info!("imported animal {} ({})", animal.name, animal.id);
                report.migrated += 1;
            }
            Err(DataStoreError::AlreadyExists) => {
                tracing::info!("animal {} already present; skipping", animal.id);
                report.skipped += 1;
            }
            Err(e) => {
                tracing::error!("cannot store animal {}: {}", animal.id, e);
                report.failed += 1;
                report.errors.push(format!("Failed to store {}: {}", label, e));
            }
        }
    }
}

/// Imports the animals file and, when given, the settings file for `user`.
pub async fn import_files(
    store: &dyn DataStore,
    user: &UserId,
    animals_path: &Path,
    settings_path: Option<&Path>,
    source_user: Option<&str>,
) -> Result<ImportReport, DataStoreError> {
    let mut report = ImportReport::default();

    match read_legacy_file(animals_path)? {
        Some(source) => {
            let documents = legacy_animals(source, user, source_user)?;
            import_animals(store, user, documents, &mut report).await;
        }
        None => tracing::info!("no animals in {}; skipping", animals_path.display()),
    }

    if let Some(path) = settings_path {
        let settings = match read_legacy_file(path)? {
            Some(source) => legacy_settings(source, user, source_user)?,
            None => None,
        };
        if let Some(settings) = settings {
            store.put_settings(user.as_str(), &settings).await?;
            report.settings_imported = true;
        }
    }

    Ok(report)
}
