//! Server configuration for pet-ledgerd.
//!
//! A configuration file (YAML or JSON) describes where to listen, which
//! storage backend to use, and how to authenticate requests. Command-line
//! options override the file. Everything has a default, so running without a
//! file gives a development server on `127.0.0.1:8080` that keeps JSON files
//! in `./data`.
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 9000
//! storage:
//!   backend: postgres
//!   database_url: postgres://localhost/pet_ledger
//! auth:
//!   mode: tokens
//!   tokens:
//!     s3cret: alice
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Authenticator, DataStore, DataStoreError, DevelopmentAuthenticator, InMemoryDataStore,
    JsonFileDataStore, PgDataStore, StaticTokenAuthenticator,
};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default directory of the JSON-file backend.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Where documents are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process memory; lost on exit.
    Memory,
    /// JSON files under `data_dir`.
    Json {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
    },
    /// PostgreSQL JSONB tables.
    Postgres { database_url: String },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Json {
            data_dir: default_data_dir(),
        }
    }
}

impl Display for StorageConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageConfig::Memory => write!(f, "in-memory"),
            StorageConfig::Json { data_dir } => write!(f, "json files in {}", data_dir.display()),
            StorageConfig::Postgres { .. } => write!(f, "postgres"),
        }
    }
}

/// How bearer credentials are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AuthConfig {
    /// Trust unverified JWT payloads.
    #[default]
    Development,
    /// Accept only the listed `token -> user id` pairs.
    Tokens { tokens: HashMap<String, String> },
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Selects the JSON-file backend in this directory.
    pub data_dir: Option<PathBuf>,
    /// Selects the PostgreSQL backend; wins over `data_dir`.
    pub database_url: Option<String>,
}

/// Failure to load or act on a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(PathBuf, std::io::Error),
    /// The file is not valid YAML or JSON for this schema.
    Parse(PathBuf, String),
    /// The configured store could not be opened.
    Store(DataStoreError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "invalid config {}: {}", path.display(), e),
            ConfigError::Store(e) => write!(f, "cannot open storage: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<DataStoreError> for ConfigError {
    fn from(e: DataStoreError) -> Self {
        ConfigError::Store(e)
    }
}

impl ServerConfig {
    /// Reads a configuration file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Self::parse(&contents, is_json).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Parses configuration text.
    pub fn parse(contents: &str, is_json: bool) -> Result<Self, String> {
        if is_json {
            serde_json::from_str(contents).map_err(|e| e.to_string())
        } else if contents.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yml::from_str(contents).map_err(|e| e.to_string())
        }
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage = StorageConfig::Json { data_dir };
        }
        if let Some(database_url) = overrides.database_url {
            self.storage = StorageConfig::Postgres { database_url };
        }
        self
    }

    /// The `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens the configured store, running migrations for PostgreSQL.
    pub async fn build_store(&self) -> Result<Arc<dyn DataStore>, ConfigError> {
        let store: Arc<dyn DataStore> = match &self.storage {
            StorageConfig::Memory => Arc::new(InMemoryDataStore::new()),
            StorageConfig::Json { data_dir } => Arc::new(JsonFileDataStore::new(data_dir)),
            StorageConfig::Postgres { database_url } => {
                Arc::new(PgDataStore::connect(database_url).await?)
            }
        };
        Ok(store)
    }

    /// Builds the configured authenticator.
    pub fn build_authenticator(&self) -> Arc<dyn Authenticator> {
        match &self.auth {
            AuthConfig::Development => Arc::new(DevelopmentAuthenticator),
            AuthConfig::Tokens { tokens } => Arc::new(StaticTokenAuthenticator::new(
                tokens.iter().map(|(t, u)| (t.clone(), u.clone())),
            )),
        }
    }
}
