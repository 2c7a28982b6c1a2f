//! # Pet Ledger: Record Keeping for Animal Owners
//!
//! Pet Ledger keeps animal profiles, their weight and height history, a
//! categorized timeline of events (medical, grooming, nutrition, and so on),
//! and per-user settings that control how dates and money are displayed.
//!
//! This crate provides:
//!
//! - **Record Schema**: [`Animal`], [`EventEntry`], and [`AppSettings`] with the
//!   camelCase JSON shape used by the stored documents
//! - **Derived Values**: ages, next birthdays, currency and date formatting,
//!   labels, and unit conversion in [`derived`]
//! - **Persistence**: the [`DataStore`] trait with in-memory, JSON-file, and
//!   PostgreSQL backends, every record scoped by its owning user
//! - **Ledger Operations**: validation and whole-document updates in [`Ledger`]
//! - **HTTP API**: axum routes under `/api/v1` behind a pluggable
//!   [`Authenticator`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ petctl / HTTP clients                   │
//! ├─────────────────────────────────────────┤
//! │ HTTP API Layer (Axum routes + auth)     │
//! ├─────────────────────────────────────────┤
//! │ Ledger (validation, whole-record edits) │
//! ├─────────────────────────────────────────┤
//! │ Data Store (memory, JSON files, Pg)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ### Formatting money the way a user asked for
//!
//! ```rust
//! use pet_ledger::{CurrencyPosition, CurrencySettings, derived};
//!
//! let euro = CurrencySettings {
//!     code: "EUR".to_string(),
//!     symbol: "€".to_string(),
//!     position: CurrencyPosition::After,
//!     decimals: 2,
//! };
//! assert_eq!(derived::format_currency(1234.5, &euro), "1234.50€");
//! assert_eq!(derived::format_currency(-3.0, &euro), "-3.00€");
//! ```
//!
//! ### Recording an animal
//!
//! ```rust
//! use pet_ledger::{AnimalForm, InMemoryDataStore, Ledger, Species, UserId};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let ledger = Ledger::new(Arc::new(InMemoryDataStore::new()));
//! let owner = UserId::new("alice");
//!
//! let form = AnimalForm {
//!     name: "Comet".to_string(),
//!     species: Some(Species::Horse),
//!     initial_height: Some(15.2),
//!     ..AnimalForm::default()
//! };
//! let comet = ledger.add_animal(&owner, form).await.unwrap();
//! assert_eq!(comet.height[0].notes.as_deref(), Some("Initial height record"));
//! # });
//! ```

mod animal;
mod auth;
mod data_store;
mod errors;
mod event;
mod json_store;
mod ledger;
mod router;
mod settings;
mod stats;

/// Pure functions that turn stored records into display values.
pub mod derived;

/// PostgreSQL document storage.
pub mod sql;

/// Configuration for the pet-ledgerd server.
pub mod config;

/// Copying legacy JSON data into a data store.
pub mod import;

// CLI utility modules

/// Command-line interface utilities for program termination and output formatting.
pub mod cli_utils;

/// Command-line interface command handlers for petctl.
pub mod commands;

/// HTTP client for the pet-ledger API.
pub mod http_utils;

pub use animal::{
    Animal, AnimalFilter, AnimalForm, AnimalId, AnimalIdParseError, AnimalQuery, HeightRecord,
    HeightRequest, HeightUnit, LifeStatus, MeasurementType, OwnerInfo, Species, ValidAnimalForm,
    WeightRecord, WeightRequest, WeightUnit, create_animal_router,
};
pub use auth::{
    AuthError, Authenticator, CurrentUser, DEVELOPMENT_USER, DevelopmentAuthenticator,
    StaticTokenAuthenticator, UserId, bearer_token,
};
pub use data_store::{DataStore, InMemoryDataStore};
pub use errors::{ApiError, DataStoreError, LedgerError};
pub use event::{
    EventEntry, EventId, EventRequest, EventType, TimelineEntry, ValidEvent, build_timeline,
    create_event_router, sort_timeline,
};
pub use json_store::{ANIMALS_FILE, JsonFileDataStore, SETTINGS_FILE};
pub use ledger::Ledger;
pub use router::{AppState, Payload, create_router};
pub use settings::{
    AVAILABLE_CURRENCIES, AppSettings, CurrencyOption, CurrencyPosition, CurrencySettings,
    CustomField, CustomFieldCategory, CustomFieldType, DateFormat, DefaultView, DisplaySettings,
    FieldOptions, MeasurementUnits, NotificationSettings, SettingsForm, create_settings_router,
};
pub use sql::PgDataStore;
pub use stats::{AnimalSummary, DashboardStats, SpeciesCount, UpcomingBirthday, create_stats_router};
