//! # Command Handlers
//!
//! This module contains organized command handlers for the petctl CLI application.
//! Each command type is implemented in a dedicated submodule.
//!
//! ## Structure
//!
//! - `animal` - Animal profiles and measurements (list, get, create, update, delete, weight, height)
//! - `event` - Timeline events of one animal (list, add, update, delete)
//! - `settings` - Per-user settings (get, set, reset, currencies)
//! - `stats` - Dashboard summary
//! - `shared` - Shared utilities and validation functions

pub mod animal;
pub mod error_extensions;
pub mod errors;
pub mod event;
pub mod settings;
pub mod shared;
pub mod stats;

pub use animal::handle_animal_command;
pub use event::handle_event_command;
pub use settings::handle_settings_command;
pub use stats::handle_stats_command;
