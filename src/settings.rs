//! Per-user application settings.
//!
//! Every user has exactly one [`AppSettings`] document. It is created with
//! [`AppSettings::defaults`] the first time it is read and replaced wholesale
//! on update.

use std::collections::BTreeMap;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiError;
use crate::LedgerError;
use crate::auth::CurrentUser;
use crate::derived::flexible_timestamp;
use crate::router::{AppState, Payload};

/////////////////////////////////////////////// Currency ///////////////////////////////////////////////

/// Which side of the amount the currency symbol goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    Before,
    After,
}

/// How monetary amounts are displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// ISO code, e.g. `USD`.
    pub code: String,
    pub symbol: String,
    pub position: CurrencyPosition,
    /// Digits after the decimal point.
    pub decimals: u8,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            position: CurrencyPosition::Before,
            decimals: 2,
        }
    }
}

/// A currency offered to users when choosing their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

/// Currencies a user can pick from.
pub const AVAILABLE_CURRENCIES: [CurrencyOption; 10] = [
    CurrencyOption { code: "USD", symbol: "$", name: "US Dollar" },
    CurrencyOption { code: "EUR", symbol: "€", name: "Euro" },
    CurrencyOption { code: "GBP", symbol: "£", name: "British Pound" },
    CurrencyOption { code: "CAD", symbol: "C$", name: "Canadian Dollar" },
    CurrencyOption { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    CurrencyOption { code: "JPY", symbol: "¥", name: "Japanese Yen" },
    CurrencyOption { code: "CHF", symbol: "Fr", name: "Swiss Franc" },
    CurrencyOption { code: "CNY", symbol: "¥", name: "Chinese Yuan" },
    CurrencyOption { code: "INR", symbol: "₹", name: "Indian Rupee" },
    CurrencyOption { code: "BRL", symbol: "R$", name: "Brazilian Real" },
];

///////////////////////////////////////////// Field options ////////////////////////////////////////////

/// Unit choices offered in measurement forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUnits {
    pub weight: Vec<String>,
    pub height: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Select,
    Date,
    Textarea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldCategory {
    Basic,
    Medical,
    Physical,
    Other,
}

/// A user-defined profile field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    /// Choices for `select` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    pub category: CustomFieldCategory,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Option lists offered by profile forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    pub species: Vec<String>,
    /// Breed suggestions keyed by species label.
    pub breeds: BTreeMap<String, Vec<String>>,
    pub colors: Vec<String>,
    pub measurement_units: MeasurementUnits,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldOptions {
    fn default() -> Self {
        let mut breeds = BTreeMap::new();
        breeds.insert(
            "Dog".to_string(),
            strings(&[
                "Labrador Retriever",
                "Golden Retriever",
                "German Shepherd",
                "Bulldog",
                "Poodle",
                "Beagle",
                "Rottweiler",
                "Yorkshire Terrier",
                "Boxer",
                "Dachshund",
            ]),
        );
        breeds.insert(
            "Cat".to_string(),
            strings(&[
                "Domestic Shorthair",
                "Domestic Longhair",
                "Persian",
                "Maine Coon",
                "Siamese",
                "Ragdoll",
                "British Shorthair",
                "Abyssinian",
                "Russian Blue",
                "Bengal",
            ]),
        );
        breeds.insert(
            "Horse".to_string(),
            strings(&[
                "Arabian",
                "Thoroughbred",
                "Quarter Horse",
                "Paint Horse",
                "Appaloosa",
                "Mustang",
                "Friesian",
                "Clydesdale",
                "Shire",
                "Andalusian",
            ]),
        );
        breeds.insert(
            "Bird".to_string(),
            strings(&[
                "Parakeet",
                "Cockatiel",
                "Canary",
                "Finch",
                "Lovebird",
                "Conure",
                "Macaw",
                "Cockatoo",
                "African Grey",
                "Budgie",
            ]),
        );

        Self {
            species: strings(&[
                "Dog", "Cat", "Horse", "Rabbit", "Bird", "Fish", "Reptile", "Rodent", "Pig", "Goat",
                "Sheep", "Cow", "Chicken", "Duck", "Ferret", "Hedgehog", "Other",
            ]),
            breeds,
            colors: strings(&[
                "Black", "White", "Brown", "Gray", "Tan", "Golden", "Red", "Blue", "Silver",
                "Cream", "Chocolate", "Brindle", "Tricolor", "Spotted", "Striped", "Piebald",
                "Roan", "Dappled", "Merle", "Sable",
            ]),
            measurement_units: MeasurementUnits {
                weight: strings(&["lbs", "kg", "oz", "g"]),
                height: strings(&["inches", "cm", "feet", "hands"]),
            },
            custom_fields: Vec::new(),
        }
    }
}

//////////////////////////////////////////////// Display ///////////////////////////////////////////////

/// Numeric date layouts a user can choose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultView {
    #[default]
    Grid,
    List,
}

/// Presentation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub date_format: DateFormat,
    pub language: String,
    /// Whether deceased animals appear in lists by default.
    pub show_deceased: bool,
    pub default_view: DefaultView,
    pub items_per_page: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            date_format: DateFormat::MonthDayYear,
            language: "en".to_string(),
            show_deceased: false,
            default_view: DefaultView::Grid,
            items_per_page: 12,
        }
    }
}

/// Reminder preferences. Stored only; nothing sends notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_reminders: bool,
    pub upcoming_appointments: bool,
    pub vaccination_reminders: bool,
    pub birthday_reminders: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

////////////////////////////////////////////// AppSettings /////////////////////////////////////////////

/// The settings document of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub id: String,
    pub currency: CurrencySettings,
    pub field_options: FieldOptions,
    pub display: DisplaySettings,
    pub notifications: NotificationSettings,
    #[serde(with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl AppSettings {
    /// Fresh default settings with a new id.
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            currency: CurrencySettings::default(),
            field_options: FieldOptions::default(),
            display: DisplaySettings::default(),
            notifications: NotificationSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The editable sections of [`AppSettings`]; all four are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub currency: CurrencySettings,
    pub field_options: FieldOptions,
    pub display: DisplaySettings,
    pub notifications: NotificationSettings,
}

fn invalid_settings() -> LedgerError {
    LedgerError::Validation("Invalid settings data".to_string())
}

impl SettingsForm {
    /// Reads a form out of an arbitrary request body.
    ///
    /// Missing or malformed sections are reported as `Invalid settings data`.
    pub fn from_json(body: serde_json::Value) -> Result<Self, LedgerError> {
        let form: SettingsForm = serde_json::from_value(body).map_err(|e| {
            tracing::warn!(error = %e, "rejected settings body");
            invalid_settings()
        })?;
        form.validate()
    }

    /// Range checks serde cannot express.
    pub fn validate(self) -> Result<Self, LedgerError> {
        if self.currency.decimals > 4
            || self.currency.symbol.trim().is_empty()
            || self.display.items_per_page == 0
        {
            return Err(invalid_settings());
        }
        Ok(self)
    }

    /// Replaces the editable sections of `settings`, keeping id and creation time.
    pub fn apply_to(self, settings: &mut AppSettings, now: DateTime<Utc>) {
        settings.currency = self.currency;
        settings.field_options = self.field_options;
        settings.display = self.display;
        settings.notifications = self.notifications;
        settings.updated_at = now;
    }
}

//////////////////////////////////////////////// Routes ////////////////////////////////////////////////

async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AppSettings>, ApiError> {
    let settings = state
        .ledger
        .get_settings(&user)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to read settings"))?;
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload<serde_json::Value>,
) -> Result<Json<AppSettings>, ApiError> {
    let form = SettingsForm::from_json(body)
        .map_err(|e| ApiError::from_ledger(e, "Failed to update settings"))?;
    let settings = state
        .ledger
        .update_settings(&user, form)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to update settings"))?;
    Ok(Json(settings))
}

async fn reset_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AppSettings>, ApiError> {
    let settings = state
        .ledger
        .reset_settings(&user)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to reset settings"))?;
    Ok(Json(settings))
}

async fn list_currencies() -> Json<&'static [CurrencyOption]> {
    Json(&AVAILABLE_CURRENCIES)
}

/// Creates an Axum router with settings endpoints.
pub fn create_settings_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/settings",
            get(get_settings).put(update_settings).delete(reset_settings),
        )
        .route("/settings/currencies", get(list_currencies))
        .with_state(state)
}
