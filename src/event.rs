use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, put};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animal::{non_empty, parse_animal_id};
use crate::auth::CurrentUser;
use crate::derived::{self, flexible_timestamp};
use crate::router::{AppState, Payload};
use crate::{Animal, ApiError, AppSettings, LedgerError};

/////////////////////////////////////////////// EventId ////////////////////////////////////////////////

/// Identifier of an event entry, unique within its animal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        EventId(Uuid::new_v4().to_string())
    }

    /// The identifier as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

/////////////////////////////////////////////// EventType //////////////////////////////////////////////

/// Category of a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Medical,
    Surgical,
    Behavioral,
    Lifecycle,
    Grooming,
    Nutrition,
    Exercise,
    General,
}

impl EventType {
    /// Every category, in declaration order.
    pub const ALL: [EventType; 8] = [
        EventType::Medical,
        EventType::Surgical,
        EventType::Behavioral,
        EventType::Lifecycle,
        EventType::Grooming,
        EventType::Nutrition,
        EventType::Exercise,
        EventType::General,
    ];

    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Medical => "medical",
            EventType::Surgical => "surgical",
            EventType::Behavioral => "behavioral",
            EventType::Lifecycle => "lifecycle",
            EventType::Grooming => "grooming",
            EventType::Nutrition => "nutrition",
            EventType::Exercise => "exercise",
            EventType::General => "general",
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown event type {:?}", s))
    }
}

////////////////////////////////////////////// EventEntry //////////////////////////////////////////////

/// One entry on an animal's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub id: EventId,
    /// When the event happened.
    #[serde(with = "flexible_timestamp")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Orders events newest first. Events on the same instant keep their relative order.
pub fn sort_timeline(events: &mut [EventEntry]) {
    events.sort_by(|a, b| b.date.cmp(&a.date));
}

/////////////////////////////////////////////// Requests ///////////////////////////////////////////////

/// An event as submitted by a client, before validation.
///
/// `cost` is kept as a raw JSON value so numeric strings are accepted and
/// garbage is reported with a helpful message instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRequest {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub veterinarian: Option<String>,
    pub cost: Option<serde_json::Value>,
    pub attachments: Vec<String>,
}

/// An [`EventRequest`] that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    event_type: EventType,
    title: String,
    date: DateTime<Utc>,
    description: Option<String>,
    notes: Option<String>,
    veterinarian: Option<String>,
    cost: Option<f64>,
    attachments: Vec<String>,
}

fn invalid(message: &str) -> LedgerError {
    LedgerError::Validation(message.to_string())
}

fn parse_cost(raw: Option<serde_json::Value>) -> Result<Option<f64>, LedgerError> {
    let cost = match raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match cost {
        Some(cost) if cost.is_finite() && cost >= 0.0 => Ok(Some(cost)),
        _ => Err(invalid("Cost must be a valid positive number")),
    }
}

impl EventRequest {
    /// Checks required fields, then the date, the cost, and the category, in that order.
    pub fn validate(self) -> Result<ValidEvent, LedgerError> {
        let event_type = self.event_type.filter(|t| !t.trim().is_empty());
        let title = non_empty(self.title);
        let date = non_empty(self.date);
        let (Some(event_type), Some(title), Some(date)) = (event_type, title, date) else {
            return Err(invalid("Missing required fields: type, title, date"));
        };
        let date = derived::parse_timestamp(&date).ok_or_else(|| invalid("Invalid date format"))?;
        let cost = parse_cost(self.cost)?;
        let event_type = event_type
            .parse::<EventType>()
            .map_err(|_| invalid("Invalid event type"))?;

        Ok(ValidEvent {
            event_type,
            title,
            date,
            description: non_empty(self.description),
            notes: non_empty(self.notes),
            veterinarian: non_empty(self.veterinarian),
            cost,
            attachments: self
                .attachments
                .into_iter()
                .filter_map(|a| non_empty(Some(a)))
                .collect(),
        })
    }
}

impl ValidEvent {
    /// A new entry with a fresh id.
    pub fn into_entry(self, now: DateTime<Utc>) -> EventEntry {
        EventEntry {
            id: EventId::random(),
            date: self.date,
            event_type: self.event_type,
            title: self.title,
            description: self.description,
            notes: self.notes,
            veterinarian: self.veterinarian,
            cost: self.cost,
            attachments: self.attachments,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every field of `entry` except its id and creation time.
    pub fn apply_to(self, entry: &mut EventEntry, now: DateTime<Utc>) {
        entry.date = self.date;
        entry.event_type = self.event_type;
        entry.title = self.title;
        entry.description = self.description;
        entry.notes = self.notes;
        entry.veterinarian = self.veterinarian;
        entry.cost = self.cost;
        entry.attachments = self.attachments;
        entry.updated_at = now;
    }
}

/////////////////////////////////////////////// Timeline ///////////////////////////////////////////////

/// An event decorated with display values for a timeline view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub event: EventEntry,
    pub type_label: String,
    pub badge_class: String,
    pub formatted_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_cost: Option<String>,
}

impl TimelineEntry {
    /// Decorates `event` using the user's date and currency preferences.
    pub fn new(event: EventEntry, settings: &AppSettings) -> Self {
        let formatted_date =
            derived::format_date_with(event.date.date_naive(), settings.display.date_format);
        let formatted_cost = event
            .cost
            .map(|cost| derived::format_currency(cost, &settings.currency));
        Self {
            type_label: event.event_type.label().to_string(),
            badge_class: event.event_type.badge_class().to_string(),
            formatted_date,
            formatted_cost,
            event,
        }
    }
}

/// Builds the timeline of `animal`, optionally restricted to one category.
pub fn build_timeline(
    animal: &Animal,
    filter: Option<EventType>,
    settings: &AppSettings,
) -> Vec<TimelineEntry> {
    let mut events: Vec<EventEntry> = animal
        .events
        .iter()
        .filter(|event| filter.is_none_or(|wanted| event.event_type == wanted))
        .cloned()
        .collect();
    sort_timeline(&mut events);
    events
        .into_iter()
        .map(|event| TimelineEntry::new(event, settings))
        .collect()
}

//////////////////////////////////////////////// Routes ////////////////////////////////////////////////

#[derive(Debug, Default, Deserialize)]
struct TimelineQuery {
    #[serde(rename = "type")]
    event_type: Option<String>,
}

async fn list_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
    let id = parse_animal_id(&id)?;
    let filter = match non_empty(query.event_type) {
        Some(raw) => Some(
            raw.parse::<EventType>()
                .map_err(|_| ApiError::bad_request("Invalid event type"))?,
        ),
        None => None,
    };
    let timeline = state
        .ledger
        .timeline(&user, &id, filter)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to fetch events"))?;
    Ok(Json(timeline))
}

async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(request): Payload<EventRequest>,
) -> Result<(StatusCode, Json<Animal>), ApiError> {
    let id = parse_animal_id(&id)?;
    let animal = state
        .ledger
        .add_event(&user, &id, request)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to add event"))?;
    Ok((StatusCode::CREATED, Json(animal)))
}

async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, event_id)): Path<(String, String)>,
    Payload(request): Payload<EventRequest>,
) -> Result<Json<Animal>, ApiError> {
    let id = parse_animal_id(&id).map_err(|_| ApiError::not_found("Animal or event not found"))?;
    let animal = state
        .ledger
        .update_event(&user, &id, &EventId::from(event_id.as_str()), request)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to update event"))?;
    Ok(Json(animal))
}

async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, event_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_animal_id(&id).map_err(|_| ApiError::not_found("Animal or event not found"))?;
    state
        .ledger
        .delete_event(&user, &id, &EventId::from(event_id.as_str()))
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to delete event"))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Creates an Axum router with event timeline endpoints.
pub fn create_event_router(state: AppState) -> Router {
    Router::new()
        .route("/animal/:id/event", get(list_events).post(create_event))
        .route(
            "/animal/:id/event/:event_id",
            put(update_event).delete(delete_event),
        )
        .with_state(state)
}
