use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::derived::{self, blank_as_none, flexible_timestamp, form_number, lenient_date};
use crate::router::{AppState, Payload};
use crate::{ApiError, EventEntry, LedgerError};

/////////////////////////////////////////////// AnimalId ///////////////////////////////////////////////

/// Identifier of an animal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimalId(Uuid);

impl AnimalId {
    /// Wraps an existing UUID.
    pub fn new(uuid: Uuid) -> Self {
        AnimalId(uuid)
    }

    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        AnimalId(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for AnimalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Error returned when an animal identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalIdParseError {
    input: String,
}

impl AnimalIdParseError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl Display for AnimalIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Invalid animal ID {:?}: expected a UUID", self.input)
    }
}

impl std::error::Error for AnimalIdParseError {}

impl FromStr for AnimalId {
    type Err = AnimalIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(AnimalId)
            .map_err(|_| AnimalIdParseError {
                input: s.to_string(),
            })
    }
}

//////////////////////////////////////////////// Species ///////////////////////////////////////////////

/// The closed set of species an animal can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Species {
    Horse,
    Dog,
    Cat,
    Pig,
    Goat,
    Llama,
    Alpaca,
    Ferret,
    Parrot,
    BirdOfPrey,
    Rabbit,
    Sheep,
    Cow,
    Chicken,
    Duck,
    Other,
}

impl Species {
    /// Every species, in declaration order.
    pub const ALL: [Species; 16] = [
        Species::Horse,
        Species::Dog,
        Species::Cat,
        Species::Pig,
        Species::Goat,
        Species::Llama,
        Species::Alpaca,
        Species::Ferret,
        Species::Parrot,
        Species::BirdOfPrey,
        Species::Rabbit,
        Species::Sheep,
        Species::Cow,
        Species::Chicken,
        Species::Duck,
        Species::Other,
    ];

    /// The wire name, e.g. `bird-of-prey`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Horse => "horse",
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Pig => "pig",
            Species::Goat => "goat",
            Species::Llama => "llama",
            Species::Alpaca => "alpaca",
            Species::Ferret => "ferret",
            Species::Parrot => "parrot",
            Species::BirdOfPrey => "bird-of-prey",
            Species::Rabbit => "rabbit",
            Species::Sheep => "sheep",
            Species::Cow => "cow",
            Species::Chicken => "chicken",
            Species::Duck => "duck",
            Species::Other => "other",
        }
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Species::ALL
            .into_iter()
            .find(|species| species.as_str() == wanted)
            .ok_or_else(|| format!("unknown species {:?}", s))
    }
}

////////////////////////////////////////////// Measurements ////////////////////////////////////////////

/// Unit a weight was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lbs,
    Kg,
}

/// Unit a height was recorded in; hands are used for horses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    Inches,
    Cm,
    Hands,
}

/// Where on the body a height was measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    #[default]
    Shoulder,
    Withers,
    Total,
}

/// A single weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    /// When the measurement was taken.
    #[serde(with = "flexible_timestamp")]
    pub date: DateTime<Utc>,
    /// The measured value.
    pub weight: f64,
    /// Unit of `weight`.
    pub unit: WeightUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single height measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightRecord {
    /// When the measurement was taken.
    #[serde(with = "flexible_timestamp")]
    pub date: DateTime<Utc>,
    /// The measured value.
    pub height: f64,
    /// Unit of `height`.
    pub unit: HeightUnit,
    /// Body location of the measurement.
    #[serde(default)]
    pub measurement_type: MeasurementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

//////////////////////////////////////////////// Animal ////////////////////////////////////////////////

/// Contact details of the animal's owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A pet profile with its measurement history and event timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: AnimalId,
    /// Owning user; stores scope records by this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    pub species: Species,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    #[serde(default)]
    pub sex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub weight: Vec<WeightRecord>,
    #[serde(default)]
    pub height: Vec<HeightRecord>,
    /// Newest first.
    #[serde(default)]
    pub events: Vec<EventEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microchip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub owner_info: OwnerInfo,
    #[serde(with = "flexible_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    /// True when a death date has been recorded.
    pub fn is_deceased(&self) -> bool {
        self.death_date.is_some()
    }

    /// Age in whole years as of `today` (or at death).
    pub fn age(&self, today: NaiveDate) -> u32 {
        derived::calculate_age(self.date_of_birth, self.death_date, today)
    }

    /// The most recent weight measurement, if any.
    pub fn latest_weight(&self) -> Option<&WeightRecord> {
        self.weight.iter().max_by_key(|record| record.date)
    }

    /// The most recent height measurement, if any.
    pub fn latest_height(&self) -> Option<&HeightRecord> {
        self.height.iter().max_by_key(|record| record.date)
    }

    /// Sum of every recorded event cost.
    pub fn total_event_cost(&self) -> f64 {
        self.events.iter().filter_map(|event| event.cost).sum()
    }
}

///////////////////////////////////////////////// Forms ////////////////////////////////////////////////

/// Profile fields submitted when creating or editing an animal.
///
/// Empty strings count as absent, mirroring what an HTML form sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimalForm {
    pub name: String,
    #[serde(deserialize_with = "blank_as_none::deserialize")]
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub date_of_birth: Option<String>,
    pub death_date: Option<String>,
    pub sex: String,
    pub color: Option<String>,
    pub markings: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(deserialize_with = "form_number::deserialize")]
    pub initial_weight: Option<f64>,
    #[serde(deserialize_with = "blank_as_none::deserialize")]
    pub weight_unit: Option<WeightUnit>,
    #[serde(deserialize_with = "form_number::deserialize")]
    pub initial_height: Option<f64>,
    #[serde(deserialize_with = "blank_as_none::deserialize")]
    pub height_unit: Option<HeightUnit>,
    #[serde(deserialize_with = "blank_as_none::deserialize")]
    pub height_measurement_type: Option<MeasurementType>,
    pub medical_notes: Option<String>,
    pub special_needs: Option<String>,
    pub microchip_id: Option<String>,
    pub registration_number: Option<String>,
    pub parent_ids: Vec<String>,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_address: Option<String>,
}

/// An [`AnimalForm`] that passed validation, with text trimmed and dates parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAnimalForm {
    name: String,
    species: Species,
    breed: Option<String>,
    date_of_birth: Option<NaiveDate>,
    death_date: Option<NaiveDate>,
    sex: String,
    color: Option<String>,
    markings: Option<String>,
    profile_picture: Option<String>,
    weight: Option<(f64, WeightUnit)>,
    height: Option<(f64, HeightUnit, MeasurementType)>,
    medical_notes: Option<String>,
    special_needs: Option<String>,
    microchip_id: Option<String>,
    registration_number: Option<String>,
    parent_ids: Vec<String>,
    owner_info: OwnerInfo,
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_form_date(raw: Option<String>, message: &str) -> Result<Option<NaiveDate>, LedgerError> {
    match non_empty(raw) {
        Some(raw) => derived::parse_date(&raw)
            .map(Some)
            .ok_or_else(|| LedgerError::Validation(message.to_string())),
        None => Ok(None),
    }
}

fn positive(value: Option<f64>, message: &str) -> Result<Option<f64>, LedgerError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(LedgerError::Validation(message.to_string())),
        other => Ok(other),
    }
}

impl AnimalForm {
    /// Checks required fields and cross-field rules.
    pub fn validate(self) -> Result<ValidAnimalForm, LedgerError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "Missing required field: name".to_string(),
            ));
        }
        let species = self.species.ok_or_else(|| {
            LedgerError::Validation("Missing required field: species".to_string())
        })?;

        let date_of_birth = parse_form_date(self.date_of_birth, "Invalid date of birth")?;
        let death_date = parse_form_date(self.death_date, "Invalid death date")?;
        if let (Some(birth), Some(death)) = (date_of_birth, death_date) {
            if death <= birth {
                return Err(LedgerError::Validation(
                    "Death date must be after date of birth".to_string(),
                ));
            }
        }

        let owner_email = non_empty(self.owner_email);
        if let Some(email) = &owner_email {
            if !derived::validate_email(email) {
                return Err(LedgerError::Validation(
                    "Invalid owner email address".to_string(),
                ));
            }
        }
        let owner_phone = non_empty(self.owner_phone);
        if let Some(phone) = &owner_phone {
            if !derived::validate_phone_number(phone) {
                return Err(LedgerError::Validation(
                    "Invalid owner phone number".to_string(),
                ));
            }
        }

        let weight = positive(self.initial_weight, "Weight must be a positive number")?.map(|w| {
            (
                w,
                self.weight_unit
                    .unwrap_or_else(|| derived::default_weight_unit(species)),
            )
        });
        let height = positive(self.initial_height, "Height must be a positive number")?.map(|h| {
            (
                h,
                self.height_unit
                    .unwrap_or_else(|| derived::default_height_unit(species)),
                self.height_measurement_type.unwrap_or_default(),
            )
        });

        Ok(ValidAnimalForm {
            name,
            species,
            breed: non_empty(self.breed),
            date_of_birth,
            death_date,
            sex: self.sex.trim().to_string(),
            color: non_empty(self.color),
            markings: non_empty(self.markings),
            profile_picture: non_empty(self.profile_picture),
            weight,
            height,
            medical_notes: non_empty(self.medical_notes),
            special_needs: non_empty(self.special_needs),
            microchip_id: non_empty(self.microchip_id),
            registration_number: non_empty(self.registration_number),
            parent_ids: self
                .parent_ids
                .into_iter()
                .filter_map(|id| non_empty(Some(id)))
                .collect(),
            owner_info: OwnerInfo {
                name: self.owner_name.trim().to_string(),
                email: owner_email,
                phone: owner_phone,
                address: non_empty(self.owner_address),
            },
        })
    }
}

impl ValidAnimalForm {
    /// Builds a brand-new animal; a supplied weight or height becomes its first record.
    pub fn into_animal(self, id: AnimalId, user_id: &str, now: DateTime<Utc>) -> Animal {
        let weight = self
            .weight
            .map(|(weight, unit)| WeightRecord {
                date: now,
                weight,
                unit,
                notes: Some("Initial weight record".to_string()),
            })
            .into_iter()
            .collect();
        let height = self
            .height
            .map(|(height, unit, measurement_type)| HeightRecord {
                date: now,
                height,
                unit,
                measurement_type,
                notes: Some("Initial height record".to_string()),
            })
            .into_iter()
            .collect();

        Animal {
            id,
            user_id: Some(user_id.to_string()),
            name: self.name,
            species: self.species,
            breed: self.breed,
            date_of_birth: self.date_of_birth,
            death_date: self.death_date,
            sex: self.sex,
            color: self.color,
            markings: self.markings,
            profile_picture: self.profile_picture,
            weight,
            height,
            events: Vec::new(),
            medical_notes: self.medical_notes,
            special_needs: self.special_needs,
            microchip_id: self.microchip_id,
            registration_number: self.registration_number,
            parent_ids: self.parent_ids,
            owner_info: self.owner_info,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the profile fields of `animal`.
    ///
    /// Identity, ownership, history arrays, and `created_at` survive. A
    /// supplied weight or height is appended rather than replacing history,
    /// and a missing profile picture keeps the old one.
    pub fn apply_to(self, animal: &mut Animal, now: DateTime<Utc>) {
        animal.name = self.name;
        animal.species = self.species;
        animal.breed = self.breed;
        animal.date_of_birth = self.date_of_birth;
        animal.death_date = self.death_date;
        animal.sex = self.sex;
        animal.color = self.color;
        animal.markings = self.markings;
        if self.profile_picture.is_some() {
            animal.profile_picture = self.profile_picture;
        }
        animal.medical_notes = self.medical_notes;
        animal.special_needs = self.special_needs;
        animal.microchip_id = self.microchip_id;
        animal.registration_number = self.registration_number;
        animal.parent_ids = self.parent_ids;
        animal.owner_info = self.owner_info;

        if let Some((weight, unit)) = self.weight {
            animal.weight.push(WeightRecord {
                date: now,
                weight,
                unit,
                notes: Some("Updated weight record".to_string()),
            });
        }
        if let Some((height, unit, measurement_type)) = self.height {
            animal.height.push(HeightRecord {
                date: now,
                height,
                unit,
                measurement_type,
                notes: Some("Updated height record".to_string()),
            });
        }
        animal.updated_at = now;
    }
}

/// A standalone weight measurement to append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRequest {
    pub weight: f64,
    pub unit: WeightUnit,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A standalone height measurement to append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightRequest {
    pub height: f64,
    pub unit: HeightUnit,
    #[serde(default)]
    pub measurement_type: MeasurementType,
    #[serde(default)]
    pub notes: Option<String>,
}

//////////////////////////////////////////////// Filters ///////////////////////////////////////////////

/// Whether a list includes living animals, deceased ones, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeStatus {
    All,
    Alive,
    Deceased,
}

impl FromStr for LifeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(LifeStatus::All),
            "alive" => Ok(LifeStatus::Alive),
            "deceased" => Ok(LifeStatus::Deceased),
            other => Err(format!("unknown status {:?}", other)),
        }
    }
}

/// Search and filter criteria for animal lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalFilter {
    /// Case-insensitive substring matched against name, breed, and species.
    pub search: Option<String>,
    pub species: Option<Species>,
    pub status: LifeStatus,
}

impl Default for AnimalFilter {
    fn default() -> Self {
        Self {
            search: None,
            species: None,
            status: LifeStatus::All,
        }
    }
}

impl AnimalFilter {
    /// True when `animal` satisfies every criterion.
    pub fn matches(&self, animal: &Animal) -> bool {
        let status_ok = match self.status {
            LifeStatus::All => true,
            LifeStatus::Alive => !animal.is_deceased(),
            LifeStatus::Deceased => animal.is_deceased(),
        };
        if !status_ok {
            return false;
        }
        if let Some(species) = self.species {
            if animal.species != species {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                animal.name.to_lowercase().contains(&term)
                    || animal
                        .breed
                        .as_deref()
                        .is_some_and(|breed| breed.to_lowercase().contains(&term))
                    || animal.species.as_str().contains(&term)
            }
            None => true,
        }
    }
}

/// Query string accepted by `GET /animal`.
#[derive(Debug, Default, Deserialize)]
pub struct AnimalQuery {
    pub search: Option<String>,
    pub species: Option<String>,
    pub status: Option<String>,
}

////////////////////////////////////////////// Routes //////////////////////////////////////////////////

pub(crate) fn parse_animal_id(raw: &str) -> Result<AnimalId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid animal ID"))
}

async fn list_animals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AnimalQuery>,
) -> Result<Json<Vec<Animal>>, ApiError> {
    let species = match non_empty(query.species) {
        Some(raw) => Some(
            raw.parse::<Species>()
                .map_err(|_| ApiError::bad_request("Invalid species"))?,
        ),
        None => None,
    };
    let status = match non_empty(query.status) {
        Some(raw) => Some(
            raw.parse::<LifeStatus>()
                .map_err(|_| ApiError::bad_request("Invalid status"))?,
        ),
        None => None,
    };
    let search = non_empty(query.search);

    let animals = state
        .ledger
        .list_animals(&user, search, species, status)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to fetch animals"))?;
    Ok(Json(animals))
}

async fn create_animal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(form): Payload<AnimalForm>,
) -> Result<(StatusCode, Json<Animal>), ApiError> {
    let animal = state
        .ledger
        .add_animal(&user, form)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to create animal"))?;
    Ok((StatusCode::CREATED, Json(animal)))
}

async fn get_animal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Animal>, ApiError> {
    let id = parse_animal_id(&id)?;
    let animal = state
        .ledger
        .get_animal(&user, &id)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to fetch animal"))?;
    Ok(Json(animal))
}

async fn update_animal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(form): Payload<AnimalForm>,
) -> Result<Json<Animal>, ApiError> {
    let id = parse_animal_id(&id)?;
    let animal = state
        .ledger
        .update_animal(&user, &id, form)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to update animal"))?;
    Ok(Json(animal))
}

async fn delete_animal(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_animal_id(&id)?;
    state
        .ledger
        .delete_animal(&user, &id)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to delete animal"))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn add_weight(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(request): Payload<WeightRequest>,
) -> Result<(StatusCode, Json<Animal>), ApiError> {
    let id = parse_animal_id(&id)?;
    let animal = state
        .ledger
        .add_weight_record(&user, &id, request)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to add weight record"))?;
    Ok((StatusCode::CREATED, Json(animal)))
}

async fn add_height(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(request): Payload<HeightRequest>,
) -> Result<(StatusCode, Json<Animal>), ApiError> {
    let id = parse_animal_id(&id)?;
    let animal = state
        .ledger
        .add_height_record(&user, &id, request)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to add height record"))?;
    Ok((StatusCode::CREATED, Json(animal)))
}

////////////////////////////////////////////// Router //////////////////////////////////////////////////

/// Creates an Axum router with animal profile and measurement endpoints.
pub fn create_animal_router(state: AppState) -> Router {
    Router::new()
        .route("/animal", get(list_animals).post(create_animal))
        .route(
            "/animal/:id",
            get(get_animal).put(update_animal).delete(delete_animal),
        )
        .route("/animal/:id/weight", post(add_weight))
        .route("/animal/:id/height", post(add_height))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::sample_form;

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn animal_id_round_trips_through_display() {
        let id = AnimalId::random();
        let parsed: AnimalId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<AnimalId>().is_err());
    }

    #[test]
    fn species_wire_names() {
        assert_eq!("bird-of-prey".parse::<Species>(), Ok(Species::BirdOfPrey));
        assert_eq!("Dog".parse::<Species>(), Ok(Species::Dog));
        assert!("dragon".parse::<Species>().is_err());
        let json = serde_json::to_string(&Species::BirdOfPrey).unwrap();
        assert_eq!(json, "\"bird-of-prey\"");
    }

    #[test]
    fn form_reads_blank_and_numeric_text() {
        let form: AnimalForm = serde_json::from_value(serde_json::json!({
            "name": "Rex",
            "species": "dog",
            "initialWeight": "40",
            "weightUnit": "lbs",
            "initialHeight": "",
            "heightUnit": "",
            "heightMeasurementType": ""
        }))
        .unwrap();
        assert_eq!(form.initial_weight, Some(40.0));
        assert_eq!(form.weight_unit, Some(WeightUnit::Lbs));
        assert_eq!(form.initial_height, None);
        assert_eq!(form.height_unit, None);
        assert_eq!(form.height_measurement_type, None);

        let form: AnimalForm =
            serde_json::from_value(serde_json::json!({"name": "Rex", "species": " "})).unwrap();
        assert_eq!(form.species, None);
        assert_eq!(
            form.validate(),
            Err(LedgerError::Validation(
                "Missing required field: species".to_string()
            ))
        );

        let form: AnimalForm = serde_json::from_value(
            serde_json::json!({"name": "Rex", "species": "dog", "initialWeight": "heavy"}),
        )
        .unwrap();
        assert_eq!(
            form.validate(),
            Err(LedgerError::Validation(
                "Weight must be a positive number".to_string()
            ))
        );
    }

    #[test]
    fn blank_status_is_not_a_filter() {
        assert!("".parse::<LifeStatus>().is_err());
        assert_eq!(" Alive ".parse::<LifeStatus>(), Ok(LifeStatus::Alive));
    }

    #[test]
    fn form_requires_name() {
        let mut form = sample_form("Rex");
        form.name = "   ".to_string();
        assert_eq!(
            form.validate(),
            Err(LedgerError::Validation(
                "Missing required field: name".to_string()
            ))
        );
    }

    #[test]
    fn form_rejects_death_before_birth() {
        let mut form = sample_form("Rex");
        form.date_of_birth = Some("2020-01-01".to_string());
        form.death_date = Some("2019-12-31".to_string());
        assert!(matches!(form.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn form_treats_empty_strings_as_absent() {
        let mut form = sample_form("Rex");
        form.breed = Some("  ".to_string());
        form.death_date = Some(String::new());
        let animal = form
            .validate()
            .unwrap()
            .into_animal(AnimalId::random(), "u1", now());
        assert_eq!(animal.breed, None);
        assert_eq!(animal.death_date, None);
    }

    #[test]
    fn form_rejects_bad_owner_email() {
        let mut form = sample_form("Rex");
        form.owner_email = Some("nobody".to_string());
        assert!(form.validate().is_err());
    }

    #[test]
    fn initial_measurements_become_records() {
        let mut form = sample_form("Comet");
        form.species = Some(Species::Horse);
        form.initial_weight = Some(900.0);
        form.initial_height = Some(15.2);
        let animal = form
            .validate()
            .unwrap()
            .into_animal(AnimalId::random(), "u1", now());
        assert_eq!(animal.weight.len(), 1);
        assert_eq!(animal.weight[0].unit, WeightUnit::Lbs);
        assert_eq!(animal.height[0].unit, HeightUnit::Hands);
        assert_eq!(
            animal.height[0].notes.as_deref(),
            Some("Initial height record")
        );
        assert_eq!(animal.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn update_appends_measurements_and_keeps_picture() {
        let mut form = sample_form("Rex");
        form.profile_picture = Some("/uploads/rex.png".to_string());
        form.initial_weight = Some(30.0);
        let mut animal = form
            .validate()
            .unwrap()
            .into_animal(AnimalId::random(), "u1", now());

        let mut edit = sample_form("Rex II");
        edit.initial_weight = Some(32.0);
        let later: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();
        edit.validate().unwrap().apply_to(&mut animal, later);

        assert_eq!(animal.name, "Rex II");
        assert_eq!(animal.weight.len(), 2);
        assert_eq!(animal.latest_weight().unwrap().weight, 32.0);
        assert_eq!(animal.profile_picture.as_deref(), Some("/uploads/rex.png"));
        assert_eq!(animal.created_at, now());
        assert_eq!(animal.updated_at, later);
    }

    #[test]
    fn filter_matches_search_species_and_status() {
        let mut animal = sample_form("Biscuit")
            .validate()
            .unwrap()
            .into_animal(AnimalId::random(), "u1", now());
        animal.breed = Some("Golden Retriever".to_string());

        let by_breed = AnimalFilter {
            search: Some("golden".to_string()),
            ..AnimalFilter::default()
        };
        assert!(by_breed.matches(&animal));

        let cats = AnimalFilter {
            species: Some(Species::Cat),
            ..AnimalFilter::default()
        };
        assert!(!cats.matches(&animal));

        let deceased = AnimalFilter {
            status: LifeStatus::Deceased,
            ..AnimalFilter::default()
        };
        assert!(!deceased.matches(&animal));
        animal.death_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(deceased.matches(&animal));
    }

    #[test]
    fn legacy_document_deserializes() {
        let legacy = serde_json::json!({
            "id": "8c5e1a4e-3f5a-4c1e-9d4b-0a8e2f0b7c11",
            "name": "Maple",
            "species": "cat",
            "dateOfBirth": "2019-04-02",
            "sex": "female",
            "weight": [{"date": "2024-01-01T00:00:00.000Z", "weight": 9.5, "unit": "lbs"}],
            "height": [],
            "ownerInfo": {"name": "Sam"},
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z"
        });
        let animal: Animal = serde_json::from_value(legacy).unwrap();
        assert!(animal.events.is_empty());
        assert_eq!(animal.date_of_birth, NaiveDate::from_ymd_opt(2019, 4, 2));
        assert_eq!(animal.species, Species::Cat);
    }
}
