//! Dashboard statistics computed over a user's animals.

use std::collections::BTreeMap;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::derived;
use crate::router::AppState;
use crate::{Animal, AnimalId, ApiError, AppSettings, Species};

const LIST_LIMIT: usize = 3;

/// A compact view of an animal for dashboard lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalSummary {
    pub id: AnimalId,
    pub name: String,
    pub species: Species,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A living animal's next birthday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBirthday {
    pub id: AnimalId,
    pub name: String,
    pub species: Species,
    pub next_birthday: NaiveDate,
    pub days_until: i64,
    /// `Today!`, `Tomorrow`, `In N days`, or `Mon D`.
    pub label: String,
    /// The age the animal turns on that day.
    pub turning: u32,
}

/// How many animals belong to one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesCount {
    pub species: Species,
    pub label: String,
    pub count: usize,
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_animals: usize,
    pub alive_animals: usize,
    pub deceased_animals: usize,
    /// Rounded mean age in years of living animals; unknown birth dates count as 0.
    pub average_age: u32,
    pub total_costs: f64,
    pub formatted_total_costs: String,
    pub recently_added: Vec<AnimalSummary>,
    pub upcoming_birthdays: Vec<UpcomingBirthday>,
    pub top_species: Vec<SpeciesCount>,
}

impl DashboardStats {
    /// Computes statistics as of `today`.
    pub fn compute(animals: &[Animal], settings: &AppSettings, today: NaiveDate) -> Self {
        let alive: Vec<&Animal> = animals.iter().filter(|a| !a.is_deceased()).collect();

        let average_age = if alive.is_empty() {
            0
        } else {
            let sum: u32 = alive.iter().map(|a| a.age(today)).sum();
            (sum as f64 / alive.len() as f64).round() as u32
        };

        let total_costs: f64 = animals.iter().map(Animal::total_event_cost).sum();

        let mut newest: Vec<&Animal> = animals.iter().collect();
        newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recently_added = newest
            .into_iter()
            .take(LIST_LIMIT)
            .map(|a| AnimalSummary {
                id: a.id,
                name: a.name.clone(),
                species: a.species,
                breed: a.breed.clone(),
                created_at: a.created_at,
            })
            .collect();

        let mut birthdays: Vec<UpcomingBirthday> = alive
            .iter()
            .filter_map(|a| {
                let birth = a.date_of_birth?;
                let next = derived::next_birthday(birth, today);
                Some(UpcomingBirthday {
                    id: a.id,
                    name: a.name.clone(),
                    species: a.species,
                    next_birthday: next,
                    days_until: (next - today).num_days(),
                    label: derived::birthday_label(next, today),
                    turning: derived::calculate_age(Some(birth), None, next),
                })
            })
            .collect();
        birthdays.sort_by_key(|b| b.next_birthday);
        birthdays.truncate(LIST_LIMIT);

        let mut counts: BTreeMap<Species, usize> = BTreeMap::new();
        for animal in animals {
            *counts.entry(animal.species).or_default() += 1;
        }
        let mut top_species: Vec<SpeciesCount> = counts
            .into_iter()
            .map(|(species, count)| SpeciesCount {
                species,
                label: species.label().to_string(),
                count,
            })
            .collect();
        // Stable sort keeps species declaration order among ties.
        top_species.sort_by(|a, b| b.count.cmp(&a.count));
        top_species.truncate(LIST_LIMIT);

        Self {
            total_animals: animals.len(),
            alive_animals: alive.len(),
            deceased_animals: animals.len() - alive.len(),
            average_age,
            total_costs,
            formatted_total_costs: derived::format_currency(total_costs, &settings.currency),
            recently_added,
            upcoming_birthdays: birthdays,
            top_species,
        }
    }
}

async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state
        .ledger
        .dashboard_stats(&user)
        .await
        .map_err(|e| ApiError::from_ledger(e, "Failed to compute statistics"))?;
    Ok(Json(stats))
}

/// Creates an Axum router with the dashboard statistics endpoint.
pub fn create_stats_router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .with_state(state)
}
