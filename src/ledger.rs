//! # Ledger Operations
//!
//! [`Ledger`] is the operations layer between HTTP handlers and a
//! [`DataStore`]. It validates input, applies changes to whole documents, and
//! writes them back. Every mutation of an animal rewrites the full document;
//! there are no partial updates and no transactions spanning documents.
//!
//! Events are kept newest first: the timeline is re-sorted after every add,
//! update, and delete.

use std::sync::Arc;

use chrono::Utc;

use crate::animal::{HeightRecord, WeightRecord};
use crate::auth::UserId;
use crate::event::{build_timeline, sort_timeline};
use crate::{
    Animal, AnimalFilter, AnimalForm, AnimalId, AppSettings, DashboardStats, DataStore, EventId,
    EventRequest, EventType, HeightRequest, LedgerError, LifeStatus, SettingsForm, Species,
    TimelineEntry, WeightRequest,
};

const ANIMAL_NOT_FOUND: &str = "Animal not found";
const EVENT_NOT_FOUND: &str = "Animal or event not found";

/// Record operations for every user, backed by a shared [`DataStore`].
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn DataStore>,
}

impl Ledger {
    /// Creates a ledger over `store`.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    /// Loads an animal, applies `change`, and writes the whole document back.
    async fn modify_animal<F>(
        &self,
        user: &UserId,
        id: &AnimalId,
        not_found: &'static str,
        change: F,
    ) -> Result<Animal, LedgerError>
    where
        F: FnOnce(&mut Animal) -> Result<(), LedgerError> + Send,
    {
        let mut animal = self
            .store
            .get_animal(user.as_str(), id)
            .await?
            .ok_or(LedgerError::NotFound(not_found))?;
        change(&mut animal)?;
        if !self.store.update_animal(user.as_str(), &animal).await? {
            return Err(LedgerError::NotFound(not_found));
        }
        Ok(animal)
    }

    ///////////////////////////////////////////// Animals /////////////////////////////////////////////

    /// Lists the user's animals newest first.
    ///
    /// When `status` is absent the user's `showDeceased` display setting picks
    /// between all animals and living ones only.
    pub async fn list_animals(
        &self,
        user: &UserId,
        search: Option<String>,
        species: Option<Species>,
        status: Option<LifeStatus>,
    ) -> Result<Vec<Animal>, LedgerError> {
        let status = match status {
            Some(status) => status,
            None => {
                if self.get_settings(user).await?.display.show_deceased {
                    LifeStatus::All
                } else {
                    LifeStatus::Alive
                }
            }
        };
        let filter = AnimalFilter {
            search,
            species,
            status,
        };
        self.find_animals(user, &filter).await
    }

    /// Lists the user's animals matching `filter`, newest first.
    pub async fn find_animals(
        &self,
        user: &UserId,
        filter: &AnimalFilter,
    ) -> Result<Vec<Animal>, LedgerError> {
        let mut animals: Vec<Animal> = self
            .store
            .list_animals(user.as_str())
            .await?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        animals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(animals)
    }

    /// Retrieves one animal.
    pub async fn get_animal(&self, user: &UserId, id: &AnimalId) -> Result<Animal, LedgerError> {
        self.store
            .get_animal(user.as_str(), id)
            .await?
            .ok_or(LedgerError::NotFound(ANIMAL_NOT_FOUND))
    }

    /// Validates `form` and stores a new animal owned by `user`.
    pub async fn add_animal(&self, user: &UserId, form: AnimalForm) -> Result<Animal, LedgerError> {
        let valid = form.validate()?;
        let animal = valid.into_animal(AnimalId::random(), user.as_str(), Utc::now());
        self.store.create_animal(user.as_str(), &animal).await?;
        tracing::info!(user = %user, animal = %animal.id, "created animal");
        Ok(animal)
    }

    /// Replaces the profile fields of an animal, keeping its history.
    pub async fn update_animal(
        &self,
        user: &UserId,
        id: &AnimalId,
        form: AnimalForm,
    ) -> Result<Animal, LedgerError> {
        let valid = form.validate()?;
        let animal = self
            .modify_animal(user, id, ANIMAL_NOT_FOUND, |animal| {
                valid.apply_to(animal, Utc::now());
                Ok(())
            })
            .await?;
        tracing::info!(user = %user, animal = %id, "updated animal");
        Ok(animal)
    }

    /// Removes an animal and everything recorded for it.
    pub async fn delete_animal(&self, user: &UserId, id: &AnimalId) -> Result<(), LedgerError> {
        if !self.store.delete_animal(user.as_str(), id).await? {
            return Err(LedgerError::NotFound(ANIMAL_NOT_FOUND));
        }
        tracing::info!(user = %user, animal = %id, "deleted animal");
        Ok(())
    }

    /// Appends a weight measurement taken now.
    pub async fn add_weight_record(
        &self,
        user: &UserId,
        id: &AnimalId,
        request: WeightRequest,
    ) -> Result<Animal, LedgerError> {
        if !request.weight.is_finite() || request.weight <= 0.0 {
            return Err(LedgerError::Validation(
                "Weight must be a positive number".to_string(),
            ));
        }
        self.modify_animal(user, id, ANIMAL_NOT_FOUND, |animal| {
            let now = Utc::now();
            animal.weight.push(WeightRecord {
                date: now,
                weight: request.weight,
                unit: request.unit,
                notes: crate::animal::non_empty(request.notes),
            });
            animal.updated_at = now;
            Ok(())
        })
        .await
    }

    /// Appends a height measurement taken now.
    pub async fn add_height_record(
        &self,
        user: &UserId,
        id: &AnimalId,
        request: HeightRequest,
    ) -> Result<Animal, LedgerError> {
        if !request.height.is_finite() || request.height <= 0.0 {
            return Err(LedgerError::Validation(
                "Height must be a positive number".to_string(),
            ));
        }
        self.modify_animal(user, id, ANIMAL_NOT_FOUND, |animal| {
            let now = Utc::now();
            animal.height.push(HeightRecord {
                date: now,
                height: request.height,
                unit: request.unit,
                measurement_type: request.measurement_type,
                notes: crate::animal::non_empty(request.notes),
            });
            animal.updated_at = now;
            Ok(())
        })
        .await
    }

    ////////////////////////////////////////////// Events /////////////////////////////////////////////

    /// Validates `request` and adds it to the animal's timeline.
    pub async fn add_event(
        &self,
        user: &UserId,
        id: &AnimalId,
        request: EventRequest,
    ) -> Result<Animal, LedgerError> {
        let valid = request.validate()?;
        let animal = self
            .modify_animal(user, id, ANIMAL_NOT_FOUND, |animal| {
                let now = Utc::now();
                animal.events.push(valid.into_entry(now));
                sort_timeline(&mut animal.events);
                animal.updated_at = now;
                Ok(())
            })
            .await?;
        tracing::info!(user = %user, animal = %id, "added event");
        Ok(animal)
    }

    /// Replaces an event wholesale, keeping its id and creation time.
    pub async fn update_event(
        &self,
        user: &UserId,
        id: &AnimalId,
        event_id: &EventId,
        request: EventRequest,
    ) -> Result<Animal, LedgerError> {
        let valid = request.validate()?;
        self.modify_animal(user, id, EVENT_NOT_FOUND, |animal| {
            let now = Utc::now();
            let entry = animal
                .events
                .iter_mut()
                .find(|e| e.id == *event_id)
                .ok_or(LedgerError::NotFound(EVENT_NOT_FOUND))?;
            valid.apply_to(entry, now);
            sort_timeline(&mut animal.events);
            animal.updated_at = now;
            Ok(())
        })
        .await
    }

    /// Removes one event from the timeline.
    pub async fn delete_event(
        &self,
        user: &UserId,
        id: &AnimalId,
        event_id: &EventId,
    ) -> Result<Animal, LedgerError> {
        self.modify_animal(user, id, EVENT_NOT_FOUND, |animal| {
            let before = animal.events.len();
            animal.events.retain(|e| e.id != *event_id);
            if animal.events.len() == before {
                return Err(LedgerError::NotFound(EVENT_NOT_FOUND));
            }
            sort_timeline(&mut animal.events);
            animal.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    /// The animal's events decorated for display, newest first.
    pub async fn timeline(
        &self,
        user: &UserId,
        id: &AnimalId,
        filter: Option<EventType>,
    ) -> Result<Vec<TimelineEntry>, LedgerError> {
        let animal = self.get_animal(user, id).await?;
        let settings = self.get_settings(user).await?;
        Ok(build_timeline(&animal, filter, &settings))
    }

    ///////////////////////////////////////////// Settings ////////////////////////////////////////////

    /// The user's settings, storing defaults on first access.
    pub async fn get_settings(&self, user: &UserId) -> Result<AppSettings, LedgerError> {
        if let Some(settings) = self.store.get_settings(user.as_str()).await? {
            return Ok(settings);
        }
        let settings = AppSettings::defaults(Utc::now());
        self.store.put_settings(user.as_str(), &settings).await?;
        tracing::info!(user = %user, "created default settings");
        Ok(settings)
    }

    /// Replaces the editable sections of the user's settings.
    pub async fn update_settings(
        &self,
        user: &UserId,
        form: SettingsForm,
    ) -> Result<AppSettings, LedgerError> {
        let form = form.validate()?;
        let mut settings = self.get_settings(user).await?;
        form.apply_to(&mut settings, Utc::now());
        self.store.put_settings(user.as_str(), &settings).await?;
        tracing::info!(user = %user, "updated settings");
        Ok(settings)
    }

    /// Replaces the user's settings with fresh defaults under a new id.
    pub async fn reset_settings(&self, user: &UserId) -> Result<AppSettings, LedgerError> {
        let settings = AppSettings::defaults(Utc::now());
        self.store.put_settings(user.as_str(), &settings).await?;
        tracing::info!(user = %user, "reset settings");
        Ok(settings)
    }

    ////////////////////////////////////////////// Stats //////////////////////////////////////////////

    /// Dashboard statistics over all of the user's animals.
    pub async fn dashboard_stats(&self, user: &UserId) -> Result<DashboardStats, LedgerError> {
        let animals = self.store.list_animals(user.as_str()).await?;
        let settings = self.get_settings(user).await?;
        Ok(DashboardStats::compute(
            &animals,
            &settings,
            Utc::now().date_naive(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{sample_form, test_ledger};

    fn alice() -> UserId {
        UserId::new("alice")
    }

    fn event(event_type: &str, title: &str, date: &str) -> EventRequest {
        EventRequest {
            event_type: Some(event_type.to_string()),
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            ..EventRequest::default()
        }
    }

    #[tokio::test]
    async fn add_then_get() {
        let ledger = test_ledger();
        let mut form = sample_form("Rex");
        form.initial_weight = Some(40.0);
        let created = ledger.add_animal(&alice(), form).await.unwrap();
        assert_eq!(created.weight[0].notes.as_deref(), Some("Initial weight record"));

        let fetched = ledger.get_animal(&alice(), &created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(
            ledger.get_animal(&UserId::new("bob"), &created.id).await,
            Err(LedgerError::NotFound("Animal not found"))
        );
    }

    #[tokio::test]
    async fn add_rejects_missing_name() {
        let ledger = test_ledger();
        let result = ledger.add_animal(&alice(), sample_form("")).await;
        assert_eq!(
            result,
            Err(LedgerError::Validation(
                "Missing required field: name".to_string()
            ))
        );
        assert!(ledger.store().list_animals("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_events_and_appends_weight() {
        let ledger = test_ledger();
        let created = ledger.add_animal(&alice(), sample_form("Rex")).await.unwrap();
        ledger
            .add_event(&alice(), &created.id, event("medical", "Checkup", "2024-01-01"))
            .await
            .unwrap();

        let mut edit = sample_form("Rex");
        edit.initial_weight = Some(42.0);
        let updated = ledger
            .update_animal(&alice(), &created.id, edit)
            .await
            .unwrap();
        assert_eq!(updated.events.len(), 1);
        assert_eq!(updated.weight.len(), 1);
        assert_eq!(updated.weight[0].notes.as_deref(), Some("Updated weight record"));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.user_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn delete_missing_animal_is_not_found() {
        let ledger = test_ledger();
        assert_eq!(
            ledger.delete_animal(&alice(), &AnimalId::random()).await,
            Err(LedgerError::NotFound("Animal not found"))
        );
    }

    #[tokio::test]
    async fn events_stay_sorted_through_mutations() {
        let ledger = test_ledger();
        let id = ledger.add_animal(&alice(), sample_form("Rex")).await.unwrap().id;
        for (title, date) in [("B", "2024-02-01"), ("A", "2024-01-01"), ("C", "2024-03-01")] {
            ledger
                .add_event(&alice(), &id, event("general", title, date))
                .await
                .unwrap();
        }
        let animal = ledger.get_animal(&alice(), &id).await.unwrap();
        let titles: Vec<&str> = animal.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);

        // Move A to the front.
        let a_id = animal.events[2].id.clone();
        let animal = ledger
            .update_event(&alice(), &id, &a_id, event("grooming", "A", "2024-04-01"))
            .await
            .unwrap();
        assert_eq!(animal.events[0].id, a_id);
        assert_eq!(animal.events[0].event_type, EventType::Grooming);

        let animal = ledger.delete_event(&alice(), &id, &a_id).await.unwrap();
        let titles: Vec<&str> = animal.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let ledger = test_ledger();
        let id = ledger.add_animal(&alice(), sample_form("Rex")).await.unwrap().id;
        let missing = EventId::from("nope");
        assert_eq!(
            ledger
                .update_event(&alice(), &id, &missing, event("general", "X", "2024-01-01"))
                .await,
            Err(LedgerError::NotFound("Animal or event not found"))
        );
        assert_eq!(
            ledger.delete_event(&alice(), &id, &missing).await,
            Err(LedgerError::NotFound("Animal or event not found"))
        );
    }

    #[tokio::test]
    async fn event_validation_precedes_lookup() {
        let ledger = test_ledger();
        let result = ledger
            .add_event(&alice(), &AnimalId::random(), event("general", "X", "nope"))
            .await;
        assert_eq!(
            result,
            Err(LedgerError::Validation("Invalid date format".to_string()))
        );
    }

    #[tokio::test]
    async fn list_defaults_follow_show_deceased() {
        let ledger = test_ledger();
        ledger.add_animal(&alice(), sample_form("Alive")).await.unwrap();
        let mut gone = sample_form("Gone");
        gone.date_of_birth = Some("2010-01-01".to_string());
        gone.death_date = Some("2020-01-01".to_string());
        ledger.add_animal(&alice(), gone).await.unwrap();

        let listed = ledger.list_animals(&alice(), None, None, None).await.unwrap();
        assert_eq!(listed.len(), 1);

        let mut settings = ledger.get_settings(&alice()).await.unwrap();
        settings.display.show_deceased = true;
        let form: SettingsForm =
            serde_json::from_value(serde_json::to_value(&settings).unwrap()).unwrap();
        ledger.update_settings(&alice(), form).await.unwrap();

        let listed = ledger.list_animals(&alice(), None, None, None).await.unwrap();
        assert_eq!(listed.len(), 2);
        let deceased = ledger
            .list_animals(&alice(), None, None, Some(LifeStatus::Deceased))
            .await
            .unwrap();
        assert_eq!(deceased[0].name, "Gone");
    }

    #[tokio::test]
    async fn settings_lifecycle() {
        let ledger = test_ledger();
        let first = ledger.get_settings(&alice()).await.unwrap();
        let again = ledger.get_settings(&alice()).await.unwrap();
        assert_eq!(first.id, again.id);

        let reset = ledger.reset_settings(&alice()).await.unwrap();
        assert_ne!(reset.id, first.id);
        assert_eq!(ledger.get_settings(&alice()).await.unwrap().id, reset.id);
    }

    #[tokio::test]
    async fn timeline_formats_with_settings() {
        let ledger = test_ledger();
        let id = ledger.add_animal(&alice(), sample_form("Rex")).await.unwrap().id;
        let mut req = event("medical", "Vaccination", "2024-03-05");
        req.cost = Some(serde_json::json!(85));
        ledger.add_event(&alice(), &id, req).await.unwrap();
        ledger
            .add_event(&alice(), &id, event("grooming", "Bath", "2024-03-06"))
            .await
            .unwrap();

        let all = ledger.timeline(&alice(), &id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].event.title, "Bath");

        let medical = ledger
            .timeline(&alice(), &id, Some(EventType::Medical))
            .await
            .unwrap();
        assert_eq!(medical.len(), 1);
        assert_eq!(medical[0].formatted_date, "03/05/2024");
        assert_eq!(medical[0].formatted_cost.as_deref(), Some("$85.00"));
        assert_eq!(medical[0].type_label, "Medical");
    }
}
