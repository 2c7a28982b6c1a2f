use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Value, json};

use pet_ledger::derived::{calculate_age, format_currency, next_birthday};
use pet_ledger::{
    AppState, CurrencyPosition, CurrencySettings, EventEntry, EventId, EventType,
    InMemoryDataStore, Ledger, StaticTokenAuthenticator, create_router, sort_timeline,
};

/// Test infrastructure for property testing the pet-ledger API
pub struct ApiTestServer {
    pub server: TestServer,
}

impl Default for ApiTestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiTestServer {
    /// Create a new test server with a fresh in-memory data store
    pub fn new() -> Self {
        let ledger = Ledger::new(Arc::new(InMemoryDataStore::new()));
        let authenticator = StaticTokenAuthenticator::new([("token", "owner")]);
        let server =
            TestServer::new(create_router(AppState::new(ledger, Arc::new(authenticator)))).unwrap();
        Self { server }
    }
}

/// Property test strategies for generating test data
pub mod strategies {
    use super::*;
    use proptest::string::string_regex;

    /// Strategy for calendar dates between 1990 and 2040
    pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..18_250).prop_map(|offset| {
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(offset)
        })
    }

    /// Strategy for instants within a few years of 2024
    pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..200_000_000).prop_map(|secs| {
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
        })
    }

    pub fn event_type_strategy() -> impl Strategy<Value = EventType> {
        proptest::sample::select(EventType::ALL.to_vec())
    }

    pub fn event_strategy() -> impl Strategy<Value = EventEntry> {
        (
            instant_strategy(),
            event_type_strategy(),
            string_regex(r"[A-Za-z][A-Za-z ]{0,20}").unwrap(),
            proptest::option::of(0.0f64..10_000.0),
        )
            .prop_map(|(date, event_type, title, cost)| {
                let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
                EventEntry {
                    id: EventId::random(),
                    date,
                    event_type,
                    title,
                    description: None,
                    notes: None,
                    veterinarian: None,
                    cost,
                    attachments: Vec::new(),
                    created_at: created,
                    updated_at: created,
                }
            })
    }

    pub fn currency_strategy() -> impl Strategy<Value = CurrencySettings> {
        (
            prop_oneof![Just("$"), Just("€"), Just("£"), Just("¥"), Just("R$")],
            prop_oneof![Just(CurrencyPosition::Before), Just(CurrencyPosition::After)],
            0u8..=4,
        )
            .prop_map(|(symbol, position, decimals)| CurrencySettings {
                code: "XXX".to_string(),
                symbol: symbol.to_string(),
                position,
                decimals,
            })
    }

    pub fn animal_name_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Z][a-z]{1,12}").unwrap()
    }
}

use strategies::*;

proptest! {
    #[test]
    fn timeline_sort_is_newest_first(mut events in proptest::collection::vec(event_strategy(), 0..30)) {
        let mut ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
        sort_timeline(&mut events);

        for pair in events.windows(2) {
            prop_assert!(pair[0].date >= pair[1].date);
        }
        let mut sorted_ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
        ids.sort();
        sorted_ids.sort();
        prop_assert_eq!(ids, sorted_ids);
    }

    #[test]
    fn timeline_sort_is_stable_for_equal_dates(
        date in instant_strategy(),
        titles in proptest::collection::vec("[a-z]{1,8}", 1..10),
    ) {
        let mut events: Vec<EventEntry> = titles
            .iter()
            .map(|title| EventEntry {
                id: EventId::from(title.as_str()),
                date,
                event_type: EventType::General,
                title: title.clone(),
                description: None,
                notes: None,
                veterinarian: None,
                cost: None,
                attachments: Vec::new(),
                created_at: date,
                updated_at: date,
            })
            .collect();
        sort_timeline(&mut events);
        let after: Vec<String> = events.into_iter().map(|e| e.title).collect();
        prop_assert_eq!(after, titles);
    }

    #[test]
    fn currency_places_symbol_and_decimals(
        amount in -1_000_000.0f64..1_000_000.0,
        currency in currency_strategy(),
    ) {
        let text = format_currency(amount, &currency);
        let unsigned = text.strip_prefix('-').unwrap_or(&text);
        prop_assert_eq!(text.starts_with('-'), amount < 0.0);

        let digits = match currency.position {
            CurrencyPosition::Before => unsigned.strip_prefix(currency.symbol.as_str()),
            CurrencyPosition::After => unsigned.strip_suffix(currency.symbol.as_str()),
        };
        prop_assert!(digits.is_some(), "symbol misplaced in {:?}", text);
        let digits = digits.unwrap();

        match digits.split_once('.') {
            Some((_, fraction)) => prop_assert_eq!(fraction.len(), currency.decimals as usize),
            None => prop_assert_eq!(currency.decimals, 0),
        }
        let parsed: f64 = digits.parse().unwrap();
        let tolerance = 0.5 * 10f64.powi(-(currency.decimals as i32)) + 1e-6;
        prop_assert!((parsed - amount.abs()).abs() <= tolerance);
    }

    #[test]
    fn age_counts_completed_years(birth in date_strategy(), today in date_strategy()) {
        let age = calculate_age(Some(birth), None, today);
        if birth > today {
            prop_assert_eq!(age, 0);
        } else {
            let years = today.year() - birth.year();
            prop_assert!(age as i32 == years || age as i32 == years - 1);
        }
    }

    #[test]
    fn age_stops_at_death(a in date_strategy(), b in date_strategy(), c in date_strategy()) {
        let mut dates = [a, b, c];
        dates.sort();
        let [birth, death, today] = dates;
        prop_assert_eq!(
            calculate_age(Some(birth), Some(death), today),
            calculate_age(Some(birth), None, death)
        );
    }

    #[test]
    fn next_birthday_is_within_a_year(birth in date_strategy(), today in date_strategy()) {
        let next = next_birthday(birth, today);
        prop_assert!(next >= today);
        prop_assert!((next - today).num_days() <= 366);
        prop_assert_eq!(next.month(), birth.month());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn created_animals_are_listed_newest_first(names in proptest::collection::vec(animal_name_strategy(), 1..6)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let api = ApiTestServer::new();
            for name in &names {
                let response = api
                    .server
                    .post("/api/v1/animal")
                    .authorization_bearer("token")
                    .json(&json!({"name": name, "species": "dog"}))
                    .await;
                prop_assert_eq!(response.status_code(), StatusCode::CREATED);
            }

            let response = api
                .server
                .get("/api/v1/animal")
                .authorization_bearer("token")
                .await;
            let listed: Vec<String> = response
                .json::<Vec<Value>>()
                .iter()
                .map(|a| a["name"].as_str().unwrap().to_string())
                .collect();
            let mut expected = names.clone();
            expected.reverse();
            prop_assert_eq!(listed, expected);
            Ok(())
        })?;
    }
}
