use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use pet_ledger::{
    AppState, DataStore, DevelopmentAuthenticator, InMemoryDataStore, Ledger, StaticTokenAuthenticator,
    create_router,
};

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

/// Test server over an in-memory store with two known users.
pub struct ApiTestServer {
    pub server: TestServer,
    pub data_store: Arc<InMemoryDataStore>,
}

impl Default for ApiTestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiTestServer {
    pub fn new() -> Self {
        let data_store = Arc::new(InMemoryDataStore::new());
        let authenticator =
            StaticTokenAuthenticator::new([(ALICE, "alice"), (BOB, "bob")]);
        let state = AppState::new(Ledger::new(data_store.clone()), Arc::new(authenticator));
        let server = TestServer::new(create_router(state)).unwrap();
        Self { server, data_store }
    }

    async fn create_animal(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/v1/animal")
            .authorization_bearer(token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
        response.json::<Value>()
    }

    async fn create_event(&self, token: &str, animal_id: &str, body: Value) -> Value {
        let response = self
            .server
            .post(&format!("/api/v1/animal/{}/event", animal_id))
            .authorization_bearer(token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
        response.json::<Value>()
    }
}

fn rex() -> Value {
    json!({
        "name": "Rex",
        "species": "dog",
        "breed": "Beagle",
        "dateOfBirth": "2019-06-15",
        "sex": "male",
        "initialWeight": 22.5,
        "weightUnit": "lbs",
        "ownerName": "Sam Rivera"
    })
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let api = ApiTestServer::new();
    let response = api.server.get("/api/v1/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"status": "ok"}));
}

#[tokio::test]
async fn missing_or_unknown_credentials_are_rejected() {
    let api = ApiTestServer::new();

    let response = api.server.get("/api/v1/animal").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Authentication required"})
    );

    let response = api
        .server
        .get("/api/v1/animal")
        .authorization_bearer("stolen")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn development_auth_still_requires_a_header() {
    let state = AppState::new(
        Ledger::new(Arc::new(InMemoryDataStore::new())),
        Arc::new(DevelopmentAuthenticator),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/api/v1/settings").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/v1/settings")
        .authorization_bearer("not-a-jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn create_and_fetch_animal() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;

    assert_eq!(created["name"], "Rex");
    assert_eq!(created["species"], "dog");
    assert_eq!(created["weight"][0]["notes"], "Initial weight record");
    assert_eq!(created["ownerInfo"]["name"], "Sam Rivera");

    let response = api
        .server
        .get(&format!("/api/v1/animal/{}", id_of(&created)))
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["id"], created["id"]);
}

#[tokio::test]
async fn create_requires_a_name() {
    let api = ApiTestServer::new();
    let response = api
        .server
        .post("/api/v1/animal")
        .authorization_bearer(ALICE)
        .json(&json!({"species": "cat"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Missing required field: name"})
    );
}

#[tokio::test]
async fn form_bodies_send_every_field_as_text() {
    let api = ApiTestServer::new();
    let created = api
        .create_animal(
            ALICE,
            json!({
                "name": "Rex",
                "species": "dog",
                "breed": "",
                "dateOfBirth": "",
                "initialWeight": "",
                "weightUnit": "",
                "initialHeight": "",
                "heightUnit": "",
                "heightMeasurementType": "",
                "ownerName": ""
            }),
        )
        .await;
    assert_eq!(created["name"], "Rex");
    assert_eq!(created["weight"], json!([]));
    assert_eq!(created["height"], json!([]));

    let created = api
        .create_animal(
            ALICE,
            json!({
                "name": "Bruno",
                "species": "dog",
                "initialWeight": "40",
                "weightUnit": "lbs",
                "initialHeight": "22.5",
                "heightUnit": "inches",
                "heightMeasurementType": "withers"
            }),
        )
        .await;
    assert_eq!(created["weight"][0]["weight"], 40.0);
    assert_eq!(created["weight"][0]["unit"], "lbs");
    assert_eq!(created["height"][0]["height"], 22.5);
    assert_eq!(created["height"][0]["measurementType"], "withers");

    let cases = [
        (
            json!({"name": "Rex", "species": ""}),
            "Missing required field: species",
        ),
        (
            json!({"name": "Rex", "species": "dog", "initialWeight": "heavy"}),
            "Weight must be a positive number",
        ),
    ];
    for (body, message) in cases {
        let response = api
            .server
            .post("/api/v1/animal")
            .authorization_bearer(ALICE)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>(), json!({"error": message}));
    }
}

#[tokio::test]
async fn animals_are_private_to_their_owner() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let path = format!("/api/v1/animal/{}", id_of(&created));

    let response = api.server.get(&path).authorization_bearer(BOB).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>(), json!({"error": "Animal not found"}));

    let response = api.server.get("/api/v1/animal").authorization_bearer(BOB).await;
    assert_eq!(response.json::<Vec<Value>>().len(), 0);

    let response = api.server.delete(&path).authorization_bearer(BOB).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let api = ApiTestServer::new();
    let response = api
        .server
        .get("/api/v1/animal/not-a-uuid")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({"error": "Invalid animal ID"}));
}

#[tokio::test]
async fn list_filters_by_search_species_and_status() {
    let api = ApiTestServer::new();
    api.create_animal(ALICE, rex()).await;
    api.create_animal(
        ALICE,
        json!({"name": "Comet", "species": "horse", "sex": "female"}),
    )
    .await;
    api.create_animal(
        ALICE,
        json!({
            "name": "Old Tom",
            "species": "cat",
            "dateOfBirth": "2005-01-01",
            "deathDate": "2020-01-01"
        }),
    )
    .await;

    let names = |animals: Vec<Value>| -> Vec<String> {
        animals
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect()
    };

    let response = api.server.get("/api/v1/animal").authorization_bearer(ALICE).await;
    assert_eq!(names(response.json()), vec!["Comet", "Rex"]);

    let response = api
        .server
        .get("/api/v1/animal")
        .add_query_param("status", "")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(names(response.json()), vec!["Comet", "Rex"]);

    let response = api
        .server
        .get("/api/v1/animal")
        .add_query_param("status", "all")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(names(response.json()), vec!["Old Tom", "Comet", "Rex"]);

    let response = api
        .server
        .get("/api/v1/animal")
        .add_query_param("status", "deceased")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(names(response.json()), vec!["Old Tom"]);

    let response = api
        .server
        .get("/api/v1/animal")
        .add_query_param("search", "BEAG")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(names(response.json()), vec!["Rex"]);

    let response = api
        .server
        .get("/api/v1/animal")
        .add_query_param("species", "horse")
        .authorization_bearer(ALICE)
        .await;
    assert_eq!(names(response.json()), vec!["Comet"]);
}

#[tokio::test]
async fn update_keeps_identity_and_appends_measurements() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let path = format!("/api/v1/animal/{}", id_of(&created));

    let mut form = rex();
    form["name"] = json!("Rexy");
    form["initialWeight"] = json!(24.0);
    let response = api
        .server
        .put(&path)
        .authorization_bearer(ALICE)
        .json(&form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["name"], "Rexy");
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["weight"].as_array().unwrap().len(), 2);
    assert_eq!(updated["weight"][1]["notes"], "Updated weight record");
}

#[tokio::test]
async fn weight_and_height_records() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let id = id_of(&created);

    let response = api
        .server
        .post(&format!("/api/v1/animal/{}/weight", id))
        .authorization_bearer(ALICE)
        .json(&json!({"weight": 10.2, "unit": "kg"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let animal = response.json::<Value>();
    assert_eq!(animal["weight"].as_array().unwrap().len(), 2);

    let response = api
        .server
        .post(&format!("/api/v1/animal/{}/height", id))
        .authorization_bearer(ALICE)
        .json(&json!({"height": 15.1, "unit": "hands", "measurementType": "withers"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let animal = response.json::<Value>();
    assert_eq!(animal["height"][0]["measurementType"], "withers");
}

#[tokio::test]
async fn delete_animal_then_404() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let path = format!("/api/v1/animal/{}", id_of(&created));

    let response = api.server.delete(&path).authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"success": true}));

    let response = api.server.get(&path).authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_validation_messages() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let path = format!("/api/v1/animal/{}/event", id_of(&created));

    let cases = [
        (json!({"title": "Shots"}), "Missing required fields: type, title, date"),
        (
            json!({"type": "medical", "title": "Shots", "date": "someday"}),
            "Invalid date format",
        ),
        (
            json!({"type": "medical", "title": "Shots", "date": "2024-03-01", "cost": "-4"}),
            "Cost must be a valid positive number",
        ),
        (
            json!({"type": "party", "title": "Shots", "date": "2024-03-01"}),
            "Invalid event type",
        ),
    ];
    for (body, message) in cases {
        let response = api
            .server
            .post(&path)
            .authorization_bearer(ALICE)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>(), json!({"error": message}));
    }
}

#[tokio::test]
async fn timeline_is_newest_first_and_filterable() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let id = id_of(&created);

    api.create_event(
        ALICE,
        &id,
        json!({"type": "medical", "title": "Rabies shot", "date": "2024-01-10", "cost": 45}),
    )
    .await;
    let animal = api
        .create_event(
            ALICE,
            &id,
            json!({"type": "grooming", "title": "Bath", "date": "2024-03-02"}),
        )
        .await;
    assert_eq!(animal["events"][0]["title"], "Bath");

    let response = api
        .server
        .get(&format!("/api/v1/animal/{}/event", id))
        .authorization_bearer(ALICE)
        .await;
    let timeline = response.json::<Vec<Value>>();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0]["title"], "Bath");
    assert_eq!(timeline[1]["formattedCost"], "$45.00");
    assert_eq!(timeline[1]["formattedDate"], "01/10/2024");
    assert_eq!(timeline[1]["typeLabel"], "Medical");

    let response = api
        .server
        .get(&format!("/api/v1/animal/{}/event", id))
        .add_query_param("type", "medical")
        .authorization_bearer(ALICE)
        .await;
    let timeline = response.json::<Vec<Value>>();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0]["type"], "medical");
}

#[tokio::test]
async fn update_and_delete_events() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    let id = id_of(&created);
    let animal = api
        .create_event(
            ALICE,
            &id,
            json!({"type": "medical", "title": "Checkup", "date": "2024-01-10"}),
        )
        .await;
    let event_id = animal["events"][0]["id"].as_str().unwrap().to_string();
    let event_path = format!("/api/v1/animal/{}/event/{}", id, event_id);

    let response = api
        .server
        .put(&event_path)
        .authorization_bearer(ALICE)
        .json(&json!({"type": "medical", "title": "Annual checkup", "date": "2024-01-11"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let animal = response.json::<Value>();
    assert_eq!(animal["events"][0]["id"], event_id.as_str());
    assert_eq!(animal["events"][0]["title"], "Annual checkup");

    let response = api
        .server
        .put(&format!("/api/v1/animal/{}/event/missing", id))
        .authorization_bearer(ALICE)
        .json(&json!({"type": "medical", "title": "X", "date": "2024-01-11"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Animal or event not found"})
    );

    let response = api.server.delete(&event_path).authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = api.server.delete(&event_path).authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn yaml_bodies_are_accepted() {
    let api = ApiTestServer::new();
    let yaml = "name: Comet\nspecies: horse\ninitialHeight: 15.2\nheightUnit: hands\n";
    let response = api
        .server
        .post("/api/v1/animal")
        .authorization_bearer(ALICE)
        .bytes(Bytes::from(yaml))
        .content_type("application/yaml")
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let animal = response.json::<Value>();
    assert_eq!(animal["height"][0]["unit"], "hands");

    let response = api
        .server
        .post("/api/v1/animal")
        .authorization_bearer(ALICE)
        .bytes(Bytes::from("name: [unclosed"))
        .content_type("application/yaml")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({"error": "Invalid YAML body"}));
}

#[tokio::test]
async fn settings_lifecycle() {
    let api = ApiTestServer::new();

    let response = api.server.get("/api/v1/settings").authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let settings = response.json::<Value>();
    assert_eq!(settings["currency"]["code"], "USD");
    assert_eq!(settings["display"]["dateFormat"], "MM/DD/YYYY");

    let mut form = settings.clone();
    form["currency"] = json!({"code": "EUR", "symbol": "€", "position": "after", "decimals": 2});
    let response = api
        .server
        .put("/api/v1/settings")
        .authorization_bearer(ALICE)
        .json(&form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["currency"]["code"], "EUR");
    assert_eq!(updated["id"], settings["id"]);

    let response = api
        .server
        .put("/api/v1/settings")
        .authorization_bearer(ALICE)
        .json(&json!({"currency": {"code": "EUR"}}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Invalid settings data"})
    );

    let response = api.server.delete("/api/v1/settings").authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let reset = response.json::<Value>();
    assert_eq!(reset["currency"]["code"], "USD");
    assert_ne!(reset["id"], settings["id"]);

    let response = api
        .server
        .get("/api/v1/settings/currencies")
        .authorization_bearer(ALICE)
        .await;
    let currencies = response.json::<Vec<Value>>();
    assert_eq!(currencies.len(), 10);
    assert_eq!(currencies[0]["code"], "USD");
}

#[tokio::test]
async fn currency_settings_drive_formatted_costs() {
    let api = ApiTestServer::new();
    let response = api.server.get("/api/v1/settings").authorization_bearer(ALICE).await;
    let mut form = response.json::<Value>();
    form["currency"] = json!({"code": "JPY", "symbol": "¥", "position": "before", "decimals": 0});
    form["display"]["dateFormat"] = json!("YYYY-MM-DD");
    api.server
        .put("/api/v1/settings")
        .authorization_bearer(ALICE)
        .json(&form)
        .await;

    let created = api.create_animal(ALICE, rex()).await;
    let id = id_of(&created);
    api.create_event(
        ALICE,
        &id,
        json!({"type": "nutrition", "title": "Food", "date": "2024-02-03", "cost": "1200"}),
    )
    .await;

    let response = api
        .server
        .get(&format!("/api/v1/animal/{}/event", id))
        .authorization_bearer(ALICE)
        .await;
    let timeline = response.json::<Vec<Value>>();
    assert_eq!(timeline[0]["formattedCost"], "¥1200");
    assert_eq!(timeline[0]["formattedDate"], "2024-02-03");
}

#[tokio::test]
async fn stats_summarize_the_user() {
    let api = ApiTestServer::new();
    let created = api.create_animal(ALICE, rex()).await;
    api.create_event(
        ALICE,
        &id_of(&created),
        json!({"type": "medical", "title": "Shots", "date": "2024-01-10", "cost": 30.5}),
    )
    .await;
    api.create_animal(ALICE, json!({"name": "Comet", "species": "horse"}))
        .await;
    api.create_animal(BOB, json!({"name": "Felix", "species": "cat"}))
        .await;

    let response = api.server.get("/api/v1/stats").authorization_bearer(ALICE).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let stats = response.json::<Value>();
    assert_eq!(stats["totalAnimals"], 2);
    assert_eq!(stats["aliveAnimals"], 2);
    assert_eq!(stats["deceasedAnimals"], 0);
    assert_eq!(stats["totalCosts"], 30.5);
    assert_eq!(stats["formattedTotalCosts"], "$30.50");
    assert_eq!(stats["recentlyAdded"][0]["name"], "Comet");
    assert_eq!(stats["topSpecies"].as_array().unwrap().len(), 2);

    assert_eq!(api.data_store.list_animals("bob").await.unwrap().len(), 1);
}
