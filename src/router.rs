use std::sync::Arc;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;

use crate::auth::Authenticator;
use crate::{
    ApiError, Ledger, create_animal_router, create_event_router, create_settings_router,
    create_stats_router,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Record operations.
    pub ledger: Ledger,
    /// Resolves bearer credentials to users.
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    /// Bundles a ledger with an authenticator.
    pub fn new(ledger: Ledger, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            ledger,
            authenticator,
        }
    }
}

/// A request body decoded from JSON or YAML based on `Content-Type`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("Failed to read request body"))?;

        let value = if content_type.contains("yaml") || content_type.contains("yml") {
            serde_yml::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(error = %e, "rejected yaml body");
                ApiError::bad_request("Invalid YAML body")
            })?
        } else {
            serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(error = %e, "rejected json body");
                ApiError::bad_request("Invalid JSON body")
            })?
        };

        Ok(Payload(value))
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles every endpoint under `/api/v1`.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(create_animal_router(state.clone()))
        .merge(create_event_router(state.clone()))
        .merge(create_settings_router(state.clone()))
        .merge(create_stats_router(state));

    Router::new().nest("/api/v1", api)
}
