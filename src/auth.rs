//! # Authentication
//!
//! Requests carry `Authorization: Bearer <credential>`. An [`Authenticator`]
//! turns the credential into the [`UserId`] that scopes every record the
//! request touches. Verifying tokens against an identity provider is the
//! provider's job; this crate ships two local authenticators:
//!
//! - [`DevelopmentAuthenticator`] trusts the payload of a JWT without checking
//!   its signature and falls back to `dev-user` when it cannot decode one.
//! - [`StaticTokenAuthenticator`] accepts only configured opaque tokens.
//!
//! A request without a bearer credential is rejected by both.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::ApiError;
use crate::router::AppState;

/// User id assumed by the development authenticator for undecodable tokens.
pub const DEVELOPMENT_USER: &str = "dev-user";

/////////////////////////////////////////////// UserId /////////////////////////////////////////////////

/// The owner of a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////// AuthError ///////////////////////////////////////////////

/// Reasons a request could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header was sent.
    MissingCredentials,
    /// The credential was present but not accepted.
    InvalidCredentials,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MissingCredentials => write!(f, "missing bearer credentials"),
            Self::InvalidCredentials => write!(f, "invalid bearer credentials"),
        }
    }
}

impl std::error::Error for AuthError {}

//////////////////////////////////////////// Authenticators ////////////////////////////////////////////

/// Maps a bearer credential to the user it belongs to.
pub trait Authenticator: Send + Sync {
    /// Returns the user owning `token`.
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Reads the user out of an unverified JWT payload.
///
/// Only suitable for local development.
#[derive(Debug, Clone, Default)]
pub struct DevelopmentAuthenticator;

fn user_from_jwt(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    ["user_id", "sub", "uid"]
        .iter()
        .filter_map(|claim| claims.get(*claim).and_then(|v| v.as_str()))
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

impl Authenticator for DevelopmentAuthenticator {
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        match user_from_jwt(token) {
            Some(user) => Ok(UserId::new(user)),
            None => {
                tracing::debug!("undecodable development token; using {}", DEVELOPMENT_USER);
                Ok(UserId::new(DEVELOPMENT_USER))
            }
        }
    }
}

/// Accepts a fixed set of opaque tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenAuthenticator {
    /// Creates an authenticator from `token -> user id` pairs.
    pub fn new<I, K, V>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, user)| (token.into(), UserId::new(user)))
                .collect(),
        }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }
}

////////////////////////////////////////////// Extractor ///////////////////////////////////////////////

/// Extracts the bearer credential from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

/// The authenticated user of a request.
///
/// Rejects with 401 `Authentication required`.
pub struct CurrentUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), "{}", e);
            ApiError::unauthorized()
        })?;
        let user = state.authenticator.authenticate(token).map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), "{}", e);
            ApiError::unauthorized()
        })?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn development_reads_claims_in_order() {
        let auth = DevelopmentAuthenticator;
        let token = jwt(serde_json::json!({"user_id": "u1", "sub": "s1"}));
        assert_eq!(auth.authenticate(&token), Ok(UserId::new("u1")));
        let token = jwt(serde_json::json!({"sub": "s1"}));
        assert_eq!(auth.authenticate(&token), Ok(UserId::new("s1")));
        let token = jwt(serde_json::json!({"uid": "x9"}));
        assert_eq!(auth.authenticate(&token), Ok(UserId::new("x9")));
    }

    #[test]
    fn development_falls_back() {
        let auth = DevelopmentAuthenticator;
        assert_eq!(auth.authenticate("garbage"), Ok(UserId::new(DEVELOPMENT_USER)));
        let token = jwt(serde_json::json!({"email": "a@b.c"}));
        assert_eq!(auth.authenticate(&token), Ok(UserId::new(DEVELOPMENT_USER)));
    }

    #[test]
    fn static_tokens() {
        let auth = StaticTokenAuthenticator::new([("secret", "alice")]);
        assert_eq!(auth.authenticate("secret"), Ok(UserId::new("alice")));
        assert_eq!(
            auth.authenticate("nope"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingCredentials));
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc"),
        );
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingCredentials));
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok"),
        );
        assert_eq!(bearer_token(&headers), Ok("tok"));
    }
}
