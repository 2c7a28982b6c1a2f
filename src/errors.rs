//! Error types for pet-ledger operations.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur during data store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStoreError {
    /// The requested item was not found in the data store.
    NotFound,
    /// An item with the same identifier already exists.
    AlreadyExists,
    /// JSON serialization or deserialization failed.
    SerializationError(String),
    /// An I/O operation failed (for persistent storage backends).
    IoError(String),
    /// An internal storage system error occurred.
    Internal(String),
}

impl std::fmt::Display for DataStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Item not found in data store"),
            Self::AlreadyExists => write!(f, "Item already exists in data store"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<sqlx::Error> for DataStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DataStoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DataStoreError::AlreadyExists
            }
            _ => DataStoreError::Internal(e.to_string()),
        }
    }
}

impl From<std::io::Error> for DataStoreError {
    fn from(e: std::io::Error) -> Self {
        DataStoreError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for DataStoreError {
    fn from(e: serde_json::Error) -> Self {
        DataStoreError::SerializationError(e.to_string())
    }
}

impl std::error::Error for DataStoreError {}

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The submitted record failed validation; the message is user-facing.
    Validation(String),
    /// The addressed record does not exist for this user.
    NotFound(&'static str),
    /// The underlying data store failed.
    Store(DataStoreError),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "{}", msg),
            Self::NotFound(what) => write!(f, "{}", what),
            Self::Store(e) => write!(f, "{}", e),
        }
    }
}

impl From<DataStoreError> for LedgerError {
    fn from(e: DataStoreError) -> Self {
        LedgerError::Store(e)
    }
}

impl std::error::Error for LedgerError {}

/// An HTTP error rendered as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status code.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps a ledger failure to a response, using `context` as the generic
    /// message for store failures so internals never leak to clients.
    pub fn from_ledger(error: LedgerError, context: &str) -> Self {
        match error {
            LedgerError::Validation(msg) => Self::bad_request(msg),
            LedgerError::NotFound(what) => Self::not_found(what),
            LedgerError::Store(DataStoreError::NotFound) => Self::not_found("Not found"),
            LedgerError::Store(DataStoreError::AlreadyExists) => {
                Self::new(StatusCode::CONFLICT, "Record already exists")
            }
            LedgerError::Store(e) => {
                tracing::error!(error = %e, "{}", context);
                Self::internal(context)
            }
        }
    }

    /// The HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The user-facing message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::from_ledger(
            LedgerError::Validation("Missing required field: name".to_string()),
            "Failed to create animal",
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Missing required field: name");
    }

    #[test]
    fn store_failure_hides_details() {
        let err = ApiError::from_ledger(
            LedgerError::Store(DataStoreError::IoError("disk full".to_string())),
            "Failed to update animal",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to update animal");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(DataStoreError::from(io), DataStoreError::IoError(_)));
    }
}
