//! # Error Extensions for Handled
//!
//! Implements Handle<UserError> for error types petctl can run into so they
//! print with a usage hint.

use super::errors::UserError;
use crate::AnimalIdParseError;
use crate::http_utils::HttpError;
use handled::Handle;

impl Handle<UserError> for AnimalIdParseError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("Invalid animal ID '{}'", self.input()),
            usage_hint: Some(
                "Animal IDs are UUIDs, e.g. 8c5e1a4e-3f5a-4c1e-9d4b-0a8e2f0b7c11; run 'petctl animal list' to see them"
                    .to_string(),
            ),
        })
    }
}

impl Handle<UserError> for HttpError {
    fn handle(&self) -> Option<UserError> {
        let usage_hint = match self.status().as_u16() {
            404 => Some("The requested record was not found. Check the ID and try again.".to_string()),
            400 => Some("Invalid request. Check your input data and try again.".to_string()),
            401 => Some("Authentication required. Pass --token <bearer token>.".to_string()),
            500..=599 => {
                Some("Server error. The service may be temporarily unavailable.".to_string())
            }
            _ => None,
        };
        Some(UserError {
            message: self.to_string(),
            usage_hint,
        })
    }
}

impl Handle<UserError> for serde_json::Error {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("JSON parsing error: {}", self),
            usage_hint: Some(
                "Ensure the JSON is properly formatted and contains all required fields"
                    .to_string(),
            ),
        })
    }
}

impl Handle<UserError> for serde_yml::Error {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("YAML parsing error: {}", self),
            usage_hint: Some("Check indentation and field names in the YAML file".to_string()),
        })
    }
}

impl Handle<UserError> for std::io::Error {
    fn handle(&self) -> Option<UserError> {
        let hint = match self.kind() {
            std::io::ErrorKind::NotFound => {
                Some("The specified file was not found. Check the file path.".to_string())
            }
            std::io::ErrorKind::PermissionDenied => {
                Some("Permission denied. Check file permissions.".to_string())
            }
            std::io::ErrorKind::InvalidData => Some("The file contains invalid data.".to_string()),
            _ => None,
        };

        Some(UserError {
            message: format!("File operation error: {}", self),
            usage_hint: hint,
        })
    }
}
