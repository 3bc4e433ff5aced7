//! Error handling for the kehilla client

use std::fmt;
use thiserror::Error;

/// Detailed error payload returned by the data API (PostgREST shape).
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for the kehilla client and services.
///
/// The taxonomy mirrors what the sites actually distinguish: remote-call
/// failures, database errors, and client-side validation failures. An absent
/// single row is deliberately NOT an error; single-row lookups return
/// `Ok(None)` so callers can fall back to defaults.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Structured error from the data API
    #[error("Database error: {details} (Status: {status})")]
    Database {
        details: ApiErrorDetails,
        status: reqwest::StatusCode,
    },

    /// Unparseable error from the data API
    #[error("Database error (unparsed): {message} (Status: {status})")]
    UnparsedDatabase {
        message: String,
        status: reqwest::StatusCode,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Client-side validation failure; caught before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}
