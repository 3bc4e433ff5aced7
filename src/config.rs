//! Configuration options for the backend client

use std::time::Duration;

/// Configuration options for the backend client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout applied to the HTTP client
    pub request_timeout: Option<Duration>,

    /// The database schema served by the data API
    pub db_schema: String,

    /// Redirect target appended to magic-link sign-in requests
    pub magic_link_redirect: Option<String>,

    /// Redirect target appended to password-reset requests
    pub password_reset_redirect: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            magic_link_redirect: None,
            password_reset_redirect: None,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the redirect URL used by magic-link sign-in emails
    pub fn with_magic_link_redirect(mut self, value: &str) -> Self {
        self.magic_link_redirect = Some(value.to_string());
        self
    }

    /// Set the redirect URL used by password-reset emails
    pub fn with_password_reset_redirect(mut self, value: &str) -> Self {
        self.password_reset_redirect = Some(value.to_string());
        self
    }
}
