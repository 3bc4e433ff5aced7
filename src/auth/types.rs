//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::session::Session;

/// Authentication response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The user data
    pub user: Option<User>,

    /// The session data, when a session was established
    pub session: Option<Session>,

    /// The access token
    pub access_token: Option<String>,

    /// The refresh token
    pub refresh_token: Option<String>,

    /// The token type
    pub token_type: Option<String>,

    /// The expiry time in seconds
    pub expires_in: Option<i64>,
}

/// User data owned by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: Uuid,

    /// The user's email address
    pub email: Option<String>,

    /// The user's phone number
    pub phone: Option<String>,

    /// The provider-side role (not the application role in `profiles`)
    pub role: Option<String>,

    /// Whether the email has been confirmed
    pub email_confirmed_at: Option<String>,

    /// The last sign-in time
    pub last_sign_in_at: Option<String>,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: HashMap<String, serde_json::Value>,

    /// The user metadata
    #[serde(default)]
    pub user_metadata: HashMap<String, serde_json::Value>,

    /// The creation time
    pub created_at: Option<String>,

    /// The update time
    pub updated_at: Option<String>,
}
