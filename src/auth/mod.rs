//! Identity and session client
//!
//! The hosted identity provider owns sign-up, sign-in, magic links, password
//! resets, and session issuance. This client only calls those endpoints and
//! keeps a local copy of the current session; it never validates credentials
//! itself.

mod session;
mod types;

use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Minimum password length accepted before a request is issued
pub const MIN_PASSWORD_LEN: usize = 6;

/// Client for the identity/session provider
pub struct Auth {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<Mutex<Option<Session>>>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(Mutex::new(None)),
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    fn store_session(&self, result: &AuthResponse) {
        if let Some(ref session) = result.session {
            let mut current = self.session.lock().unwrap();
            *current = Some(session.clone());
        } else if let (Some(access), Some(refresh)) =
            (&result.access_token, &result.refresh_token)
        {
            // Token-grant responses carry the session fields at the top level.
            let mut current = self.session.lock().unwrap();
            *current = Some(Session {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
                token_type: result.token_type.clone().unwrap_or_else(|| "bearer".into()),
                expires_in: result.expires_in.unwrap_or(0),
                expires_at: None,
                user: result.user.clone(),
            });
        }
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        validate_new_password(password, password)?;
        let url = self.get_auth_url("/signup");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        self.store_session(&result);
        Ok(result)
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, Error> {
        let url = self.get_auth_url("/token?grant_type=password");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        body.insert("password".to_string(), password.to_string());

        let result = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute::<AuthResponse>()
            .await?;

        self.store_session(&result);
        Ok(result)
    }

    /// Request a passwordless magic-link email.
    ///
    /// The provider sends the link; nothing changes locally until the user
    /// follows it.
    pub async fn sign_in_with_otp(&self, email: &str) -> Result<(), Error> {
        let url = self.get_auth_url("/otp");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        if let Some(redirect) = &self.options.magic_link_redirect {
            body.insert("redirect_to".to_string(), redirect.clone());
        }

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute_no_content()
            .await
    }

    /// Request a password-reset email
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), Error> {
        let url = self.get_auth_url("/recover");

        let mut body = HashMap::new();
        body.insert("email".to_string(), email.to_string());
        if let Some(redirect) = &self.options.password_reset_redirect {
            body.insert("redirect_to".to_string(), redirect.clone());
        }

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute_no_content()
            .await
    }

    /// Complete a password reset with the access token from the emailed link
    pub async fn update_password(
        &self,
        new_password: &str,
        confirm_password: &str,
        access_token: &str,
    ) -> Result<User, Error> {
        validate_new_password(new_password, confirm_password)?;
        let url = self.get_auth_url("/user");

        let mut body = HashMap::new();
        body.insert("password".to_string(), new_password.to_string());

        Fetch::put(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(access_token)
            .json(&body)?
            .execute::<User>()
            .await
    }

    /// Sign out the current user and clear the stored session
    pub async fn sign_out(&self) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");

        let token = {
            let current = self.session.lock().unwrap();
            match *current {
                Some(ref session) => session.access_token.clone(),
                None => return Err(Error::auth("Not signed in")),
            }
        };

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(&token)
            .execute_raw()
            .await?;

        let mut current = self.session.lock().unwrap();
        *current = None;

        Ok(())
    }

    /// Get the current session, if any
    pub fn session(&self) -> Option<Session> {
        let current = self.session.lock().unwrap();
        current.clone()
    }

    /// Get the access token of the current session, if any
    pub fn access_token(&self) -> Option<String> {
        let current = self.session.lock().unwrap();
        current.as_ref().map(|s| s.access_token.clone())
    }

    /// Get the signed-in user from the current session, if any
    pub fn current_user(&self) -> Option<User> {
        let current = self.session.lock().unwrap();
        current.as_ref().and_then(|s| s.user.clone())
    }

    /// Replace the stored session (e.g. restored from persisted state)
    pub fn set_session(&self, session: Session) {
        let mut current = self.session.lock().unwrap();
        *current = Some(session);
    }
}

/// Validate a new password before any remote call is made
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), Error> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirmation {
        return Err(Error::validation("Passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected() {
        let err = validate_new_password("abc", "abc").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = validate_new_password("secret1", "secret2").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn valid_password_passes() {
        assert!(validate_new_password("secret1", "secret1").is_ok());
    }
}
