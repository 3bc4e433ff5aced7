//! Kehilla community-sites client library
//!
//! Typed client for the hosted backend (identity, data API, object storage)
//! plus the application services behind the community sites: messaging with
//! read-state and reply threading, marketplace catalog browsing, admin
//! panels, and the profile/order flows of the food-order portal.
//!
//! The hosted backend owns every guarantee that matters: authentication,
//! row storage, row-level security, ordering and uniqueness. This crate is
//! the thin, well-typed layer above it.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod messaging;
pub mod models;
pub mod orders;
pub mod profile;
pub mod rest;
pub mod state;
pub mod storage;

use reqwest::Client;
use serde::Serialize;

use crate::auth::Auth;
use crate::config::ClientOptions;
use crate::rest::{RpcBuilder, TableClient};
use crate::storage::StorageClient;

/// The main entry point for the backend client
pub struct Backend {
    /// The base URL for the backend project
    pub url: String,
    /// The anonymous API key for the backend project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for session management
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
}

impl Backend {
    /// Create a new backend client
    ///
    /// # Example
    ///
    /// ```
    /// use kehilla::Backend;
    ///
    /// let backend = Backend::new("https://project.example.co", "anon-key");
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self::new_with_options(url, key, ClientOptions::default())
    }

    /// Create a new backend client with custom options
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_default();

        let auth = Auth::new(url, key, http_client.clone(), options.clone());

        Self {
            url: url.to_string(),
            key: key.to_string(),
            http_client,
            auth,
            options,
        }
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Create a client for a table or view, authenticated as the current
    /// session when one exists
    pub fn from(&self, table: &str) -> TableClient {
        let client = TableClient::new(
            &self.url,
            &self.key,
            table,
            &self.options.db_schema,
            self.http_client.clone(),
        );
        match self.auth.access_token() {
            Some(token) => client.with_auth(&token),
            None => client,
        }
    }

    /// Call a named remote procedure
    pub fn rpc<T: Serialize>(&self, function: &str, params: T) -> RpcBuilder<T> {
        rest::rpc(
            &self.url,
            &self.key,
            self.auth.access_token(),
            function,
            &self.options.db_schema,
            params,
            self.http_client.clone(),
        )
    }

    /// Get a client for object storage
    pub fn storage(&self) -> StorageClient {
        let client = StorageClient::new(&self.url, &self.key, self.http_client.clone());
        match self.auth.access_token() {
            Some(token) => client.with_auth(&token),
            None => client,
        }
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::state::{LoadState, PageState};
    pub use crate::Backend;
}
