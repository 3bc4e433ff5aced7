//! Database operations through the hosted PostgREST-style data API
//!
//! Every query here is advisory from the client's point of view: row-level
//! security on the server decides what a caller may actually read or write.

mod query;

use reqwest::Client;
use serde::Serialize;

pub use query::*;

/// Client for operations against a single table or view
pub struct TableClient {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key for the backend project
    key: String,

    /// The table or view name
    table: String,

    /// Access token of the signed-in user, when any
    auth_token: Option<String>,

    /// Database schema served by the data API
    schema: String,

    /// HTTP client
    client: Client,
}

impl TableClient {
    /// Create a new TableClient
    pub(crate) fn new(url: &str, key: &str, table: &str, schema: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            auth_token: None,
            schema: schema.to_string(),
            client,
        }
    }

    /// Attach the signed-in user's access token to subsequent requests
    pub fn with_auth(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Get the base URL for REST API requests
    fn get_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn context(&self) -> RequestContext {
        RequestContext {
            url: self.get_url(),
            key: self.key.clone(),
            auth_token: self.auth_token.clone(),
            schema: self.schema.clone(),
            client: self.client.clone(),
        }
    }

    /// Select specific columns from the table.
    ///
    /// Foreign-table embeds use the data API's select syntax, e.g.
    /// `"*, sender:profiles(id, first_name, role, admin_display_name)"`.
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.context(), columns)
    }

    /// Insert data into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.context(), values)
    }

    /// Update data in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.context(), values)
    }

    /// Upsert data in the table (insert, or update on conflict)
    pub fn upsert<T: Serialize>(&self, values: T) -> UpsertBuilder<T> {
        UpsertBuilder::new(self.context(), values)
    }

    /// Delete data from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.context())
    }
}

/// Build a call to a named remote procedure
pub fn rpc<T: Serialize>(
    url: &str,
    key: &str,
    auth_token: Option<String>,
    function: &str,
    schema: &str,
    params: T,
    client: Client,
) -> RpcBuilder<T> {
    let ctx = RequestContext {
        url: format!("{}/rest/v1/rpc/{}", url, function),
        key: key.to_string(),
        auth_token,
        schema: schema.to_string(),
        client,
    };
    RpcBuilder::new(ctx, params)
}
