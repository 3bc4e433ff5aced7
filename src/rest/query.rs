//! Query builders for the data API

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

/// Everything a builder needs to issue a request
#[derive(Clone)]
pub(crate) struct RequestContext {
    pub url: String,
    pub key: String,
    pub auth_token: Option<String>,
    pub schema: String,
    pub client: Client,
}

impl RequestContext {
    fn apply<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let mut fetch = fetch.api_key(&self.key);
        if self.schema != "public" {
            // Non-default schemas are selected through the profile headers.
            fetch = fetch
                .header("Accept-Profile", &self.schema)
                .header("Content-Profile", &self.schema);
        }
        match &self.auth_token {
            Some(token) => fetch.bearer_auth(token),
            None => fetch,
        }
    }
}

/// Accumulated query-string parameters.
///
/// An ordered list, not a map: the data API stacks repeated filters on one
/// column (`price=gte.10&price=lte.50`), so a later filter must not displace
/// an earlier one on the same key.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a parameter; repeated keys are all kept
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Set a single-valued parameter, replacing any existing value
    pub fn set_param(&mut self, key: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    /// Get the first value stored for a key
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the query parameters in insertion order
    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    ctx: RequestContext,
    query: QueryBuilder,
    count_exact: bool,
}

impl SelectBuilder {
    pub(crate) fn new(ctx: RequestContext, columns: &str) -> Self {
        let mut query = QueryBuilder::new();
        query.set_param("select", columns);

        Self {
            ctx,
            query,
            count_exact: false,
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .add_param(column, &format!("eq.{}", value.to_string()));
        self
    }

    /// Filter rows where column is greater than a value
    pub fn gt<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .add_param(column, &format!("gt.{}", value.to_string()));
        self
    }

    /// Filter rows where column is greater than or equal to a value
    pub fn gte<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .add_param(column, &format!("gte.{}", value.to_string()));
        self
    }

    /// Filter rows where column is less than a value
    pub fn lt<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .add_param(column, &format!("lt.{}", value.to_string()));
        self
    }

    /// Filter rows where column is less than or equal to a value
    pub fn lte<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query
            .add_param(column, &format!("lte.{}", value.to_string()));
        self
    }

    /// Filter rows where column matches a pattern, case insensitively
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.query.add_param(column, &format!("ilike.{}", pattern));
        self
    }

    /// Combine raw filter predicates with a logical OR, e.g.
    /// `or("name.ilike.*chair*,description.ilike.*chair*")`.
    pub fn or(mut self, predicates: &str) -> Self {
        self.query.add_param("or", &format!("({})", predicates));
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        let entry = match self.query.get_param("order") {
            Some(existing) => format!("{},{}.{}", existing, column, direction),
            None => format!("{}.{}", column, direction),
        };
        self.query.set_param("order", &entry);
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: u32) -> Self {
        self.query.set_param("limit", &count.to_string());
        self
    }

    /// Return rows `from..=to` (zero-based, inclusive) for pagination
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.query.set_param("offset", &from.to_string());
        self.query.set_param("limit", &(to - from + 1).to_string());
        self
    }

    /// Ask the server for the exact total row count alongside the page
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    fn fetch(&self) -> FetchBuilder<'_> {
        let mut fetch = Fetch::get(&self.ctx.client, &self.ctx.url);
        fetch = self.ctx.apply(fetch);
        if self.count_exact {
            fetch = fetch.header("Prefer", "count=exact");
        }
        fetch.query(self.query.get_params().to_vec())
    }

    /// Execute the query and return the matching rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.fetch().execute::<Vec<T>>().await
    }

    /// Execute the query and return the rows plus the exact total count.
    ///
    /// The total is `None` unless [`count_exact`](Self::count_exact) was
    /// requested and the server reported one.
    pub async fn execute_with_total<T: DeserializeOwned>(
        &self,
    ) -> Result<(Vec<T>, Option<u64>), Error> {
        self.fetch().execute_with_count::<Vec<T>>().await
    }

    /// Execute the query expecting at most one row.
    ///
    /// An absent row is an expected non-error case for the sites' single-row
    /// lookups (profile, order, settings), so it surfaces as `Ok(None)`.
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let results = self.limit(1).execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    ctx: RequestContext,
    values: T,
    query: QueryBuilder,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, values: T) -> Self {
        Self {
            ctx,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Execute the insert and return the created rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::post(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", "return=representation")
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute::<R>()
            .await
    }

    /// Execute the insert without returning the created rows
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = Fetch::post(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute_no_content()
            .await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    ctx: RequestContext,
    values: T,
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, values: T) -> Self {
        Self {
            ctx,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query
            .add_param(column, &format!("eq.{}", value.to_string()));
        self
    }

    /// Execute the update and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::patch(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", "return=representation")
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute::<R>()
            .await
    }

    /// Execute the update without returning the updated rows
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = Fetch::patch(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute_no_content()
            .await
    }
}

/// Builder for UPSERT queries
pub struct UpsertBuilder<T: Serialize> {
    ctx: RequestContext,
    values: T,
    query: QueryBuilder,
    on_conflict: Option<String>,
}

impl<T: Serialize> UpsertBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, values: T) -> Self {
        Self {
            ctx,
            values,
            query: QueryBuilder::new(),
            on_conflict: None,
        }
    }

    /// Specify the column to resolve conflicts on
    pub fn on_conflict(mut self, column: &str) -> Self {
        self.on_conflict = Some(column.to_string());
        self
    }

    fn prefer(&self, ret: &str) -> String {
        match &self.on_conflict {
            Some(column) => format!(
                "resolution=merge-duplicates,on_conflict={},return={}",
                column, ret
            ),
            None => format!("resolution=merge-duplicates,return={}", ret),
        }
    }

    /// Execute the upsert and return the resulting rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::post(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", &self.prefer("representation"))
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute::<R>()
            .await
    }

    /// Execute the upsert without returning the resulting rows
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = Fetch::post(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", &self.prefer("minimal"))
            .query(self.query.get_params().to_vec())
            .json(&self.values)?
            .execute_no_content()
            .await
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    ctx: RequestContext,
    query: QueryBuilder,
}

impl DeleteBuilder {
    pub(crate) fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query
            .add_param(column, &format!("eq.{}", value.to_string()));
        self
    }

    /// Execute the delete without returning the deleted rows
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = Fetch::delete(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .header("Prefer", "return=minimal")
            .query(self.query.get_params().to_vec())
            .execute_no_content()
            .await
    }
}

/// Builder for calls to named remote procedures
pub struct RpcBuilder<T: Serialize> {
    ctx: RequestContext,
    params: T,
}

impl<T: Serialize> RpcBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, params: T) -> Self {
        Self { ctx, params }
    }

    /// Execute the procedure and return its result
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let fetch = Fetch::post(&self.ctx.client, &self.ctx.url);
        self.ctx
            .apply(fetch)
            .json(&self.params)?
            .execute::<R>()
            .await
    }
}
