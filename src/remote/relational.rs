//! Relational backend adapter (Supabase PostgREST).
//!
//! Row CRUD against `{base}/rest/v1/{table}` with the project API key sent
//! as both `apikey` and bearer token. Reads push the visibility filter down
//! to the server; writes send the canonical camelCase payload as-is (the
//! hosted schema exposes camelCase columns).
//!
//! Deployments still on the pre-sharing schema lack the visibility columns.
//! PostgREST rejects those requests with an undefined-column error, and the
//! adapter retries exactly once in degraded form: reads without the
//! visibility predicate (the caller filters in memory), writes with the
//! sharing fields stripped from the payload. The degraded retry is per
//! request, never remembered.

use serde_json::Value;
use url::Url;

use crate::types::EntityKind;

use super::{
    is_undefined_column, send_with_retry, strip_scope_columns, RemoteError, RetryPolicy,
};

pub struct RelationalAdapter {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    policy: RetryPolicy,
}

impl RelationalAdapter {
    pub fn new(url: &str, api_key: &str) -> Result<Self, RemoteError> {
        let base = Url::parse(url).map_err(|e| RemoteError::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            api_key: api_key.to_string(),
            policy: RetryPolicy::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_policy(url: &str, api_key: &str, policy: RetryPolicy) -> Result<Self, RemoteError> {
        let mut adapter = Self::new(url, api_key)?;
        adapter.policy = policy;
        Ok(adapter)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn table_url(&self, kind: EntityKind) -> Result<Url, RemoteError> {
        self.base
            .join(&format!("rest/v1/{}", kind.collection()))
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// List every row of a table visible to `requester`, newest id first.
    /// On a schema-mismatch rejection the visibility predicate is dropped
    /// and the full table returned; the facade re-filters in memory either
    /// way.
    pub async fn list(
        &self,
        kind: EntityKind,
        requester: Option<&str>,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(kind)?;
        let mut query: Vec<(String, String)> = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "id.desc".to_string()),
        ];
        if kind.is_scoped() {
            query.push(visibility_predicate(requester));
        }

        let request = self.authed(self.client.get(url.clone())).query(&query);
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            return parse_rows(&body);
        }

        if kind.is_scoped() && is_undefined_column(status, &body) {
            log::warn!(
                "relational: {} lacks sharing columns, listing without visibility filter",
                kind
            );
            let plain: Vec<(String, String)> = vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "id.desc".to_string()),
            ];
            let retry = self.authed(self.client.get(url)).query(&plain);
            let (status, body) = self.send(retry).await?;
            if status.is_success() {
                return parse_rows(&body);
            }
            return Err(api_error(status, body));
        }

        Err(api_error(status, body))
    }

    /// Fetch a single row by id, or None when it does not exist.
    pub async fn fetch_one(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<Value>, RemoteError> {
        let url = self.table_url(kind)?;
        let request = self
            .authed(self.client.get(url))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(api_error(status, body));
        }
        Ok(parse_rows(&body)?.into_iter().next())
    }

    /// Insert a row and return the representation the server stored.
    pub async fn insert(&self, kind: EntityKind, payload: &Value) -> Result<Value, RemoteError> {
        let url = self.table_url(kind)?;
        let request = self
            .authed(self.client.post(url.clone()))
            .header("Prefer", "return=representation")
            .json(payload);
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            return first_row(&body, payload);
        }

        if is_undefined_column(status, &body) {
            log::warn!(
                "relational: {} lacks sharing columns, inserting without them",
                kind
            );
            let mut stripped = payload.clone();
            strip_scope_columns(&mut stripped);
            let retry = self
                .authed(self.client.post(url))
                .header("Prefer", "return=representation")
                .json(&stripped);
            let (status, body) = self.send(retry).await?;
            if status.is_success() {
                return first_row(&body, &stripped);
            }
            return Err(api_error(status, body));
        }

        Err(api_error(status, body))
    }

    /// Replace the mutable columns of a row. Returns the stored
    /// representation.
    pub async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        payload: &Value,
    ) -> Result<Value, RemoteError> {
        let url = self.table_url(kind)?;
        let filter = [("id", format!("eq.{id}"))];
        let request = self
            .authed(self.client.patch(url.clone()))
            .query(&filter)
            .header("Prefer", "return=representation")
            .json(payload);
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            return first_row(&body, payload);
        }

        if is_undefined_column(status, &body) {
            log::warn!(
                "relational: {} lacks sharing columns, updating without them",
                kind
            );
            let mut stripped = payload.clone();
            strip_scope_columns(&mut stripped);
            let retry = self
                .authed(self.client.patch(url))
                .query(&filter)
                .header("Prefer", "return=representation")
                .json(&stripped);
            let (status, body) = self.send(retry).await?;
            if status.is_success() {
                return first_row(&body, &stripped);
            }
            return Err(api_error(status, body));
        }

        Err(api_error(status, body))
    }

    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteError> {
        let url = self.table_url(kind)?;
        let request = self
            .authed(self.client.delete(url))
            .query(&[("id", format!("eq.{id}"))]);
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(api_error(status, body))
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(reqwest::StatusCode, String), RemoteError> {
        let response = send_with_retry(request, &self.policy).await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// PostgREST filter limiting rows to what `requester` may see: public rows,
/// rows they own, and rows shared with them. With no requester, public only.
fn visibility_predicate(requester: Option<&str>) -> (String, String) {
    match requester {
        Some(user) => (
            "or".to_string(),
            format!(
                "(visibility.eq.public,ownerId.eq.{user},sharedWith.cs.{{\"{user}\"}})"
            ),
        ),
        None => ("visibility".to_string(), "eq.public".to_string()),
    }
}

fn api_error(status: reqwest::StatusCode, body: String) -> RemoteError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, RemoteError> {
    Ok(serde_json::from_str(body)?)
}

/// PostgREST returns representations as a one-element array. Fall back to
/// the payload we sent if the server returned nothing usable.
fn first_row(body: &str, sent: &Value) -> Result<Value, RemoteError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(mut rows)) if !rows.is_empty() => Ok(rows.remove(0)),
        Ok(Value::Object(row)) => Ok(Value::Object(row)),
        _ => Ok(sent.clone()),
    }
}
