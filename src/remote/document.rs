//! Auth/document backend adapter (Firestore REST).
//!
//! Serves the narrower entity set the hosted document deployment carries:
//! leads, products, clients and the user directory. Everything else stays
//! local when this backend is active.
//!
//! Firestore's REST surface types every value (`stringValue`,
//! `integerValue`, `arrayValue`, ...), so documents are translated between
//! the canonical camelCase JSON shape and Firestore's typed field map on the
//! way in and out. Unknown typed values decode to null and the record
//! mapper's defaults absorb them.

use serde_json::{json, Map, Value};

use crate::types::EntityKind;

use super::{send_with_retry, RemoteError, RetryPolicy};

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com/v1";

/// Collections the document deployment actually provisions.
const SUPPORTED: &[EntityKind] = &[
    EntityKind::Leads,
    EntityKind::Products,
    EntityKind::Clients,
    EntityKind::AppUsers,
];

pub struct DocumentAdapter {
    client: reqwest::Client,
    project_id: String,
    api_key: String,
    policy: RetryPolicy,
}

impl DocumentAdapter {
    pub fn new(project_id: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            policy: RetryPolicy::default(),
        }
    }

    /// Whether this backend stores the given entity kind at all.
    pub fn supports(&self, kind: EntityKind) -> bool {
        SUPPORTED.contains(&kind)
    }

    fn collection_url(&self, kind: EntityKind) -> String {
        format!(
            "{FIRESTORE_HOST}/projects/{}/databases/(default)/documents/{}",
            self.project_id,
            kind.collection()
        )
    }

    fn document_url(&self, kind: EntityKind, id: &str) -> String {
        format!("{}/{}", self.collection_url(kind), id)
    }

    /// List every document in a collection as canonical rows. Visibility is
    /// not pushed down; the facade filters in memory.
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .client
            .get(self.collection_url(kind))
            .query(&[("key", self.api_key.as_str()), ("pageSize", "300")]);
        let body = self.send(request).await?;
        let documents = match body.get("documents") {
            Some(Value::Array(docs)) => docs.as_slice(),
            _ => return Ok(Vec::new()),
        };
        Ok(documents.iter().map(decode_document).collect())
    }

    pub async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, RemoteError> {
        let request = self
            .client
            .get(self.document_url(kind, id))
            .query(&[("key", self.api_key.as_str())]);
        let response = send_with_retry(request, &self.policy).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = interpret(response).await?;
        Ok(Some(decode_document(&body)))
    }

    /// Create a document under the record's id and return the stored row.
    pub async fn create(
        &self,
        kind: EntityKind,
        id: &str,
        row: &Value,
    ) -> Result<Value, RemoteError> {
        let request = self
            .client
            .post(self.collection_url(kind))
            .query(&[("key", self.api_key.as_str()), ("documentId", id)])
            .json(&json!({ "fields": encode_fields(row) }));
        let body = self.send(request).await?;
        Ok(decode_document(&body))
    }

    /// Overwrite a document's fields and return the stored row.
    pub async fn patch(
        &self,
        kind: EntityKind,
        id: &str,
        row: &Value,
    ) -> Result<Value, RemoteError> {
        let request = self
            .client
            .patch(self.document_url(kind, id))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": encode_fields(row) }));
        let body = self.send(request).await?;
        Ok(decode_document(&body))
    }

    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .delete(self.document_url(kind, id))
            .query(&[("key", self.api_key.as_str())]);
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, RemoteError> {
        let response = send_with_retry(request, &self.policy).await?;
        interpret(response).await
    }
}

async fn interpret(response: reqwest::Response) -> Result<Value, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);
        return Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

// ============================================================================
// Typed-value translation
// ============================================================================

/// Canonical JSON value to a Firestore typed value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({ "mapValue": { "fields": encode_fields(value) } }),
    }
}

fn encode_fields(row: &Value) -> Map<String, Value> {
    match row.as_object() {
        Some(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
        None => Map::new(),
    }
}

/// Firestore typed value back to canonical JSON. Types this layer never
/// writes (timestamps, references, geo points) decode to null.
fn decode_value(typed: &Value) -> Value {
    let Some(map) = typed.as_object() else {
        return Value::Null;
    };
    if let Some(s) = map.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(i) = map.get("integerValue") {
        // Firestore serializes integers as strings.
        let parsed = i
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| i.as_i64());
        if let Some(n) = parsed {
            return json!(n);
        }
    }
    if let Some(d) = map.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(b) = map.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(array) = map.get("arrayValue") {
        let values = match array.get("values") {
            Some(Value::Array(items)) => items.iter().map(decode_value).collect(),
            _ => Vec::new(),
        };
        return Value::Array(values);
    }
    if let Some(fields) = map.get("mapValue").and_then(|m| m.get("fields")) {
        return decode_fields(fields);
    }
    Value::Null
}

fn decode_fields(fields: &Value) -> Value {
    let mut row = Map::new();
    if let Some(map) = fields.as_object() {
        for (key, typed) in map {
            row.insert(key.clone(), decode_value(typed));
        }
    }
    Value::Object(row)
}

/// A Firestore document to a canonical row. The document resource name ends
/// in the id; it backfills an `id` field when the stored fields lack one.
fn decode_document(document: &Value) -> Value {
    let mut row = match document.get("fields") {
        Some(fields) => decode_fields(fields),
        None => Value::Object(Map::new()),
    };
    let has_id = row.get("id").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    if !has_id {
        if let Some(name) = document.get("name").and_then(Value::as_str) {
            if let Some(id) = name.rsplit('/').next() {
                if let Some(map) = row.as_object_mut() {
                    map.insert("id".to_string(), Value::String(id.to_string()));
                }
            }
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_entity_set() {
        let adapter = DocumentAdapter::new("ravechi-crm", "key");
        assert!(adapter.supports(EntityKind::Leads));
        assert!(adapter.supports(EntityKind::AppUsers));
        assert!(!adapter.supports(EntityKind::Invoices));
        assert!(!adapter.supports(EntityKind::TimesheetEntries));
    }

    #[test]
    fn test_collection_url_shape() {
        let adapter = DocumentAdapter::new("ravechi-crm", "key");
        assert_eq!(
            adapter.collection_url(EntityKind::Clients),
            "https://firestore.googleapis.com/v1/projects/ravechi-crm/databases/(default)/documents/clients"
        );
    }

    #[test]
    fn test_encode_lead_shape() {
        let row = json!({
            "id": "l1",
            "value": 45000.5,
            "stockCount": 3,
            "interest": ["Software"],
            "sharedWith": []
        });
        let fields = encode_fields(&row);
        assert_eq!(fields["id"], json!({"stringValue": "l1"}));
        assert_eq!(fields["value"], json!({"doubleValue": 45000.5}));
        assert_eq!(fields["stockCount"], json!({"integerValue": "3"}));
        assert_eq!(
            fields["interest"],
            json!({"arrayValue": {"values": [{"stringValue": "Software"}]}})
        );
        assert_eq!(fields["sharedWith"], json!({"arrayValue": {"values": []}}));
    }

    #[test]
    fn test_decode_document_to_canonical_row() {
        let document = json!({
            "name": "projects/ravechi-crm/databases/(default)/documents/leads/l1",
            "fields": {
                "name": {"stringValue": "Asha"},
                "value": {"integerValue": "45000"},
                "interest": {"arrayValue": {"values": [{"stringValue": "Software"}]}},
                "visibility": {"stringValue": "public"}
            }
        });
        let row = decode_document(&document);
        assert_eq!(row["id"], "l1");
        assert_eq!(row["name"], "Asha");
        assert_eq!(row["value"], 45000);
        assert_eq!(row["interest"][0], "Software");
    }

    #[test]
    fn test_decode_keeps_stored_id_field() {
        let document = json!({
            "name": ".../documents/leads/generated-key",
            "fields": { "id": {"stringValue": "l7"} }
        });
        assert_eq!(decode_document(&document)["id"], "l7");
    }

    #[test]
    fn test_decode_unknown_typed_value_is_null() {
        let document = json!({
            "name": ".../documents/leads/l1",
            "fields": {
                "created": {"timestampValue": "2024-03-01T00:00:00Z"}
            }
        });
        let row = decode_document(&document);
        assert!(row["created"].is_null());
    }
}
