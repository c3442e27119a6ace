//! Document store port
//!
//! The service only needs get / create / merge-update and equality-filtered
//! scans, so every backend is reduced to that surface.

pub mod appwrite;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use appwrite::AppwriteStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Collection names, configurable per deployment
#[derive(Debug, Clone)]
pub struct Collections {
    pub users: String,
    pub books: String,
    pub feedback: String,
    pub requests: String,
    pub ngo_requests: String,
    pub chats: String,
    pub messages: String,
    pub distributions: String,
    pub distribution_comments: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            books: "books".to_string(),
            feedback: "feedback".to_string(),
            requests: "requests".to_string(),
            ngo_requests: "ngo_requests".to_string(),
            chats: "chats".to_string(),
            messages: "messages".to_string(),
            distributions: "distributions".to_string(),
            distribution_comments: "distribution_comments".to_string(),
        }
    }
}

/// A single `field == value` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Whether a document's data satisfies this predicate
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        data.get(self.field) == Some(&self.value)
    }
}

/// A stored document: its id plus a JSON object of fields
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// Deserialize into a model, injecting the document id under `id_field`
    pub fn into_model<T: DeserializeOwned>(self, id_field: &str) -> Result<T, StoreError> {
        let Document { id, mut data } = self;
        data.insert(id_field.to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(data))
            .map_err(|e| StoreError::InvalidDocument(format!("{}: {}", id, e)))
    }
}

/// Serialize a model into the field map stored for it
///
/// The id lives in the document key, so the `id_field` is dropped from the body.
pub fn to_fields<T: Serialize>(model: &T, id_field: &str) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(model) {
        Ok(Value::Object(mut map)) => {
            map.remove(id_field);
            Ok(map)
        }
        Ok(other) => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
    }
}

/// Data persistence contract used by every service
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document; a generated id is used when `id` is `None`
    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<String, StoreError>;

    /// Create a document unless one with this id already exists
    ///
    /// Returns `true` when a new document was written.
    async fn create_if_absent(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Merge the given fields into an existing document
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Remove a document; `false` when there was nothing to remove
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Every document in the collection matching all filters
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError>;

    /// Lightweight connectivity probe
    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Build a field map from a `serde_json::json!` object literal
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thing {
        #[serde(default)]
        id: String,
        name: String,
    }

    #[test]
    fn test_filter_matches_typed_values() {
        let data = fields(json!({"role": "ngo", "available": true}));

        assert!(Filter::eq("role", "ngo").matches(&data));
        assert!(Filter::eq("available", true).matches(&data));
        assert!(!Filter::eq("available", "true").matches(&data));
        assert!(!Filter::eq("missing", "x").matches(&data));
    }

    #[test]
    fn test_document_into_model_injects_id() {
        let doc = Document {
            id: "doc-1".to_string(),
            data: fields(json!({"name": "atlas"})),
        };

        let thing: Thing = doc.into_model("id").unwrap();
        assert_eq!(thing, Thing { id: "doc-1".to_string(), name: "atlas".to_string() });
    }

    #[test]
    fn test_to_fields_drops_id() {
        let thing = Thing { id: "x".to_string(), name: "atlas".to_string() };
        let map = to_fields(&thing, "id").unwrap();

        assert!(!map.contains_key("id"));
        assert_eq!(map.get("name"), Some(&json!("atlas")));
    }
}
