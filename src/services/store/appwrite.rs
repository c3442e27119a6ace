use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};

use super::{Document, DocumentStore, Filter, StoreError};

/// Documents fetched per page when scanning a collection
const PAGE_SIZE: usize = 100;

/// Appwrite Databases API backend
///
/// Handles all communication with Appwrite including:
/// - Fetching single documents
/// - Creating and patching documents
/// - Paging through equality-filtered collection scans
pub struct AppwriteStore {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
}

impl AppwriteStore {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), urlencoding::encode(id))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    async fn post_document(
        &self,
        collection: &str,
        id: &str,
        data: &Map<String, Value>,
    ) -> Result<reqwest::Response, StoreError> {
        let payload = json!({
            "documentId": id,
            "data": data,
        });

        Ok(self
            .authed(self.client.post(self.documents_url(collection)))
            .json(&payload)
            .send()
            .await?)
    }

    async fn fetch_page(
        &self,
        collection: &str,
        filters: &[Filter],
        cursor: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut queries: Vec<String> = filters.iter().map(filter_query).collect();
        queries.push(format!("limit({})", PAGE_SIZE));
        if let Some(cursor) = cursor {
            queries.push(format!("cursorAfter({})", Value::String(cursor.to_string())));
        }

        let query_string = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");

        let full_url = format!("{}?{}", self.documents_url(collection), query_string);

        let response = self.authed(self.client.get(&full_url)).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to query {}: {}",
                collection,
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidDocument("Missing documents array".into()))?;

        documents.iter().map(parse_document).collect()
    }
}

/// Render an equality filter in Appwrite query syntax
fn filter_query(filter: &Filter) -> String {
    format!(
        "equal({}, [{}])",
        Value::String(filter.field.to_string()),
        filter.value
    )
}

/// Split an Appwrite document into its id and user fields
fn parse_document(doc: &Value) -> Result<Document, StoreError> {
    let object = doc
        .as_object()
        .ok_or_else(|| StoreError::InvalidDocument("Document is not an object".into()))?;

    let id = object
        .get("$id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoreError::InvalidDocument("Document without $id".into()))?
        .to_string();

    let data = object
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Document { id, data })
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        tracing::debug!("Fetching document {}/{}", collection, id);

        let response = self
            .authed(self.client.get(self.document_url(collection, id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch {}/{}: {} - {}", collection, id, status, body);
            return Err(StoreError::ApiError(format!("Failed to fetch document: {}", status)));
        }

        let json: Value = response.json().await?;
        parse_document(&json).map(Some)
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let response = self.post_document(collection, &id, &data).await?;

        if response.status() == StatusCode::CONFLICT {
            // Overwrite semantics: an existing document takes the new fields
            self.update(collection, &id, data).await?;
            return Ok(id);
        }

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to create document in {}: {}",
                collection,
                response.status()
            )));
        }

        tracing::debug!("Created document {}/{}", collection, id);

        Ok(id)
    }

    async fn create_if_absent(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let response = self.post_document(collection, id, &data).await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::ApiError(format!(
                "Failed to create document in {}: {}",
                collection, status
            ))),
        }
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let response = self
            .authed(self.client.patch(self.document_url(collection, id)))
            .json(&json!({ "data": fields }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(format!("{}/{}", collection, id))),
            status if status.is_success() => Ok(()),
            status => Err(StoreError::ApiError(format!(
                "Failed to update {}/{}: {}",
                collection, id, status
            ))),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let response = self
            .authed(self.client.delete(self.document_url(collection, id)))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::ApiError(format!(
                "Failed to delete {}/{}: {}",
                collection, id, status
            ))),
        }
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(collection, filters, cursor.as_deref()).await?;
            let page_len = page.len();
            cursor = page.last().map(|d| d.id.clone());
            all.extend(page);

            if page_len < PAGE_SIZE {
                break;
            }
        }

        tracing::debug!("Queried {} documents from {}", all.len(), collection);

        Ok(all)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}/health", self.base_url.trim_end_matches('/'));
        let response = self.authed(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::fields;
    use mockito::Matcher;

    fn store(base_url: String) -> AppwriteStore {
        AppwriteStore::new(
            base_url,
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_filter_query_syntax() {
        assert_eq!(filter_query(&Filter::eq("role", "ngo")), r#"equal("role", ["ngo"])"#);
        assert_eq!(filter_query(&Filter::eq("available", true)), r#"equal("available", [true])"#);
    }

    #[test]
    fn test_parse_document_strips_system_fields() {
        let doc = json!({
            "$id": "abc",
            "$collectionId": "users",
            "$createdAt": "2024-01-01T00:00:00.000+00:00",
            "role": "ngo"
        });

        let parsed = parse_document(&doc).unwrap();
        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data.get("role"), Some(&json!("ngo")));
    }

    #[tokio::test]
    async fn test_get_missing_document_is_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/databases/test_db/collections/users/documents/ghost")
            .match_header("X-Appwrite-Project", "test_project")
            .with_status(404)
            .create_async()
            .await;

        let result = store(server.url()).get("users", "ghost").await.unwrap();

        assert!(result.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_sends_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/databases/test_db/collections/users/documents")
            .match_query(Matcher::Regex("equal".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 1, "documents": [{"$id": "n1", "role": "ngo"}]}"#)
            .create_async()
            .await;

        let docs = store(server.url())
            .query("users", &[Filter::eq("role", "ngo")])
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "n1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_if_absent_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/databases/test_db/collections/users/documents")
            .with_status(409)
            .create_async()
            .await;

        let created = store(server.url())
            .create_if_absent("users", "u1", fields(json!({"role": "ngo"})))
            .await
            .unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_delete_missing_is_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/databases/test_db/collections/distributions/documents/gone")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("DELETE", "/databases/test_db/collections/distributions/documents/e1")
            .with_status(204)
            .create_async()
            .await;

        let store = store(server.url());
        assert!(!store.delete("distributions", "gone").await.unwrap());
        assert!(store.delete("distributions", "e1").await.unwrap());
    }

    #[tokio::test]
    async fn test_coordinate_update_sends_flat_attributes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/databases/test_db/collections/users/documents/ngo-1")
            .match_body(Matcher::Json(json!({
                "data": {"latitude": 13.0012, "longitude": 80.2565}
            })))
            .with_status(200)
            .with_body(r#"{"$id": "ngo-1"}"#)
            .expect(1)
            .create_async()
            .await;

        let coordinates = crate::models::Coordinates::new(13.0012, 80.2565);
        store(server.url())
            .update("users", "ngo-1", fields(coordinates.to_fields()))
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
