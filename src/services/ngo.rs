use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::models::{BulkRequest, BulkStatus, CreateBulkRequest, User};
use crate::services::error::ServiceError;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, Filter, StoreError};

/// NGO bulk requests for many copies of one title
#[derive(Clone)]
pub struct BulkRequestService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl BulkRequestService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    /// Open a bulk request; location defaults to the NGO's own city and area
    pub async fn create(&self, ngo: &User, req: CreateBulkRequest) -> Result<String, StoreError> {
        let bulk = BulkRequest {
            id: String::new(),
            ngo_uid: ngo.uid.clone(),
            subject: req.subject,
            class_level: req.class_level,
            board: req.board,
            quantity: req.quantity,
            fulfilled: 0,
            status: BulkStatus::Open,
            city: req.city.or_else(|| ngo.city.clone()),
            area: req.area.or_else(|| ngo.area.clone()),
            created_at: Utc::now(),
        };

        let id = self
            .store
            .create(&self.collections.ngo_requests, None, to_fields(&bulk, "id")?)
            .await?;

        tracing::info!("Bulk request {} by {} for {} copies", id, ngo.uid, bulk.quantity);
        Ok(id)
    }

    /// The NGO's bulk requests, newest first
    pub async fn list(&self, ngo_uid: &str) -> Result<Vec<BulkRequest>, StoreError> {
        let docs = self
            .store
            .query(&self.collections.ngo_requests, &[Filter::eq("ngo_uid", ngo_uid)])
            .await?;

        let mut requests: Vec<BulkRequest> = docs
            .into_iter()
            .filter_map(|doc| match doc.into_model::<BulkRequest>("id") {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!("Skipping unreadable bulk request: {}", e);
                    None
                }
            })
            .collect();

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Record delivered copies against one of the NGO's own requests
    pub async fn fulfill(&self, ngo_uid: &str, id: &str, count: u32) -> Result<BulkRequest, ServiceError> {
        let mut bulk = self
            .store
            .get(&self.collections.ngo_requests, id)
            .await?
            .map(|doc| doc.into_model::<BulkRequest>("id"))
            .transpose()?
            .ok_or_else(|| ServiceError::NotFound("Bulk request not found".to_string()))?;

        if bulk.ngo_uid != ngo_uid {
            return Err(ServiceError::Forbidden("Not your bulk request".to_string()));
        }
        if bulk.status == BulkStatus::Completed {
            return Err(ServiceError::Invalid("Bulk request is already completed".to_string()));
        }

        bulk.fulfill(count);

        self.store
            .update(
                &self.collections.ngo_requests,
                id,
                fields(json!({ "fulfilled": bulk.fulfilled, "status": bulk.status })),
            )
            .await?;

        tracing::info!(
            "Bulk request {} fulfilled {}/{}",
            id,
            bulk.fulfilled,
            bulk.quantity
        );

        Ok(bulk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::store::MemoryStore;

    fn ngo(uid: &str) -> User {
        User {
            uid: uid.to_string(),
            role: Role::Ngo,
            email: None,
            display_name: None,
            organization_name: Some("Book Bank".to_string()),
            city: Some("Chennai".to_string()),
            area: Some("Adyar".to_string()),
            reputation: None,
            mismatch_count: 0,
            coordinates: None,
            blocked_uids: vec![],
            created_at: None,
        }
    }

    fn maths(quantity: u32) -> CreateBulkRequest {
        CreateBulkRequest {
            subject: "Maths".to_string(),
            class_level: "10".to_string(),
            board: "State".to_string(),
            quantity,
            city: None,
            area: None,
        }
    }

    #[tokio::test]
    async fn test_fulfil_until_completed() {
        let service = BulkRequestService::new(Arc::new(MemoryStore::new()), Collections::default());
        let owner = ngo("ngo-1");

        let id = service.create(&owner, maths(10)).await.unwrap();

        let bulk = service.fulfill("ngo-1", &id, 4).await.unwrap();
        assert_eq!(bulk.status, BulkStatus::Open);
        assert_eq!(bulk.city.as_deref(), Some("Chennai"));

        let bulk = service.fulfill("ngo-1", &id, 6).await.unwrap();
        assert_eq!(bulk.fulfilled, 10);
        assert_eq!(bulk.status, BulkStatus::Completed);

        assert!(matches!(
            service.fulfill("ngo-1", &id, 1).await,
            Err(ServiceError::Invalid(_))
        ));

        let listed = service.list("ngo-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, BulkStatus::Completed);
    }

    #[tokio::test]
    async fn test_other_ngo_cannot_fulfil() {
        let service = BulkRequestService::new(Arc::new(MemoryStore::new()), Collections::default());
        let id = service.create(&ngo("ngo-1"), maths(3)).await.unwrap();

        assert!(matches!(
            service.fulfill("ngo-2", &id, 1).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.fulfill("ngo-1", "missing", 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
