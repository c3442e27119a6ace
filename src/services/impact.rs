use std::sync::Arc;

use serde_json::Value;

use crate::core::{impact_stats, ImpactCounts};
use crate::models::{ImpactStats, RequestStatus};
use crate::services::store::{Collections, DocumentStore, Document, Filter, StoreError};

/// Per-user circulation stats, computed on read
#[derive(Clone)]
pub struct ImpactService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl ImpactService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    pub async fn for_user(&self, uid: &str) -> Result<ImpactStats, StoreError> {
        let books_shared = self
            .store
            .query(&self.collections.books, &[Filter::eq("donor_uid", uid)])
            .await?
            .len();

        let books_received = self
            .store
            .query(
                &self.collections.requests,
                &[
                    Filter::eq("requester_uid", uid),
                    Filter::eq("status", RequestStatus::Completed.as_str()),
                ],
            )
            .await?
            .len();

        let received = self
            .store
            .query(&self.collections.requests, &[Filter::eq("donor_uid", uid)])
            .await?;

        let counts = ImpactCounts {
            books_shared: count(books_shared),
            books_received: count(books_received),
            requests_received: count(received.len()),
            pending_requests_received: count(with_status(&received, RequestStatus::Pending)),
            completed_requests_received: count(with_status(&received, RequestStatus::Completed)),
        };

        tracing::debug!("Impact counts for {}: {:?}", uid, counts);

        Ok(impact_stats(counts))
    }
}

fn with_status(docs: &[Document], status: RequestStatus) -> usize {
    docs.iter()
        .filter(|d| d.data.get("status").and_then(Value::as_str) == Some(status.as_str()))
        .count()
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{fields, MemoryStore};
    use serde_json::json;

    async fn add(store: &MemoryStore, collection: &str, data: serde_json::Value) {
        store.create(collection, None, fields(data)).await.unwrap();
    }

    #[tokio::test]
    async fn test_counts_from_books_and_requests() {
        let store = Arc::new(MemoryStore::new());

        add(&store, "books", json!({"donor_uid": "asha", "title": "Atlas"})).await;
        add(&store, "books", json!({"donor_uid": "asha", "title": "Algebra"})).await;
        add(&store, "books", json!({"donor_uid": "ravi", "title": "Poems"})).await;

        add(&store, "requests", json!({"requester_uid": "asha", "donor_uid": "ravi", "status": "completed"})).await;
        add(&store, "requests", json!({"requester_uid": "asha", "donor_uid": "ravi", "status": "pending"})).await;
        add(&store, "requests", json!({"requester_uid": "ravi", "donor_uid": "asha", "status": "completed"})).await;
        add(&store, "requests", json!({"requester_uid": "meena", "donor_uid": "asha", "status": "pending"})).await;
        add(&store, "requests", json!({"requester_uid": "kiran", "donor_uid": "asha", "status": "rejected"})).await;

        let stats = ImpactService::new(store, Collections::default())
            .for_user("asha")
            .await
            .unwrap();

        assert_eq!(stats.books_shared, 2);
        assert_eq!(stats.books_received, 1);
        assert_eq!(stats.total_reused, 3);
        assert_eq!(stats.total_requests_received, 3);
        assert_eq!(stats.pending_requests_received, 1);
        assert_eq!(stats.completed_requests_received, 1);
        assert_eq!(stats.money_saved_inr, 1350.0);
    }

    #[tokio::test]
    async fn test_new_user_has_zero_impact() {
        let stats = ImpactService::new(Arc::new(MemoryStore::new()), Collections::default())
            .for_user("nobody")
            .await
            .unwrap();

        assert_eq!(stats.total_reused, 0);
        assert_eq!(stats.co2_saved_kg, 0.0);
    }
}
