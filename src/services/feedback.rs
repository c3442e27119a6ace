use chrono::Utc;
use std::sync::Arc;

use crate::models::{Feedback, ReputationSnapshot, SubmitFeedbackRequest};
use crate::services::error::ServiceError;
use crate::services::reputation::ReputationService;
use crate::services::store::{to_fields, Collections, DocumentStore};

/// Outcome of a feedback submission
#[derive(Debug, Clone)]
pub struct FeedbackReceipt {
    pub id: String,
    /// Fresh reputation of the rated user, if the recompute succeeded
    pub reputation: Option<ReputationSnapshot>,
}

#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    reputation: ReputationService,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections, reputation: ReputationService) -> Self {
        Self {
            store,
            collections,
            reputation,
        }
    }

    /// Append a feedback row and recompute the rated user's reputation
    ///
    /// The row is kept even if the recompute fails; the next submission for
    /// the same user rebuilds the snapshot from every row.
    pub async fn submit(&self, from_uid: &str, req: SubmitFeedbackRequest) -> Result<FeedbackReceipt, ServiceError> {
        if from_uid == req.to_uid {
            return Err(ServiceError::Invalid("You cannot leave feedback for yourself".to_string()));
        }

        if self.store.get(&self.collections.users, &req.to_uid).await?.is_none() {
            return Err(ServiceError::NotFound("User profile not found".to_string()));
        }

        let feedback = Feedback {
            id: String::new(),
            from_uid: from_uid.to_string(),
            to_uid: req.to_uid,
            rating: f64::from(req.rating),
            condition_matched: req.condition_matched,
            request_id: req.request_id,
            comment: req.comment,
            created_at: Utc::now(),
        };

        let id = self
            .store
            .create(&self.collections.feedback, None, to_fields(&feedback, "id")?)
            .await?;

        tracing::info!("Feedback {} from {} to {}", id, from_uid, feedback.to_uid);

        let reputation = match self.reputation.recompute(&feedback.to_uid).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Reputation recompute for {} failed: {}", feedback.to_uid, e);
                None
            }
        };

        Ok(FeedbackReceipt { id, reputation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReputationPolicy;
    use crate::services::store::{fields, MemoryStore};
    use serde_json::json;

    fn service(store: Arc<MemoryStore>) -> FeedbackService {
        let reputation = ReputationService::new(store.clone(), Collections::default(), ReputationPolicy::default());
        FeedbackService::new(store, Collections::default(), reputation)
    }

    fn rating(to: &str, rating: u8, matched: Option<bool>) -> SubmitFeedbackRequest {
        SubmitFeedbackRequest {
            to_uid: to.to_string(),
            rating,
            condition_matched: matched,
            request_id: None,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_submit_updates_reputation() {
        let store = Arc::new(MemoryStore::new());
        store
            .create("users", Some("donor"), fields(json!({"role": "student"})))
            .await
            .unwrap();
        let feedback = service(store.clone());

        feedback.submit("a", rating("donor", 5, Some(true))).await.unwrap();
        let receipt = feedback.submit("b", rating("donor", 4, Some(false))).await.unwrap();

        let snapshot = receipt.reputation.unwrap();
        assert_eq!(snapshot.reputation, 3.75);
        assert_eq!(snapshot.mismatch_count, 1);
        assert_eq!(store.len("feedback").await, 2);
    }

    #[tokio::test]
    async fn test_self_feedback_rejected() {
        let store = Arc::new(MemoryStore::new());
        let result = service(store.clone()).submit("donor", rating("donor", 5, None)).await;

        assert!(matches!(result, Err(ServiceError::Invalid(_))));
        assert_eq!(store.len("feedback").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let store = Arc::new(MemoryStore::new());
        let result = service(store).submit("a", rating("ghost", 3, None)).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
