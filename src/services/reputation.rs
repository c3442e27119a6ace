use std::sync::Arc;

use crate::core::aggregate_reputation;
use crate::models::{Feedback, ReputationPolicy, ReputationSnapshot};
use crate::services::store::{fields, Collections, DocumentStore, Filter, StoreError};

/// Recomputes and persists a user's reputation from their feedback history
///
/// The stored value is always rebuilt from every feedback row, so a rerun
/// over the same rows writes the same snapshot. Concurrent recomputes for
/// one user are last-write-wins.
#[derive(Clone)]
pub struct ReputationService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    policy: ReputationPolicy,
}

impl ReputationService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections, policy: ReputationPolicy) -> Self {
        Self {
            store,
            collections,
            policy,
        }
    }

    /// Every feedback row addressed to `uid`
    ///
    /// A single unreadable row fails the whole load; a snapshot is never
    /// built from part of the history.
    pub async fn feedback_for(&self, uid: &str) -> Result<Vec<Feedback>, StoreError> {
        self.store
            .query(&self.collections.feedback, &[Filter::eq("to_uid", uid)])
            .await?
            .into_iter()
            .map(|doc| doc.into_model::<Feedback>("id"))
            .collect()
    }

    /// Rebuild and store reputation for `uid`
    ///
    /// Returns `None` without writing anything when the user has no feedback.
    pub async fn recompute(&self, uid: &str) -> Result<Option<ReputationSnapshot>, StoreError> {
        let feedback = self.feedback_for(uid).await?;

        let Some(snapshot) = aggregate_reputation(&feedback, &self.policy) else {
            tracing::debug!("No feedback for {}, reputation left unchanged", uid);
            return Ok(None);
        };

        self.store
            .update(
                &self.collections.users,
                uid,
                fields(serde_json::json!({
                    "reputation": snapshot.reputation,
                    "mismatch_count": snapshot.mismatch_count,
                })),
            )
            .await?;

        tracing::info!(
            "Reputation for {} recomputed from {} rows: {} ({} mismatches)",
            uid,
            feedback.len(),
            snapshot.reputation,
            snapshot.mismatch_count
        );

        Ok(Some(snapshot))
    }
}
