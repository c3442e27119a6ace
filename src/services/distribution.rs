use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::models::{CreateDistributionEvent, DistributionComment, DistributionEvent, LikeResponse, User};
use crate::services::error::ServiceError;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, Filter, StoreError};

/// Feed size when the caller does not ask for one
pub const DEFAULT_EVENT_LIMIT: usize = 20;
pub const MAX_EVENT_LIMIT: usize = 100;

/// NGO distribution events: posts, likes and comments
///
/// Likes live on the event as the list of user ids that liked it; comments
/// are their own collection keyed back to the event. Counters are rewritten
/// from what was read, so concurrent likes or comments are last-write-wins.
#[derive(Clone)]
pub struct DistributionService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl DistributionService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    pub async fn create(&self, ngo: &User, req: CreateDistributionEvent) -> Result<DistributionEvent, StoreError> {
        let mut event = DistributionEvent {
            id: String::new(),
            ngo_uid: ngo.uid.clone(),
            ngo_name: ngo.public_name().unwrap_or("Verified NGO").to_string(),
            title: req.title,
            description: req.description,
            image_urls: req.image_urls,
            liked_by: vec![],
            likes_count: 0,
            comments_count: 0,
            created_at: Utc::now(),
        };

        event.id = self
            .store
            .create(&self.collections.distributions, None, to_fields(&event, "id")?)
            .await?;

        tracing::info!("Distribution event {} posted by {}", event.id, ngo.uid);
        Ok(event)
    }

    /// Most recent events first, at most `limit` of them
    pub async fn list(&self, limit: usize) -> Result<Vec<DistributionEvent>, StoreError> {
        let docs = self.store.query(&self.collections.distributions, &[]).await?;

        let mut events: Vec<DistributionEvent> = docs
            .into_iter()
            .filter_map(|doc| match doc.into_model::<DistributionEvent>("id") {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!("Skipping unreadable distribution event: {}", e);
                    None
                }
            })
            .collect();

        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(limit.min(MAX_EVENT_LIMIT));
        Ok(events)
    }

    pub async fn get(&self, id: &str) -> Result<DistributionEvent, ServiceError> {
        self.store
            .get(&self.collections.distributions, id)
            .await?
            .map(|doc| doc.into_model::<DistributionEvent>("id"))
            .transpose()?
            .ok_or_else(|| ServiceError::NotFound("Event not found".to_string()))
    }

    /// Like the event, or take the like back if `uid` already liked it
    pub async fn toggle_like(&self, uid: &str, id: &str) -> Result<LikeResponse, ServiceError> {
        let mut event = self.get(id).await?;

        let liked = if event.liked_by.iter().any(|u| u == uid) {
            event.liked_by.retain(|u| u != uid);
            false
        } else {
            event.liked_by.push(uid.to_string());
            true
        };
        let likes_count = u32::try_from(event.liked_by.len()).unwrap_or(u32::MAX);

        self.store
            .update(
                &self.collections.distributions,
                id,
                fields(json!({ "liked_by": event.liked_by, "likes_count": likes_count })),
            )
            .await?;

        Ok(LikeResponse { liked, likes_count })
    }

    pub async fn add_comment(&self, author: &User, id: &str, text: String) -> Result<DistributionComment, ServiceError> {
        let event = self.get(id).await?;

        let mut comment = DistributionComment {
            id: String::new(),
            event_id: event.id,
            user_uid: author.uid.clone(),
            user_name: author.public_name().unwrap_or("User").to_string(),
            text,
            created_at: Utc::now(),
        };

        comment.id = self
            .store
            .create(&self.collections.distribution_comments, None, to_fields(&comment, "id")?)
            .await?;

        self.store
            .update(
                &self.collections.distributions,
                id,
                fields(json!({ "comments_count": event.comments_count.saturating_add(1) })),
            )
            .await?;

        tracing::debug!("Comment {} on event {} by {}", comment.id, id, author.uid);
        Ok(comment)
    }

    /// Comments on an event, oldest first
    pub async fn comments(&self, id: &str) -> Result<Vec<DistributionComment>, ServiceError> {
        self.get(id).await?;

        let docs = self
            .store
            .query(&self.collections.distribution_comments, &[Filter::eq("event_id", id)])
            .await?;

        let mut comments: Vec<DistributionComment> = docs
            .into_iter()
            .filter_map(|doc| match doc.into_model::<DistributionComment>("id") {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!("Skipping unreadable comment on event {}: {}", id, e);
                    None
                }
            })
            .collect();

        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    /// Remove one of the caller's own events along with its comments
    pub async fn delete(&self, uid: &str, id: &str) -> Result<(), ServiceError> {
        let event = self.get(id).await?;
        if event.ngo_uid != uid {
            return Err(ServiceError::Forbidden("You can only delete your own posts".to_string()));
        }

        self.store.delete(&self.collections.distributions, id).await?;

        let comments = self
            .store
            .query(&self.collections.distribution_comments, &[Filter::eq("event_id", id)])
            .await?;
        for comment in comments {
            self.store
                .delete(&self.collections.distribution_comments, &comment.id)
                .await?;
        }

        tracing::info!("Distribution event {} deleted by {}", id, uid);
        Ok(())
    }
}
