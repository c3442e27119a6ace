use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::models::{BookRequest, Chat, ChatMessage};
use crate::services::error::ServiceError;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, Filter, StoreError};

/// Pickup chats between requester and donor
///
/// A chat opens when the donor approves a request and closes when the
/// handover is completed. Only the two participants can read or post.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    /// Open the chat for an approved request
    pub async fn open_for(&self, request: &BookRequest) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: request.id.clone(),
            request_id: request.id.clone(),
            participants: vec![request.requester_uid.clone(), request.donor_uid.clone()],
            active: true,
            created_at: Utc::now(),
        };

        self.store
            .create(&self.collections.chats, Some(&request.id), to_fields(&chat, "id")?)
            .await?;

        tracing::info!("Opened chat for request {}", request.id);
        Ok(chat)
    }

    /// Stop accepting messages; a missing chat is left alone
    pub async fn close(&self, chat_id: &str) -> Result<(), StoreError> {
        match self
            .store
            .update(&self.collections.chats, chat_id, fields(json!({ "active": false })))
            .await
        {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// A chat `uid` takes part in
    pub async fn get_for(&self, uid: &str, chat_id: &str) -> Result<Chat, ServiceError> {
        let chat = self
            .store
            .get(&self.collections.chats, chat_id)
            .await?
            .map(|doc| doc.into_model::<Chat>("id"))
            .transpose()?
            .ok_or_else(|| ServiceError::NotFound("Chat not found".to_string()))?;

        if !chat.includes(uid) {
            return Err(ServiceError::Forbidden("Not a participant in this chat".to_string()));
        }

        Ok(chat)
    }

    /// Messages in the chat, oldest first
    pub async fn messages(&self, uid: &str, chat_id: &str) -> Result<Vec<ChatMessage>, ServiceError> {
        self.get_for(uid, chat_id).await?;

        let docs = self
            .store
            .query(&self.collections.messages, &[Filter::eq("chat_id", chat_id)])
            .await?;

        let mut messages: Vec<ChatMessage> = docs
            .into_iter()
            .filter_map(|doc| match doc.into_model::<ChatMessage>("id") {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!("Skipping unreadable message in chat {}: {}", chat_id, e);
                    None
                }
            })
            .collect();

        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    pub async fn send(&self, uid: &str, chat_id: &str, text: String) -> Result<ChatMessage, ServiceError> {
        let chat = self.get_for(uid, chat_id).await?;
        if !chat.active {
            return Err(ServiceError::Invalid("Chat is closed".to_string()));
        }

        let mut message = ChatMessage {
            id: String::new(),
            chat_id: chat.id,
            sender_uid: uid.to_string(),
            message: text,
            created_at: Utc::now(),
        };

        message.id = self
            .store
            .create(&self.collections.messages, None, to_fields(&message, "id")?)
            .await?;

        tracing::debug!("Message {} in chat {} from {}", message.id, chat_id, uid);
        Ok(message)
    }
}
