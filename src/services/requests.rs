use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::models::{BookRequest, CreateBookRequest, RequestStatus};
use crate::services::books::BookService;
use crate::services::chat::ChatService;
use crate::services::error::ServiceError;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, Filter, StoreError};

/// Requests for single listed books
///
/// `pending` moves to `approved` or `rejected` by the donor; approval opens
/// a pickup chat between the two sides. An approved request is completed by
/// either participant, which takes the book off the search results and
/// closes the chat.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    books: BookService,
    chats: ChatService,
}

impl RequestService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collections: Collections,
        books: BookService,
        chats: ChatService,
    ) -> Self {
        Self {
            store,
            collections,
            books,
            chats,
        }
    }

    pub async fn create(&self, requester_uid: &str, req: CreateBookRequest) -> Result<String, ServiceError> {
        let book = self
            .books
            .get(&req.book_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".to_string()))?;

        if book.donor_uid == requester_uid {
            return Err(ServiceError::Invalid("You cannot request your own book".to_string()));
        }
        if !book.available {
            return Err(ServiceError::Invalid("Book is no longer available".to_string()));
        }

        let open = self
            .store
            .query(
                &self.collections.requests,
                &[
                    Filter::eq("book_id", book.id.as_str()),
                    Filter::eq("requester_uid", requester_uid),
                ],
            )
            .await?
            .into_iter()
            .filter_map(|doc| doc.into_model::<BookRequest>("id").ok())
            .any(|r| matches!(r.status, RequestStatus::Pending | RequestStatus::Approved));

        if open {
            return Err(ServiceError::Invalid("You already requested this book".to_string()));
        }

        let request = BookRequest {
            id: String::new(),
            book_id: book.id,
            requester_uid: requester_uid.to_string(),
            donor_uid: book.donor_uid,
            status: RequestStatus::Pending,
            pickup_location: req.pickup_location,
            reason: req.reason,
            created_at: Utc::now(),
        };

        let id = self
            .store
            .create(&self.collections.requests, None, to_fields(&request, "id")?)
            .await?;

        tracing::info!("Request {} for book {} by {}", id, request.book_id, requester_uid);

        Ok(id)
    }

    /// Requests the user made or received, newest first
    pub async fn list_for(&self, uid: &str) -> Result<Vec<BookRequest>, StoreError> {
        let mut requests = Vec::new();

        for field in ["requester_uid", "donor_uid"] {
            let docs = self
                .store
                .query(&self.collections.requests, &[Filter::eq(field, uid)])
                .await?;

            for doc in docs {
                match doc.into_model::<BookRequest>("id") {
                    Ok(r) => requests.push(r),
                    Err(e) => tracing::warn!("Skipping unreadable request: {}", e),
                }
            }
        }

        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// A request visible to `uid`
    pub async fn get_for(&self, uid: &str, id: &str) -> Result<BookRequest, ServiceError> {
        let request = self
            .store
            .get(&self.collections.requests, id)
            .await?
            .map(|doc| doc.into_model::<BookRequest>("id"))
            .transpose()?
            .ok_or_else(|| ServiceError::NotFound("Request not found".to_string()))?;

        if !request.involves(uid) {
            return Err(ServiceError::Forbidden("Not a participant in this request".to_string()));
        }

        Ok(request)
    }

    pub async fn approve(&self, uid: &str, id: &str) -> Result<BookRequest, ServiceError> {
        self.decide(uid, id, RequestStatus::Approved).await
    }

    pub async fn reject(&self, uid: &str, id: &str) -> Result<BookRequest, ServiceError> {
        self.decide(uid, id, RequestStatus::Rejected).await
    }

    async fn decide(&self, uid: &str, id: &str, status: RequestStatus) -> Result<BookRequest, ServiceError> {
        let mut request = self.get_for(uid, id).await?;

        if request.donor_uid != uid {
            return Err(ServiceError::Forbidden("Only the donor can decide on a request".to_string()));
        }
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Invalid(format!(
                "Request is already {}",
                request.status.as_str()
            )));
        }

        self.set_status(id, status).await?;
        request.status = status;

        if status == RequestStatus::Approved {
            self.chats.open_for(&request).await?;
        }

        tracing::info!("Request {} {}", id, status.as_str());
        Ok(request)
    }

    /// Mark an approved request completed and the book unavailable
    pub async fn complete(&self, uid: &str, id: &str) -> Result<BookRequest, ServiceError> {
        let mut request = self.get_for(uid, id).await?;

        if request.status != RequestStatus::Approved {
            return Err(ServiceError::Invalid(format!(
                "Only approved requests can be completed, this one is {}",
                request.status.as_str()
            )));
        }

        self.set_status(id, RequestStatus::Completed).await?;
        self.books.mark_unavailable(&request.book_id).await?;
        request.status = RequestStatus::Completed;

        if let Err(e) = self.chats.close(id).await {
            tracing::warn!("Failed to close chat for request {}: {}", id, e);
        }

        tracing::info!("Request {} completed, book {} handed over", id, request.book_id);
        Ok(request)
    }

    async fn set_status(&self, id: &str, status: RequestStatus) -> Result<(), StoreError> {
        self.store
            .update(&self.collections.requests, id, fields(json!({ "status": status })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VisibilityRanker;
    use crate::services::store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, RequestService) {
        let store = Arc::new(MemoryStore::new());
        store
            .create(
                "books",
                Some("book-1"),
                fields(json!({
                    "donor_uid": "donor",
                    "title": "Physics Part 1",
                    "subject": "Physics",
                    "class_level": "11",
                    "board": "CBSE",
                    "condition": "good",
                    "city": "Chennai",
                    "area": "Adyar",
                    "available": true,
                    "created_at": Utc::now(),
                })),
            )
            .await
            .unwrap();

        let books = BookService::new(store.clone(), Collections::default(), VisibilityRanker::default());
        let chats = ChatService::new(store.clone(), Collections::default());
        let requests = RequestService::new(store.clone(), Collections::default(), books, chats);
        (store, requests)
    }

    fn ask(book_id: &str) -> CreateBookRequest {
        CreateBookRequest {
            book_id: book_id.to_string(),
            pickup_location: Some("Adyar library".to_string()),
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, requests) = setup().await;

        let id = requests.create("reader", ask("book-1")).await.unwrap();
        assert!(requests.create("reader", ask("book-1")).await.is_err());

        assert!(matches!(
            requests.approve("reader", &id).await,
            Err(ServiceError::Forbidden(_))
        ));

        let approved = requests.approve("donor", &id).await.unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);

        let chat = store.get("chats", &id).await.unwrap().unwrap();
        assert_eq!(chat.data.get("participants"), Some(&json!(["reader", "donor"])));
        assert_eq!(chat.data.get("active"), Some(&json!(true)));

        let done = requests.complete("reader", &id).await.unwrap();
        assert_eq!(done.status, RequestStatus::Completed);

        let book = store.get("books", "book-1").await.unwrap().unwrap();
        assert_eq!(book.data.get("available"), Some(&json!(false)));

        let chat = store.get("chats", &id).await.unwrap().unwrap();
        assert_eq!(chat.data.get("active"), Some(&json!(false)));

        assert!(matches!(
            requests.create("other", ask("book-1")).await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_pending_request_cannot_complete() {
        let (_, requests) = setup().await;
        let id = requests.create("reader", ask("book-1")).await.unwrap();

        assert!(matches!(
            requests.complete("donor", &id).await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_visibility_of_requests() {
        let (_, requests) = setup().await;
        let id = requests.create("reader", ask("book-1")).await.unwrap();

        assert!(requests.get_for("donor", &id).await.is_ok());
        assert!(matches!(
            requests.get_for("stranger", &id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            requests.get_for("reader", "missing").await,
            Err(ServiceError::NotFound(_))
        ));

        assert_eq!(requests.list_for("donor").await.unwrap().len(), 1);
        assert_eq!(requests.list_for("reader").await.unwrap().len(), 1);
        assert!(requests.list_for("stranger").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_own_and_missing_books() {
        let (_, requests) = setup().await;

        assert!(matches!(
            requests.create("donor", ask("book-1")).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            requests.create("reader", ask("nope")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejection_opens_no_chat() {
        let (store, requests) = setup().await;
        let id = requests.create("reader", ask("book-1")).await.unwrap();

        requests.reject("donor", &id).await.unwrap();

        assert!(store.get("chats", &id).await.unwrap().is_none());
    }
}
