use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::core::{Viewer, VisibilityRanker};
use crate::models::{Book, DonateBookRequest, RankedBook, SearchBooksQuery, User};
use crate::services::error::ServiceError;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, Filter, StoreError};

/// Typed search filters: the only keys a search may constrain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilters {
    pub subject: Option<String>,
    pub class_level: Option<String>,
    pub board: Option<String>,
    pub condition: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub available: bool,
}

impl TryFrom<&SearchBooksQuery> for BookFilters {
    type Error = ServiceError;

    fn try_from(query: &SearchBooksQuery) -> Result<Self, Self::Error> {
        let available = match query.available.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) if v.eq_ignore_ascii_case("false") => false,
            Some(other) => {
                return Err(ServiceError::Invalid(format!(
                    "available must be \"true\" or \"false\", got \"{}\"",
                    other
                )))
            }
        };

        Ok(Self {
            subject: non_blank(&query.subject),
            class_level: non_blank(&query.class_level),
            board: non_blank(&query.board),
            condition: non_blank(&query.condition),
            city: non_blank(&query.city),
            area: non_blank(&query.area),
            available,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl BookFilters {
    /// Store predicates for these filters
    pub fn to_store_filters(&self) -> Vec<Filter> {
        let mut filters = vec![Filter::eq("available", self.available)];

        let text = [
            ("subject", &self.subject),
            ("class_level", &self.class_level),
            ("board", &self.board),
            ("condition", &self.condition),
            ("city", &self.city),
            ("area", &self.area),
        ];

        for (field, value) in text {
            if let Some(value) = value {
                filters.push(Filter::eq(field, value.as_str()));
            }
        }

        filters
    }
}

/// Book listings: donation, lookup and reputation-ranked search
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
    ranker: VisibilityRanker,
}

impl BookService {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections, ranker: VisibilityRanker) -> Self {
        Self {
            store,
            collections,
            ranker,
        }
    }

    /// List a new book; the donor's current name is captured on the listing
    pub async fn donate(&self, donor: &User, req: DonateBookRequest) -> Result<String, StoreError> {
        let book = Book {
            id: String::new(),
            donor_uid: donor.uid.clone(),
            donor_name: donor.public_name().map(str::to_string),
            title: req.title,
            subject: req.subject,
            class_level: req.class_level,
            board: req.board,
            condition: req.condition,
            city: req.city,
            area: req.area,
            description: req.description,
            image_urls: req.image_urls,
            available: true,
            created_at: Utc::now(),
        };

        let id = self
            .store
            .create(&self.collections.books, None, to_fields(&book, "id")?)
            .await?;

        tracing::info!("Book {} listed by {}", id, donor.uid);

        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Book>, StoreError> {
        self.store
            .get(&self.collections.books, id)
            .await?
            .map(|doc| doc.into_model::<Book>("id"))
            .transpose()
    }

    pub async fn mark_unavailable(&self, id: &str) -> Result<(), StoreError> {
        self.store
            .update(&self.collections.books, id, fields(json!({ "available": false })))
            .await
    }

    /// Filtered listings ranked by owner visibility
    ///
    /// `viewer` is the signed-in user, if any; their own listings and those
    /// of users they blocked are hidden.
    pub async fn search(&self, filters: &BookFilters, viewer: Option<&User>) -> Result<Vec<RankedBook>, StoreError> {
        let docs = self
            .store
            .query(&self.collections.books, &filters.to_store_filters())
            .await?;

        let candidates: Vec<Book> = docs
            .into_iter()
            .filter_map(|doc| match doc.into_model::<Book>("id") {
                Ok(book) => Some(book),
                Err(e) => {
                    tracing::warn!("Skipping unreadable book: {}", e);
                    None
                }
            })
            .collect();

        let owners = self.load_owners(&candidates).await?;
        let total = candidates.len();

        let ranked = self
            .ranker
            .rank(candidates, &owners, viewer.map(Viewer::from_user));

        tracing::debug!("Search returned {} of {} candidate books", ranked.len(), total);

        Ok(ranked)
    }

    async fn load_owners(&self, books: &[Book]) -> Result<HashMap<String, User>, StoreError> {
        let mut owners = HashMap::new();

        for book in books {
            if owners.contains_key(&book.donor_uid) {
                continue;
            }
            if let Some(doc) = self.store.get(&self.collections.users, &book.donor_uid).await? {
                match doc.into_model::<User>("uid") {
                    Ok(user) => {
                        owners.insert(book.donor_uid.clone(), user);
                    }
                    Err(e) => tracing::warn!("Unreadable owner {}: {}", book.donor_uid, e),
                }
            }
        }

        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_ignore_blank_values() {
        let query = SearchBooksQuery {
            subject: Some("Maths".to_string()),
            board: Some("  ".to_string()),
            ..Default::default()
        };

        let filters = BookFilters::try_from(&query).unwrap();
        assert_eq!(
            filters.to_store_filters(),
            vec![Filter::eq("available", true), Filter::eq("subject", "Maths")]
        );
    }

    #[test]
    fn test_available_coercion() {
        let mut query = SearchBooksQuery::default();

        query.available = Some("false".to_string());
        assert!(!BookFilters::try_from(&query).unwrap().available);

        query.available = Some("TRUE".to_string());
        assert!(BookFilters::try_from(&query).unwrap().available);

        query.available = Some("yes".to_string());
        assert!(matches!(BookFilters::try_from(&query), Err(ServiceError::Invalid(_))));
    }
}
