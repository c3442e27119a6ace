// Service exports
pub mod books;
pub mod chat;
pub mod distribution;
pub mod error;
pub mod feedback;
pub mod geocoder;
pub mod identity;
pub mod impact;
pub mod location;
pub mod ngo;
pub mod proximity;
pub mod reputation;
pub mod requests;
pub mod store;
pub mod users;

pub use books::{BookFilters, BookService};
pub use chat::ChatService;
pub use distribution::{DistributionService, DEFAULT_EVENT_LIMIT, MAX_EVENT_LIMIT};
pub use error::ServiceError;
pub use feedback::{FeedbackReceipt, FeedbackService};
pub use geocoder::{GeoError, GeoResolver};
pub use identity::{bearer_token, AuthError, Identity, IdentityVerifier, JwtVerifier};
pub use impact::ImpactService;
pub use location::LocationService;
pub use ngo::BulkRequestService;
pub use proximity::{ProximityOutcome, ProximitySearch};
pub use reputation::ReputationService;
pub use requests::RequestService;
pub use store::{
    AppwriteStore, Collections, Document, DocumentStore, Filter, MemoryStore, PostgresStore,
    StoreError,
};
pub use users::UserService;
