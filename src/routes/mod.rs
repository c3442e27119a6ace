// Route exports
pub mod auth;
pub mod books;
pub mod chats;
pub mod distribution;
pub mod error;
pub mod feedback;
pub mod health;
pub mod impact;
pub mod location;
pub mod ngo;
pub mod requests;
pub mod users;

use std::sync::Arc;

use actix_web::web;

use crate::core::{RadiusExpansion, VisibilityRanker};
use crate::models::{ReputationPolicy, VisibilityPolicy};
use crate::services::{
    BookService, BulkRequestService, ChatService, Collections, DistributionService, DocumentStore,
    FeedbackService, GeoResolver, IdentityVerifier, ImpactService, LocationService,
    ProximitySearch, ReputationService, RequestService, UserService,
};

pub use error::ApiError;

/// Tunables the services are built with
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub collections: Collections,
    pub reputation: ReputationPolicy,
    pub visibility: VisibilityPolicy,
    pub expansion: RadiusExpansion,
    pub default_radius_km: f64,
    pub max_radius_km: f64,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            collections: Collections::default(),
            reputation: ReputationPolicy::default(),
            visibility: VisibilityPolicy::default(),
            expansion: RadiusExpansion::default(),
            default_radius_km: 5.0,
            max_radius_km: 200.0,
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub users: UserService,
    pub books: BookService,
    pub requests: RequestService,
    pub chats: ChatService,
    pub feedback: FeedbackService,
    pub bulk: BulkRequestService,
    pub distribution: DistributionService,
    pub impact: ImpactService,
    pub location: LocationService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        geocoder: GeoResolver,
        verifier: Arc<dyn IdentityVerifier>,
        options: StateOptions,
    ) -> Self {
        let collections = options.collections;

        let users = UserService::new(store.clone(), geocoder.clone(), collections.clone());
        let books = BookService::new(
            store.clone(),
            collections.clone(),
            VisibilityRanker::new(options.visibility),
        );
        let chats = ChatService::new(store.clone(), collections.clone());
        let requests = RequestService::new(
            store.clone(),
            collections.clone(),
            books.clone(),
            chats.clone(),
        );
        let reputation = ReputationService::new(store.clone(), collections.clone(), options.reputation);
        let feedback = FeedbackService::new(store.clone(), collections.clone(), reputation);
        let bulk = BulkRequestService::new(store.clone(), collections.clone());
        let distribution = DistributionService::new(store.clone(), collections.clone());
        let impact = ImpactService::new(store.clone(), collections.clone());
        let proximity = ProximitySearch::new(
            store.clone(),
            geocoder.clone(),
            collections,
            options.expansion,
        );
        let location = LocationService::new(
            geocoder,
            proximity,
            options.default_radius_km,
            options.max_radius_km,
        );

        Self {
            store,
            verifier,
            users,
            books,
            requests,
            chats,
            feedback,
            bulk,
            distribution,
            impact,
            location,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(users::configure)
            .configure(books::configure)
            .configure(requests::configure)
            .configure(chats::configure)
            .configure(feedback::configure)
            .configure(impact::configure)
            .configure(location::configure)
            .configure(ngo::configure)
            .configure(distribution::configure),
    );
}
