//! EduCycle - book-donation marketplace backend
//!
//! Students list used textbooks and request them from each other; NGOs act
//! as pickup points and run bulk requests. Search results are ranked by the
//! donor's feedback-derived reputation, and pickup points are found by
//! distance with an adaptive search radius.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{aggregate_reputation, haversine_distance, RadiusExpansion, VisibilityRanker};
pub use crate::models::{Book, Coordinates, Feedback, PickupPoint, RankedBook, User};
pub use crate::routes::{configure_routes, AppState, StateOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let d = haversine_distance(13.0827, 80.2707, 13.0827, 80.2707);
        assert_eq!(d, 0.0);
        assert_eq!(RadiusExpansion::default().plan(5.0), vec![5.0, 20.0, 50.0]);
    }
}
