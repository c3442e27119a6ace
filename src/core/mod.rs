// Core algorithm exports
pub mod address;
pub mod distance;
pub mod impact;
pub mod proximity;
pub mod reputation;
pub mod visibility;

pub use address::{compose_display_name, extract_address, normalize_place_name, RawAddress};
pub use distance::haversine_distance;
pub use impact::{impact_stats, ImpactCounts};
pub use proximity::{within_radius, RadiusExpansion, DEFAULT_EXPANSION_TIERS_KM, MAX_EXPANSION_TIERS};
pub use reputation::aggregate_reputation;
pub use visibility::{Viewer, VisibilityRanker};
