use thiserror::Error;

use super::geocoder::GeoError;
use super::store::StoreError;

/// Errors surfaced by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Geocoding service unavailable: {0}")]
    Geo(#[from] GeoError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),
}
