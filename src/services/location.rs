use crate::models::{AddressInfo, Coordinates, PickupPointsQuery, PickupPointsResponse, UserLocation};
use crate::services::error::ServiceError;
use crate::services::geocoder::GeoResolver;
use crate::services::proximity::ProximitySearch;

/// Pickup-point lookup and the location helpers around it
#[derive(Clone)]
pub struct LocationService {
    geocoder: GeoResolver,
    proximity: ProximitySearch,
    default_radius_km: f64,
    max_radius_km: f64,
}

impl LocationService {
    pub fn new(geocoder: GeoResolver, proximity: ProximitySearch, default_radius_km: f64, max_radius_km: f64) -> Self {
        Self {
            geocoder,
            proximity,
            default_radius_km,
            max_radius_km,
        }
    }

    /// NGO pickup points around the caller
    ///
    /// Coordinates take precedence and are reverse geocoded for display.
    /// Otherwise "area, city" is geocoded, falling back to the city alone.
    pub async fn pickup_points(&self, query: &PickupPointsQuery) -> Result<PickupPointsResponse, ServiceError> {
        let radius_km = self.radius(query.radius)?;

        let (center, detected_address) = match (query.lat, query.lon) {
            (Some(lat), Some(lon)) => {
                let center = Coordinates::new(lat, lon);
                if !center.is_valid() {
                    return Err(ServiceError::Invalid("Coordinates out of range".to_string()));
                }
                (center, self.geocoder.reverse_geocode(lat, lon).await)
            }
            (None, None) => (self.locate(query).await?, None),
            _ => {
                return Err(ServiceError::Invalid(
                    "Both lat and lon are required when searching by coordinates".to_string(),
                ))
            }
        };

        let outcome = self.proximity.find_with_expansion(center, radius_km).await?;

        tracing::info!(
            "Found {} pickup points near ({}, {}) within {}km",
            outcome.points.len(),
            center.lat,
            center.lon,
            outcome.radius_km
        );

        Ok(PickupPointsResponse {
            user_location: UserLocation {
                lat: center.lat,
                lon: center.lon,
                detected_address,
            },
            pickup_points: outcome.points,
            search_expanded: outcome.expanded,
        })
    }

    fn radius(&self, requested: Option<f64>) -> Result<f64, ServiceError> {
        let radius = requested.unwrap_or(self.default_radius_km);
        if !radius.is_finite() || radius <= 0.0 || radius > self.max_radius_km {
            return Err(ServiceError::Invalid(format!(
                "radius must be between 0 and {} km",
                self.max_radius_km
            )));
        }
        Ok(radius)
    }

    async fn locate(&self, query: &PickupPointsQuery) -> Result<Coordinates, ServiceError> {
        let city = query.city.as_deref().map(str::trim).unwrap_or_default();
        let area = query.area.as_deref().map(str::trim).unwrap_or_default();

        if city.is_empty() || area.is_empty() {
            return Err(ServiceError::Invalid(
                "Provide either lat and lon, or both city and area".to_string(),
            ));
        }

        if let Some(center) = self.geocoder.geocode(&format!("{}, {}", area, city)).await? {
            return Ok(center);
        }

        tracing::debug!("No match for \"{}, {}\", retrying with city only", area, city);

        self.geocoder
            .geocode(city)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Could not identify location".to_string()))
    }

    /// Locality for a coordinate pair
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<AddressInfo, ServiceError> {
        if !Coordinates::new(lat, lon).is_valid() {
            return Err(ServiceError::Invalid("Coordinates out of range".to_string()));
        }

        self.geocoder
            .reverse_geocode(lat, lon)
            .await
            .ok_or_else(|| ServiceError::NotFound("Could not determine address".to_string()))
    }

    /// Whether a named place in a city can be found at all
    pub async fn verify(&self, name: &str, city: &str) -> Result<bool, ServiceError> {
        let found = self
            .geocoder
            .geocode(&format!("{}, {}", name.trim(), city.trim()))
            .await?;
        Ok(found.is_some())
    }
}
