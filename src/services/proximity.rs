use std::sync::Arc;

use crate::core::{within_radius, RadiusExpansion};
use crate::models::{Coordinates, PickupPoint, Role, User};
use crate::services::geocoder::GeoResolver;
use crate::services::store::{fields, Collections, DocumentStore, Filter, StoreError};

/// Result of a pickup-point search with radius escalation
#[derive(Debug, Clone)]
pub struct ProximityOutcome {
    pub points: Vec<PickupPoint>,
    /// Whether a radius larger than the requested one was searched
    pub expanded: bool,
    pub radius_km: f64,
}

/// Finds NGO pickup points near a location
///
/// NGOs registered without coordinates are geocoded from their "area, city"
/// on first encounter and the result is cached on their record. That
/// backfill is best-effort: failures only exclude the NGO from this search.
#[derive(Clone)]
pub struct ProximitySearch {
    store: Arc<dyn DocumentStore>,
    geocoder: GeoResolver,
    collections: Collections,
    expansion: RadiusExpansion,
}

impl ProximitySearch {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        geocoder: GeoResolver,
        collections: Collections,
        expansion: RadiusExpansion,
    ) -> Self {
        Self {
            store,
            geocoder,
            collections,
            expansion,
        }
    }

    /// NGOs within `radius_km` of `center`, nearest first
    pub async fn find_nearby(&self, center: Coordinates, radius_km: f64) -> Result<Vec<PickupPoint>, StoreError> {
        let located = self.locate_ngos().await?;
        let total = located.len();
        let points = within_radius(center, radius_km, located);

        tracing::debug!(
            "{} of {} located NGOs within {}km of ({}, {})",
            points.len(),
            total,
            radius_km,
            center.lat,
            center.lon
        );

        Ok(points)
    }

    /// Search the requested radius, then each larger tier until something is found
    ///
    /// NGOs are enumerated and backfilled once; every tier filters that same set.
    pub async fn find_with_expansion(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<ProximityOutcome, StoreError> {
        let located = self.locate_ngos().await?;
        let plan = self.expansion.plan(radius_km);
        let mut outcome = ProximityOutcome {
            points: Vec::new(),
            expanded: false,
            radius_km,
        };

        for (attempt, radius) in plan.into_iter().enumerate() {
            outcome.points = within_radius(center, radius, located.clone());
            outcome.radius_km = radius;
            outcome.expanded = attempt > 0;

            if !outcome.points.is_empty() {
                break;
            }
        }

        if outcome.expanded {
            tracing::info!(
                "Pickup search expanded from {}km to {}km ({} found)",
                radius_km,
                outcome.radius_km,
                outcome.points.len()
            );
        }

        Ok(outcome)
    }

    /// Every NGO with usable coordinates, in enumeration order
    async fn locate_ngos(&self) -> Result<Vec<(User, Coordinates)>, StoreError> {
        let docs = self
            .store
            .query(&self.collections.users, &[Filter::eq("role", Role::Ngo.as_str())])
            .await?;

        let mut located = Vec::with_capacity(docs.len());

        for doc in docs {
            let ngo = match doc.into_model::<User>("uid") {
                Ok(ngo) => ngo,
                Err(e) => {
                    tracing::warn!("Skipping unreadable NGO record: {}", e);
                    continue;
                }
            };

            if let Some(coordinates) = self.resolve_coordinates(&ngo).await {
                located.push((ngo, coordinates));
            }
        }

        Ok(located)
    }

    /// Cached coordinates, or a geocoded "area, city" persisted for next time
    async fn resolve_coordinates(&self, ngo: &User) -> Option<Coordinates> {
        if let Some(coordinates) = ngo.coordinates {
            return Some(coordinates);
        }

        let address = ngo.address_line()?;

        let coordinates = match self.geocoder.geocode(&address).await {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                tracing::debug!("No geocoding result for NGO {} ({})", ngo.uid, address);
                return None;
            }
            Err(e) => {
                tracing::warn!("Geocoding NGO {} ({}) failed: {}", ngo.uid, address, e);
                return None;
            }
        };

        let update = fields(coordinates.to_fields());
        if let Err(e) = self.store.update(&self.collections.users, &ngo.uid, update).await {
            tracing::warn!("Failed to cache coordinates for NGO {}: {}", ngo.uid, e);
        } else {
            tracing::info!("Backfilled coordinates for NGO {}", ngo.uid);
        }

        Some(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    async fn add_ngo(store: &MemoryStore, uid: &str, data: serde_json::Value) {
        let mut doc = fields(json!({"role": "ngo", "organization_name": format!("NGO {}", uid)}));
        doc.extend(fields(data));
        store.create("users", Some(uid), doc).await.unwrap();
    }

    fn search(store: Arc<MemoryStore>, geocoder_url: String) -> ProximitySearch {
        let geocoder = GeoResolver::new(geocoder_url, "EduCycle/1.0".to_string(), Duration::from_secs(2)).unwrap();
        ProximitySearch::new(store, geocoder, Collections::default(), RadiusExpansion::default())
    }

    #[tokio::test]
    async fn test_no_expansion_when_nearby() {
        let store = Arc::new(MemoryStore::new());
        add_ngo(&store, "near", json!({"latitude": 0.0, "longitude": 0.027})).await;

        let outcome = search(store, "http://127.0.0.1:9".to_string())
            .find_with_expansion(Coordinates::new(0.0, 0.0), 5.0)
            .await
            .unwrap();

        assert_eq!(outcome.points.len(), 1);
        assert!(!outcome.expanded);
    }

    #[tokio::test]
    async fn test_expands_to_twenty_km() {
        let store = Arc::new(MemoryStore::new());
        add_ngo(&store, "fifteen", json!({"latitude": 0.0, "longitude": 0.1347})).await;

        let outcome = search(store, "http://127.0.0.1:9".to_string())
            .find_with_expansion(Coordinates::new(0.0, 0.0), 5.0)
            .await
            .unwrap();

        assert_eq!(outcome.points.len(), 1);
        assert_eq!(outcome.points[0].uid, "fifteen");
        assert!(outcome.expanded);
        assert_eq!(outcome.radius_km, 20.0);
    }

    #[tokio::test]
    async fn test_no_ngos_exhausts_tiers() {
        let store = Arc::new(MemoryStore::new());

        let outcome = search(store, "http://127.0.0.1:9".to_string())
            .find_with_expansion(Coordinates::new(0.0, 0.0), 5.0)
            .await
            .unwrap();

        assert!(outcome.points.is_empty());
        assert!(outcome.expanded);
        assert_eq!(outcome.radius_km, 50.0);
    }

    #[tokio::test]
    async fn test_backfills_missing_coordinates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "Adyar, Chennai".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "13.0012", "lon": "80.2565"}]"#)
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        add_ngo(&store, "adyar", json!({"city": "Chennai", "area": "Adyar"})).await;

        let search = search(store.clone(), server.url());
        let points = search.find_nearby(Coordinates::new(13.0, 80.25), 5.0).await.unwrap();
        assert_eq!(points.len(), 1);

        // Second search uses the cached coordinates
        let points = search.find_nearby(Coordinates::new(13.0, 80.25), 5.0).await.unwrap();
        assert_eq!(points.len(), 1);
        mock.assert_async().await;

        let doc = store.get("users", "adyar").await.unwrap().unwrap();
        assert_eq!(doc.data.get("latitude"), Some(&json!(13.0012)));
        assert_eq!(doc.data.get("longitude"), Some(&json!(80.2565)));
        assert!(!doc.data.contains_key("coordinates"));
    }

    #[tokio::test]
    async fn test_geocoder_failure_excludes_ngo() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        add_ngo(&store, "broken", json!({"city": "Chennai", "area": "Adyar"})).await;
        add_ngo(&store, "ok", json!({"latitude": 13.0, "longitude": 80.25})).await;
        add_ngo(&store, "no_address", json!({"city": "Chennai"})).await;

        let points = search(store, server.url())
            .find_nearby(Coordinates::new(13.0, 80.25), 5.0)
            .await
            .unwrap();

        let ids: Vec<&str> = points.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_expansion_geocodes_each_ngo_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        add_ngo(&store, "broken", json!({"city": "Chennai", "area": "Adyar"})).await;

        let outcome = search(store, server.url())
            .find_with_expansion(Coordinates::new(13.0, 80.25), 5.0)
            .await
            .unwrap();

        assert!(outcome.points.is_empty());
        assert!(outcome.expanded);
        assert_eq!(outcome.radius_km, 50.0);
        mock.assert_async().await;
    }
}
