use crate::models::{Coordinates, PickupPoint, User};

/// Default escalation radii in kilometers
pub const DEFAULT_EXPANSION_TIERS_KM: [f64; 2] = [20.0, 50.0];

/// Escalation tiers beyond the requested radius; a search makes at most
/// `MAX_EXPANSION_TIERS + 1` attempts
pub const MAX_EXPANSION_TIERS: usize = 2;

/// Keep NGOs within `radius_km` of `center`, nearest first
///
/// Each candidate carries the coordinates resolved for it. Equal distances
/// keep enumeration order.
pub fn within_radius(
    center: Coordinates,
    radius_km: f64,
    candidates: Vec<(User, Coordinates)>,
) -> Vec<PickupPoint> {
    let mut points: Vec<PickupPoint> = candidates
        .into_iter()
        .filter_map(|(ngo, coordinates)| {
            let distance_km = center.distance_km(&coordinates);
            if distance_km > radius_km {
                return None;
            }

            let name = ngo
                .public_name()
                .map(str::to_string)
                .unwrap_or_else(|| "Unnamed NGO".to_string());

            Some(PickupPoint {
                uid: ngo.uid,
                name,
                city: ngo.city,
                area: ngo.area,
                coordinates,
                distance_km,
            })
        })
        .collect();

    points.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    points
}

/// Bounded radius escalation used when a search comes back empty
#[derive(Debug, Clone)]
pub struct RadiusExpansion {
    tiers_km: Vec<f64>,
}

impl RadiusExpansion {
    pub fn new(mut tiers_km: Vec<f64>) -> Self {
        tiers_km.retain(|t| t.is_finite() && *t > 0.0);
        tiers_km.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        tiers_km.dedup();
        tiers_km.truncate(MAX_EXPANSION_TIERS);
        Self { tiers_km }
    }

    /// Radii to try, in order: the requested one, then every larger tier
    pub fn plan(&self, requested_km: f64) -> Vec<f64> {
        std::iter::once(requested_km)
            .chain(self.tiers_km.iter().copied().filter(|t| requested_km < *t))
            .collect()
    }
}

impl Default for RadiusExpansion {
    fn default() -> Self {
        Self::new(DEFAULT_EXPANSION_TIERS_KM.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn ngo(uid: &str) -> User {
        User {
            uid: uid.to_string(),
            role: Role::Ngo,
            email: None,
            display_name: None,
            organization_name: Some(format!("NGO {}", uid)),
            city: Some("Chennai".to_string()),
            area: Some("Adyar".to_string()),
            reputation: None,
            mismatch_count: 0,
            coordinates: None,
            blocked_uids: vec![],
            created_at: None,
        }
    }

    #[test]
    fn test_within_radius_sorted_by_distance() {
        let center = Coordinates::new(0.0, 0.0);
        let candidates = vec![
            (ngo("far"), Coordinates::new(0.0, 0.09)),   // ~10km
            (ngo("near"), Coordinates::new(0.0, 0.027)), // ~3km
            (ngo("out"), Coordinates::new(0.0, 0.5)),    // ~55km
        ];

        let points = within_radius(center, 20.0, candidates);

        let ids: Vec<&str> = points.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert_eq!(points[0].name, "NGO near");
    }

    #[test]
    fn test_radius_is_inclusive() {
        let center = Coordinates::new(0.0, 0.0);
        let target = Coordinates::new(0.0, 0.1);
        let exact = center.distance_km(&target);

        let points = within_radius(center, exact, vec![(ngo("edge"), target)]);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_expansion_plan() {
        let expansion = RadiusExpansion::default();

        assert_eq!(expansion.plan(5.0), vec![5.0, 20.0, 50.0]);
        assert_eq!(expansion.plan(20.0), vec![20.0, 50.0]);
        assert_eq!(expansion.plan(30.0), vec![30.0, 50.0]);
        assert_eq!(expansion.plan(80.0), vec![80.0]);
    }

    #[test]
    fn test_expansion_never_exceeds_three_attempts() {
        let expansion = RadiusExpansion::default();
        assert!(expansion.plan(0.5).len() <= 3);

        let oversized = RadiusExpansion::new(vec![50.0, 10.0, 30.0, 20.0]);
        assert_eq!(oversized.plan(5.0), vec![5.0, 10.0, 20.0]);
    }
}
