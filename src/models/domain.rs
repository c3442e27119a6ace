use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reputation shown for users who have not received any feedback yet
pub const NEUTRAL_REPUTATION: f64 = 5.0;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Ngo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Ngo => "ngo",
        }
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Stored form on a user record: flat `latitude` / `longitude` attributes
    pub fn to_fields(&self) -> serde_json::Value {
        serde_json::json!({ "latitude": self.lat, "longitude": self.lon })
    }
}

/// (De)serializes `Option<Coordinates>` as flat `latitude` / `longitude` fields
///
/// Document stores such as Appwrite have no nested object attribute type.
mod flat_coordinates {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Coordinates;

    #[derive(Serialize, Deserialize)]
    struct Flat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latitude: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        longitude: Option<f64>,
    }

    pub fn serialize<S: Serializer>(value: &Option<Coordinates>, serializer: S) -> Result<S::Ok, S::Error> {
        Flat {
            latitude: value.map(|c| c.lat),
            longitude: value.map(|c| c.lon),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Coordinates>, D::Error> {
        let flat = Flat::deserialize(deserializer)?;
        Ok(match (flat.latitude, flat.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        })
    }
}

/// User record (students and NGOs share one collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub uid: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    /// Absent until the first feedback addressed to this user is aggregated
    #[serde(default)]
    pub reputation: Option<f64>,
    #[serde(default)]
    pub mismatch_count: u32,
    #[serde(flatten, with = "flat_coordinates")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub blocked_uids: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name used when the user is shown to others
    pub fn public_name(&self) -> Option<&str> {
        self.organization_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.display_name.as_deref().filter(|n| !n.trim().is_empty()))
            .or_else(|| self.email.as_deref())
    }

    /// Reputation for display and ranking, neutral when never computed
    pub fn effective_reputation(&self) -> f64 {
        self.reputation.unwrap_or(NEUTRAL_REPUTATION)
    }

    /// "area, city" when both are present and non-blank
    pub fn address_line(&self) -> Option<String> {
        let city = self.city.as_deref().map(str::trim).unwrap_or_default();
        let area = self.area.as_deref().map(str::trim).unwrap_or_default();
        if city.is_empty() || area.is_empty() {
            return None;
        }
        Some(format!("{}, {}", area, city))
    }

    pub fn is_ngo(&self) -> bool {
        self.role == Role::Ngo
    }
}

/// A single feedback row; append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub id: String,
    pub from_uid: String,
    pub to_uid: String,
    pub rating: f64,
    #[serde(default)]
    pub condition_matched: Option<bool>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Book listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: String,
    pub donor_uid: String,
    /// Donor name captured when the book was listed
    #[serde(default)]
    pub donor_name: Option<String>,
    pub title: String,
    pub subject: String,
    pub class_level: String,
    pub board: String,
    pub condition: String,
    pub city: String,
    pub area: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool { true }

/// Lifecycle of a request for a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }
}

/// A student's (or NGO's) request for a listed book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRequest {
    #[serde(default)]
    pub id: String,
    pub book_id: String,
    pub requester_uid: String,
    pub donor_uid: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookRequest {
    pub fn involves(&self, uid: &str) -> bool {
        self.requester_uid == uid || self.donor_uid == uid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkStatus {
    Open,
    Completed,
}

/// NGO request for many copies of one kind of book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub id: String,
    pub ngo_uid: String,
    pub subject: String,
    pub class_level: String,
    pub board: String,
    pub quantity: u32,
    #[serde(default)]
    pub fulfilled: u32,
    pub status: BulkStatus,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BulkRequest {
    /// Add delivered copies; the request closes once the quantity is reached
    pub fn fulfill(&mut self, count: u32) {
        self.fulfilled = self.fulfilled.saturating_add(count);
        self.status = if self.fulfilled >= self.quantity {
            BulkStatus::Completed
        } else {
            BulkStatus::Open
        };
    }
}

/// Pickup conversation between the two sides of an approved request
///
/// Keyed by the request id, so a request has at most one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: String,
    pub request_id: String,
    pub participants: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn includes(&self, uid: &str) -> bool {
        self.participants.iter().any(|p| p == uid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub chat_id: String,
    pub sender_uid: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// An NGO's post about books it handed out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionEvent {
    #[serde(default)]
    pub id: String,
    pub ngo_uid: String,
    pub ngo_name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionComment {
    #[serde(default)]
    pub id: String,
    pub event_id: String,
    pub user_uid: String,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Books a user put back into circulation, and estimated savings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactStats {
    pub books_shared: u32,
    pub books_received: u32,
    pub total_requests_received: u32,
    pub pending_requests_received: u32,
    pub completed_requests_received: u32,
    pub total_reused: u32,
    pub money_saved_inr: f64,
    pub paper_saved_kg: f64,
    pub trees_protected: f64,
    pub co2_saved_kg: f64,
}

/// Aggregated reputation written back to a user record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub reputation: f64,
    pub mismatch_count: u32,
}

/// Best-effort locality extracted from a reverse geocode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub city: String,
    pub area: String,
    pub display_name: String,
}

/// NGO returned by a pickup-point search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPoint {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    pub coordinates: Coordinates,
    pub distance_km: f64,
}

/// Listing that survived visibility ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBook {
    #[serde(flatten)]
    pub book: Book,
    pub visibility_score: f64,
    pub owner_reputation: Option<f64>,
    pub owner_name: String,
}

/// Visibility ranking parameters
#[derive(Debug, Clone, Copy)]
pub struct VisibilityPolicy {
    pub mismatch_weight: f64,
    pub min_score: f64,
    pub neutral_reputation: f64,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            mismatch_weight: 0.5,
            min_score: 1.0,
            neutral_reputation: NEUTRAL_REPUTATION,
        }
    }
}

/// Reputation aggregation parameters
#[derive(Debug, Clone, Copy)]
pub struct ReputationPolicy {
    pub mismatch_penalty: f64,
    pub rating_floor: f64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            mismatch_penalty: 1.5,
            rating_floor: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            uid: "u1".to_string(),
            role,
            email: Some("u1@example.org".to_string()),
            display_name: None,
            organization_name: None,
            city: None,
            area: None,
            reputation: None,
            mismatch_count: 0,
            coordinates: None,
            blocked_uids: vec![],
            created_at: None,
        }
    }

    #[test]
    fn test_public_name_prefers_organization() {
        let mut u = user(Role::Ngo);
        u.display_name = Some("Priya".to_string());
        u.organization_name = Some("Book Bank Trust".to_string());
        assert_eq!(u.public_name(), Some("Book Bank Trust"));

        u.organization_name = Some("  ".to_string());
        assert_eq!(u.public_name(), Some("Priya"));
    }

    #[test]
    fn test_address_line_requires_both_parts() {
        let mut u = user(Role::Ngo);
        u.city = Some("Chennai".to_string());
        assert_eq!(u.address_line(), None);

        u.area = Some("Adyar".to_string());
        assert_eq!(u.address_line().as_deref(), Some("Adyar, Chennai"));
    }

    #[test]
    fn test_user_defaults_from_sparse_document() {
        let u: User = serde_json::from_value(serde_json::json!({
            "uid": "abc",
            "role": "student"
        }))
        .unwrap();

        assert_eq!(u.reputation, None);
        assert_eq!(u.mismatch_count, 0);
        assert_eq!(u.effective_reputation(), NEUTRAL_REPUTATION);
        assert!(u.blocked_uids.is_empty());
    }

    #[test]
    fn test_user_coordinates_are_flat_attributes() {
        let mut u = user(Role::Ngo);
        u.coordinates = Some(Coordinates::new(13.0012, 80.2565));

        let value = serde_json::to_value(&u).unwrap();
        assert_eq!(value["latitude"], 13.0012);
        assert_eq!(value["longitude"], 80.2565);
        assert!(value.get("coordinates").is_none());

        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back.coordinates, Some(Coordinates::new(13.0012, 80.2565)));

        let partial: User = serde_json::from_value(serde_json::json!({
            "uid": "abc",
            "role": "ngo",
            "latitude": 13.0
        }))
        .unwrap();
        assert_eq!(partial.coordinates, None);

        let none = serde_json::to_value(&user(Role::Student)).unwrap();
        assert!(none.get("latitude").is_none());
    }

    #[test]
    fn test_bulk_request_fulfill_closes_at_quantity() {
        let mut req = BulkRequest {
            id: "r1".to_string(),
            ngo_uid: "ngo".to_string(),
            subject: "Maths".to_string(),
            class_level: "10".to_string(),
            board: "CBSE".to_string(),
            quantity: 10,
            fulfilled: 0,
            status: BulkStatus::Open,
            city: None,
            area: None,
            created_at: Utc::now(),
        };

        req.fulfill(4);
        assert_eq!(req.status, BulkStatus::Open);
        req.fulfill(6);
        assert_eq!(req.fulfilled, 10);
        assert_eq!(req.status, BulkStatus::Completed);
    }
}
