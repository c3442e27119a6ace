use serde::{Deserialize, Serialize};

use crate::models::domain::{AddressInfo, PickupPoint, ReputationSnapshot, Role, User};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Resolved search center for a pickup-point lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    pub lat: f64,
    pub lon: f64,
    pub detected_address: Option<AddressInfo>,
}

/// Response for the pickup-points endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPointsResponse {
    pub user_location: UserLocation,
    pub pickup_points: Vec<PickupPoint>,
    pub search_expanded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyLocationResponse {
    pub valid: bool,
}

/// Returned when a document was created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}


/// Profile as shown to other users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub uid: String,
    pub role: Role,
    pub name: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    /// Neutral 5.0 until the first feedback arrives
    pub reputation: f64,
    pub mismatch_count: u32,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            role: user.role,
            name: user.public_name().map(str::to_string),
            city: user.city.clone(),
            area: user.area.clone(),
            reputation: user.effective_reputation(),
            mismatch_count: user.mismatch_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockListResponse {
    pub blocked_uids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub reputation: Option<ReputationSnapshot>,
}

/// State of the caller's like after a toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: u32,
}
