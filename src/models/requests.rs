use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Role;

/// Query string for book search
///
/// Only these keys reach the store; anything else in the query string is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBooksQuery {
    pub subject: Option<String>,
    pub class_level: Option<String>,
    pub board: Option<String>,
    pub condition: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    /// "true" or "false"; defaults to true
    pub available: Option<String>,
}

/// Query string for pickup-point lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PickupPointsQuery {
    pub city: Option<String>,
    pub area: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<f64>,
}

/// Query string for reverse geocoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Query string for pickup location verification
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyLocationQuery {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub city: String,
}

/// Feedback submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitFeedbackRequest {
    #[validate(length(min = 1))]
    pub to_uid: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    pub condition_matched: Option<bool>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// New book listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DonateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub class_level: String,
    #[validate(length(min = 1))]
    pub board: String,
    #[validate(length(min = 1))]
    pub condition: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub area: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Request for a listed book
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1))]
    pub book_id: String,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Profile registration after the identity provider has authenticated the user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    pub role: Role,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockUserRequest {
    #[validate(length(min = 1))]
    pub uid: String,
}

/// New NGO bulk request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBulkRequest {
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub class_level: String,
    #[validate(length(min = 1))]
    pub board: String,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FulfillBulkRequest {
    #[validate(range(min = 1))]
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// New distribution event post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDistributionEvent {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

/// Query string for the distribution feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEventsQuery {
    pub limit: Option<usize>,
}
