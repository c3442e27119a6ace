use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{FeedbackResponse, SubmitFeedbackRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feedback", web::post().to(submit_feedback));
}

/// POST /api/v1/feedback
///
/// Request body:
/// ```json
/// {
///   "to_uid": "string",
///   "rating": 1-5,
///   "condition_matched": true,
///   "request_id": "string",
///   "comment": "string"
/// }
/// ```
async fn submit_feedback(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<SubmitFeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let receipt = state.feedback.submit(&identity.uid, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(FeedbackResponse {
        id: receipt.id,
        reputation: receipt.reputation,
    }))
}
