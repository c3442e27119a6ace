use actix_web::{web, HttpResponse};

use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/impact/me", web::get().to(my_impact));
}

/// GET /api/v1/impact/me
async fn my_impact(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let stats = state.impact.for_user(&identity.uid).await?;
    Ok(HttpResponse::Ok().json(stats))
}
