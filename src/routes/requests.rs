use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{CreateBookRequest, CreatedResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/requests", web::post().to(create_request))
        .route("/requests", web::get().to(list_requests))
        .route("/requests/{id}", web::get().to(get_request))
        .route("/requests/{id}/approve", web::post().to(approve_request))
        .route("/requests/{id}/reject", web::post().to(reject_request))
        .route("/requests/{id}/complete", web::post().to(complete_request));
}

/// POST /api/v1/requests
async fn create_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<CreateBookRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    state.users.require(&identity.uid).await?;
    let id = state.requests.create(&identity.uid, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /api/v1/requests
///
/// Requests the caller made and requests for the caller's books.
async fn list_requests(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let requests = state.requests.list_for(&identity.uid).await?;
    tracing::debug!("{} requests for {}", requests.len(), identity.uid);
    Ok(HttpResponse::Ok().json(requests))
}

async fn get_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.get_for(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(request))
}

async fn approve_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.approve(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(request))
}

async fn reject_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.reject(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// POST /api/v1/requests/{id}/complete
///
/// Either participant may confirm the handover; the book leaves search results.
async fn complete_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.complete(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(request))
}
