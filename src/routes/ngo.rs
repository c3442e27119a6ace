use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{CreateBulkRequest, CreatedResponse, FulfillBulkRequest, Role};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ngo/bulk-request", web::get().to(list_bulk_requests))
        .route("/ngo/bulk-request", web::post().to(create_bulk_request))
        .route("/ngo/bulk-request/{id}/fulfill", web::post().to(fulfill_bulk_request));
}

async fn list_bulk_requests(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let ngo = state.users.require_role(&identity.uid, Role::Ngo).await?;
    let requests = state.bulk.list(&ngo.uid).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// POST /api/v1/ngo/bulk-request
async fn create_bulk_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<CreateBulkRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let ngo = state.users.require_role(&identity.uid, Role::Ngo).await?;
    let id = state.bulk.create(&ngo, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// POST /api/v1/ngo/bulk-request/{id}/fulfill
async fn fulfill_bulk_request(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
    req: web::Json<FulfillBulkRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let ngo = state.users.require_role(&identity.uid, Role::Ngo).await?;
    let bulk = state.bulk.fulfill(&ngo.uid, &id, req.count).await?;

    Ok(HttpResponse::Ok().json(bulk))
}
