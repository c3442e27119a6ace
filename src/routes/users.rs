use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{BlockListResponse, BlockUserRequest, PublicProfile, RegisterRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(register))
        .route("/auth/me", web::get().to(me))
        .route("/users/block", web::post().to(block_user))
        .route("/users/block/{uid}", web::delete().to(unblock_user))
        .route("/users/{uid}", web::get().to(public_profile));
}

/// POST /api/v1/auth/register
///
/// Creates the caller's profile on first call and refreshes it afterwards.
async fn register(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let user = state.users.register(&identity, &req).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /api/v1/auth/me
async fn me(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let user = state.users.require(&identity.uid).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /api/v1/users/{uid}
async fn public_profile(
    state: web::Data<AppState>,
    uid: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = state.users.require(&uid).await?;
    Ok(HttpResponse::Ok().json(PublicProfile::from(&user)))
}

/// POST /api/v1/users/block
async fn block_user(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<BlockUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let blocked_uids = state.users.block(&identity.uid, &req.uid).await?;
    tracing::info!("{} blocked {}", identity.uid, req.uid);

    Ok(HttpResponse::Ok().json(BlockListResponse { blocked_uids }))
}

/// DELETE /api/v1/users/block/{uid}
async fn unblock_user(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    target: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let blocked_uids = state.users.unblock(&identity.uid, &target).await?;
    Ok(HttpResponse::Ok().json(BlockListResponse { blocked_uids }))
}
