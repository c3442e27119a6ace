use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{CommentRequest, CreateDistributionEvent, ListEventsQuery, Role};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};
use crate::services::DEFAULT_EVENT_LIMIT;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/distribution", web::get().to(list_events))
        .route("/distribution", web::post().to(create_event))
        .route("/distribution/{id}", web::delete().to(delete_event))
        .route("/distribution/{id}/like", web::post().to(toggle_like))
        .route("/distribution/{id}/comments", web::get().to(list_comments))
        .route("/distribution/{id}/comment", web::post().to(add_comment));
}

/// GET /api/v1/distribution
///
/// Public feed, newest first.
async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<ListEventsQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be positive".to_string()));
    }

    let events = state.distribution.list(limit).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// POST /api/v1/distribution
async fn create_event(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<CreateDistributionEvent>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let ngo = state.users.require_role(&identity.uid, Role::Ngo).await?;
    let event = state.distribution.create(&ngo, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(event))
}

async fn delete_event(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.distribution.delete(&identity.uid, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn toggle_like(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let like = state.distribution.toggle_like(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(like))
}

async fn list_comments(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let comments = state.distribution.comments(&id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /api/v1/distribution/{id}/comment
///
/// Comments carry the author's public name at the time of posting.
async fn add_comment(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let author = state.users.require(&identity.uid).await?;
    let comment = state
        .distribution
        .add_comment(&author, &id, req.into_inner().text)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}
