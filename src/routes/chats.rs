use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::SendMessageRequest;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chats/{id}", web::get().to(get_chat))
        .route("/chats/{id}/messages", web::get().to(list_messages))
        .route("/chats/{id}/message", web::post().to(send_message));
}

/// GET /api/v1/chats/{id}
///
/// Chats share their id with the request they were opened for.
async fn get_chat(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let chat = state.chats.get_for(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(chat))
}

async fn list_messages(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let messages = state.chats.messages(&identity.uid, &id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/v1/chats/{id}/message
async fn send_message(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    id: web::Path<String>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let message = state
        .chats
        .send(&identity.uid, &id, req.into_inner().message)
        .await?;

    Ok(HttpResponse::Created().json(message))
}
