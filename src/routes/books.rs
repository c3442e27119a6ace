use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{CreatedResponse, DonateBookRequest, Role, SearchBooksQuery};
use crate::routes::auth::{AuthenticatedUser, OptionalUser};
use crate::routes::{ApiError, AppState};
use crate::services::BookFilters;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/books/donate", web::post().to(donate))
        .route("/books/search", web::get().to(search))
        .route("/books/{id}", web::get().to(get_book));
}

/// POST /api/v1/books/donate
async fn donate(
    state: web::Data<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    req: web::Json<DonateBookRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let donor = state.users.require_role(&identity.uid, Role::Student).await?;
    let id = state.books.donate(&donor, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(CreatedResponse { id }))
}

/// GET /api/v1/books/search
///
/// Listings matching the filters, ranked by owner reputation. Signed-in
/// callers do not see their own listings or those of users they blocked.
async fn search(
    state: web::Data<AppState>,
    OptionalUser(identity): OptionalUser,
    query: web::Query<SearchBooksQuery>,
) -> Result<HttpResponse, ApiError> {
    let filters = BookFilters::try_from(&*query)?;

    let viewer = match &identity {
        Some(identity) => state.users.get(&identity.uid).await?,
        None => None,
    };

    let results = state.books.search(&filters, viewer.as_ref()).await?;

    tracing::info!(
        "Book search returned {} results{}",
        results.len(),
        identity
            .as_ref()
            .map(|i| format!(" for {}", i.uid))
            .unwrap_or_default()
    );

    Ok(HttpResponse::Ok().json(results))
}

/// GET /api/v1/books/{id}
async fn get_book(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let book = state
        .books
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(HttpResponse::Ok().json(book))
}
