use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{PickupPointsQuery, ReverseGeocodeQuery, VerifyLocationQuery, VerifyLocationResponse};
use crate::routes::{ApiError, AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/location/pickup-points", web::get().to(pickup_points))
        .route("/location/reverse", web::get().to(reverse_geocode))
        .route("/location/verify", web::get().to(verify_location));
}

/// GET /api/v1/location/pickup-points?lat=&lon=&radius=
/// GET /api/v1/location/pickup-points?city=&area=&radius=
///
/// NGOs near the caller. The radius widens to 20 km and then 50 km when
/// nothing is found; `search_expanded` reports whether that happened.
async fn pickup_points(
    state: web::Data<AppState>,
    query: web::Query<PickupPointsQuery>,
) -> Result<HttpResponse, ApiError> {
    let response = state.location.pickup_points(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/location/reverse?lat=&lon=
async fn reverse_geocode(
    state: web::Data<AppState>,
    query: web::Query<ReverseGeocodeQuery>,
) -> Result<HttpResponse, ApiError> {
    let address = state.location.reverse(query.lat, query.lon).await?;
    Ok(HttpResponse::Ok().json(address))
}

/// GET /api/v1/location/verify?name=&city=
async fn verify_location(
    state: web::Data<AppState>,
    query: web::Query<VerifyLocationQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let valid = state.location.verify(&query.name, &query.city).await?;
    Ok(HttpResponse::Ok().json(VerifyLocationResponse { valid }))
}
