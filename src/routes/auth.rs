use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};

use crate::routes::error::ApiError;
use crate::routes::AppState;
use crate::services::{bearer_token, AuthError, Identity};

/// Caller identity from a required bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Caller identity when a bearer token is present
///
/// A missing header yields `None`; a present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<Identity>);

fn state(req: &HttpRequest) -> Result<&web::Data<AppState>, ApiError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state is not configured".to_string()))
}

fn authorization(req: &HttpRequest) -> Option<&str> {
    req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn verify(req: &HttpRequest, header: &str) -> Result<Identity, ApiError> {
    let token = bearer_token(header).ok_or(AuthError::MissingToken)?;
    let identity = state(req)?.verifier.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token on {}: {}", req.path(), e);
        e
    })?;
    Ok(identity)
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match authorization(req) {
            Some(header) => verify(req, header).map(AuthenticatedUser),
            None => Err(AuthError::MissingToken.into()),
        };
        ready(result)
    }
}

impl FromRequest for OptionalUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match authorization(req) {
            Some(header) => verify(req, header).map(|identity| OptionalUser(Some(identity))),
            None => Ok(OptionalUser(None)),
        };
        ready(result)
    }
}
