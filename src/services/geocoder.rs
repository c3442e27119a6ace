use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::core::{extract_address, RawAddress};
use crate::models::{AddressInfo, Coordinates};

/// Errors from the geocoding provider
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geocoding request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    RequestError(reqwest::Error),

    #[error("Geocoding provider returned {0}")]
    UpstreamStatus(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoError::Timeout
        } else {
            GeoError::RequestError(err)
        }
    }
}

/// Nominatim returns coordinates as strings; accept numbers as well
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(deserialize_with = "lenient_f64")]
    lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<RawAddress>,
}

/// Client for a Nominatim-compatible geocoding service
///
/// Forward lookups fail loudly with [`GeoError`] so callers can tell an
/// outage from "no such place"; reverse lookups are best-effort.
#[derive(Clone)]
pub struct GeoResolver {
    base_url: String,
    user_agent: String,
    client: Client,
}

impl GeoResolver {
    pub fn new(base_url: String, user_agent: String, timeout: Duration) -> Result<Self, GeoError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            user_agent,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Resolve a free-text address to coordinates
    ///
    /// `Ok(None)` means the provider answered but found nothing.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeoError> {
        tracing::debug!("Geocoding address: {}", address);

        let response = self
            .client
            .get(self.endpoint("search"))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeoError::UpstreamStatus(response.status().as_u16()));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

        Ok(hits.first().map(|hit| Coordinates::new(hit.lat, hit.lon)))
    }

    /// Best-effort locality for a coordinate pair
    ///
    /// Provider failures are logged and reported as `None`.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<AddressInfo> {
        match self.try_reverse_geocode(lat, lon).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Reverse geocoding ({}, {}) failed: {}", lat, lon, e);
                None
            }
        }
    }

    async fn try_reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<AddressInfo>, GeoError> {
        let response = self
            .client
            .get(self.endpoint("reverse"))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeoError::UpstreamStatus(response.status().as_u16()));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeoError::InvalidResponse(e.to_string()))?;

        Ok(body.address.as_ref().and_then(extract_address))
    }
}
