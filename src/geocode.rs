//! Place name to coordinates, delegated to the Open-Meteo geocoding API

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::GeocodingConfig;
use crate::constants::USER_AGENT;
use crate::error::GeocodeError;
use crate::models::{Coordinates, GeocodingResponse};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form place name to coordinates
    async fn geocode(&self, place: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    client: Arc<Client>,
    config: GeocodingConfig,
}

impl OpenMeteoGeocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| GeocodeError::Client(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, place: &str) -> Result<Coordinates, GeocodeError> {
        let failed = |reason: String| GeocodeError::Failed {
            place: place.to_string(),
            reason,
        };

        let url = format!("{}/search", self.config.base_url);
        debug!(url = %url, "Geocoding place name");

        let response = self
            .client
            .get(&url)
            .query(&[("name", place), ("count", "1"), ("format", "json")])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable response: {e}")))?;

        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound {
                place: place.to_string(),
            })?;

        debug!(name = %first.name, lat = first.latitude, lon = first.longitude, "Geocoded");

        Ok(Coordinates {
            latitude: first.latitude,
            longitude: first.longitude,
        })
    }
}
