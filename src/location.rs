//! Kiosk geolocation

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

/// Source of the kiosk's current position
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, RemoteError>;
}

/// Fixed coordinates from configuration
pub struct StaticLocation {
    coordinates: Coordinates,
}

impl StaticLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait::async_trait]
impl LocationProvider for StaticLocation {
    async fn current_position(&self) -> Result<Coordinates, RemoteError> {
        Ok(self.coordinates)
    }
}

/// Position fetched from a JSON endpoint on every request
pub struct HttpLocation {
    client: reqwest::Client,
    url: String,
}

impl HttpLocation {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url = url.into();
        info!("HTTP location provider: {}", url);
        Ok(Self { client, url })
    }
}

#[async_trait::async_trait]
impl LocationProvider for HttpLocation {
    async fn current_position(&self) -> Result<Coordinates, RemoteError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let coordinates: Coordinates = response.json().await?;
        if !coordinates.latitude.is_finite() || !coordinates.longitude.is_finite() {
            return Err(RemoteError::InvalidResponse(
                "coordinates are not finite".to_string(),
            ));
        }
        debug!(
            "Location: {:.5}, {:.5}",
            coordinates.latitude, coordinates.longitude
        );
        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_field_names_are_accepted() {
        let short: Coordinates = serde_json::from_str(r#"{"lat": -23.5, "lon": -46.6}"#).unwrap();
        let long: Coordinates =
            serde_json::from_str(r#"{"latitude": -23.5, "longitude": -46.6}"#).unwrap();
        assert_eq!(short, long);
    }

    #[tokio::test]
    async fn static_location_always_answers() {
        let provider = StaticLocation::new(41.9, 12.5);
        let position = provider.current_position().await.unwrap();
        assert_eq!(position.latitude, 41.9);
        assert_eq!(position.longitude, 12.5);
    }
}
