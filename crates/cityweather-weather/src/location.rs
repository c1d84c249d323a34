//! One-shot device location.

use async_trait::async_trait;
use cityweather_core::LocationConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::types::{Location, LocationError};

const REQUEST_TIMEOUT_SECS: u64 = 5;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Single best-effort fix; no retries
    async fn current_location(&self) -> Result<Location, LocationError>;
}

/// Approximate position from the public IP address (ipapi.co response shape)
#[derive(Debug, Clone)]
pub struct IpLocationSource {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpLocationSource {
    pub fn new(url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn current_location(&self) -> Result<Location, LocationError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            tracing::debug!("IP location lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpApiResponse = response.json().await?;
        if body.error {
            return Err(LocationError::Other(
                body.reason.unwrap_or_else(|| "lookup refused".to_string()),
            ));
        }

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Location {
                latitude,
                longitude,
                accuracy_meters: None,
                city_name: body.city.filter(|c| !c.trim().is_empty()),
            }),
            _ => Err(LocationError::ServiceUnavailable),
        }
    }
}

/// Position pinned in configuration
#[derive(Debug, Clone)]
pub struct FixedLocationSource {
    location: Location,
}

impl FixedLocationSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Location::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Ok(self.location.clone())
    }
}

/// Pick the source the configuration asks for; `None` when detection is off
pub fn source_from_config(
    config: &LocationConfig,
) -> Result<Option<Box<dyn LocationSource>>, LocationError> {
    if !config.detect {
        return Ok(None);
    }

    let source: Box<dyn LocationSource> = match config.fixed_position() {
        Some((lat, lon)) => Box::new(FixedLocationSource::new(lat, lon)),
        None => Box::new(IpLocationSource::new(config.ip_lookup_url.clone())?),
    };
    Ok(Some(source))
}
