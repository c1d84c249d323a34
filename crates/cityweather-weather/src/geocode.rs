//! Geocoding: coordinates to locality names and back.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use crate::types::{GeocodeError, Location};
use cityweather_core::GeocodingConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl NominatimAddress {
    /// Prefer city > town > village > municipality
    fn locality(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reverse geocode coordinates to a locality name (e.g. "Kadıköy").
    ///
    /// A location that already carries a city name is answered without a request.
    #[instrument(skip(self), level = "debug")]
    pub async fn reverse(&self, location: &Location) -> Result<String, GeocodeError> {
        if let Some(city) = location.city_name.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(city.to_string());
        }

        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let locality = body
            .address
            .and_then(NominatimAddress::locality)
            .ok_or_else(|| {
                GeocodeError::NotFound(format!("{}, {}", location.latitude, location.longitude))
            })?;

        tracing::info!("Reverse geocoded to: {}", locality);
        Ok(locality)
    }

    /// Forward geocode a city name to its best-matching position.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, city: &str) -> Result<Location, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Forward geocode returned status {}", response.status());
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(city.to_string()))?;

        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", place.lat)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", place.lon)))?;

        tracing::debug!(
            "Geocoded {} to {}, {} ({})",
            city,
            latitude,
            longitude,
            place.display_name.as_deref().unwrap_or("-")
        );

        Ok(Location {
            latitude,
            longitude,
            accuracy_meters: None,
            city_name: Some(city.to_string()),
        })
    }
}
