//! Visual Crossing timeline client.

use async_trait::async_trait;
use cityweather_core::WeatherConfig;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::parse::{parse_report, MAX_FORECAST_DAYS};
use crate::types::{FetchError, WeatherReport};

const TIMELINE_PATH: [&str; 4] = ["VisualCrossingWebServices", "rest", "services", "timeline"];

/// Anything that can produce a weather report for a city
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<WeatherReport, FetchError>;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
    unit_group: String,
    include: String,
    max_days: usize,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.clone(),
            api_key: config.has_api_key().then(|| config.api_key.clone()).flatten(),
            unit_group: config.unit_group.clone(),
            include: config.include.clone(),
            max_days: config.max_days.min(MAX_FORECAST_DAYS),
        })
    }

    /// Build the timeline request URL; `city` becomes one percent-encoded path segment
    pub fn timeline_url(&self, city: &str) -> Result<Url, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let mut url =
            Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(TIMELINE_PATH)
            .push(city);
        url.query_pairs_mut()
            .append_pair("unitGroup", &self.unit_group)
            .append_pair("key", api_key)
            .append_pair("include", &self.include);

        Ok(url)
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, city: &str) -> Result<WeatherReport, FetchError> {
        let url = self.timeline_url(city)?;

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Weather request failed: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Weather API returned status {} for {}", status, city);
            return Err(match status {
                StatusCode::UNAUTHORIZED => FetchError::InvalidApiKey,
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                    FetchError::CityNotFound(city.to_string())
                }
                _ => FetchError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                },
            });
        }

        let report = parse_report(city, &body, self.max_days).map_err(|e| {
            tracing::warn!("Weather response for {} could not be parsed: {}", city, e);
            FetchError::from(e)
        })?;

        tracing::info!(
            "Fetched weather for {}: {} days, current conditions {}",
            city,
            report.days.len(),
            if report.current.is_some() { "present" } else { "missing" }
        );
        Ok(report)
    }
}
