use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::icon::IconBucket;
use crate::parse::ParseError;

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub city_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
            city_name: None,
        }
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// °C
    pub temperature: f64,
    /// Percent, truncated from the provider's real number
    pub humidity: i32,
    /// km/h
    pub wind_speed: f64,
    /// Provider icon code, e.g. `partly-cloudy-day`
    pub icon: String,
}

impl CurrentConditions {
    pub fn bucket(&self) -> IconBucket {
        IconBucket::from_code(&self.icon)
    }
}

const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Day stamp of a forecast record.
///
/// `yyyy-MM-dd` becomes a calendar date; anything else is kept verbatim so
/// the row still shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForecastDate {
    Calendar(NaiveDate),
    Raw(String),
}

impl ForecastDate {
    pub fn parse(text: &str) -> Self {
        match NaiveDate::parse_from_str(text, WIRE_DATE_FORMAT) {
            Ok(date) => Self::Calendar(date),
            Err(_) => Self::Raw(text.to_string()),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Calendar(date) => Some(*date),
            Self::Raw(_) => None,
        }
    }
}

impl From<NaiveDate> for ForecastDate {
    fn from(date: NaiveDate) -> Self {
        Self::Calendar(date)
    }
}

impl fmt::Display for ForecastDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calendar(date) => write!(f, "{}", date.format(WIRE_DATE_FORMAT)),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

/// One calendar day of forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub date: ForecastDate,
    pub temperature: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub icon: String,
}

impl Forecast {
    pub fn bucket(&self) -> IconBucket {
        IconBucket::from_code(&self.icon)
    }
}

/// Result of one successful fetch.
///
/// Replaced wholesale by the next fetch; never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    /// `None` when the provider omitted or mangled the current conditions block
    pub current: Option<CurrentConditions>,
    /// Provider order, at most the configured day limit
    pub days: Vec<Forecast>,
    pub fetched_at: DateTime<Utc>,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location detection disabled")]
    Disabled,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Geocoding errors, in either direction
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("No match for '{0}'")]
    NotFound(String),
    #[error("Geocoder returned status {0}")]
    Status(u16),
    #[error("Invalid geocoder response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("City not found: {0}")]
    CityNotFound(String),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("Weather API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
