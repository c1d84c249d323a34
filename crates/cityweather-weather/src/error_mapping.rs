//! Maps weather crate errors to cityweather_core::AppError for consistent user-facing messages.

use cityweather_core::config::API_KEY_ENV;
use cityweather_core::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use crate::maps::MapError;
use crate::parse::ParseError;
use crate::resolver::ResolveError;
use crate::types::{FetchError, GeocodeError, LocationError};

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::MissingApiKey => {
                AppError::Config(ConfigError::MissingSetting(API_KEY_ENV.to_string()))
            }
            FetchError::InvalidApiKey => AppError::Weather(WeatherError::InvalidApiKey),
            FetchError::CityNotFound(city) => AppError::Weather(WeatherError::CityNotFound(city)),
            FetchError::InvalidUrl(s) => AppError::Weather(WeatherError::ApiError(s)),
            FetchError::Status { status, body } if status >= 500 => {
                AppError::Network(NetworkError::ServerError {
                    status,
                    message: body,
                })
            }
            FetchError::Status { status, body } => {
                AppError::Weather(WeatherError::ApiError(format!("{}: {}", status, body)))
            }
            FetchError::Network(e) => AppError::Network(e.into_network_error()),
            FetchError::Parse(e) => e.into(),
        }
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        AppError::Network(NetworkError::InvalidResponse(e.to_string()))
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Weather(WeatherError::LocationUnavailable(e.to_string()))
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::NotFound(s) => AppError::Weather(WeatherError::CityNotFound(s)),
            GeocodeError::Network(e) => AppError::Network(e.into_network_error()),
            other => AppError::Weather(WeatherError::ApiError(other.to_string())),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Location(e) => e.into(),
            ResolveError::Geocode(e) => e.into(),
        }
    }
}

impl From<MapError> for AppError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::Geocode(e) => e.into(),
            other => AppError::Weather(WeatherError::MapFailed(other.to_string())),
        }
    }
}
