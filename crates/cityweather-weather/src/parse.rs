//! Visual Crossing timeline response parsing.
//!
//! Each record (the current conditions block and every day entry) is
//! validated on its own. A bad record is dropped; it never fails the whole
//! response.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::icon::IconBucket;
use crate::types::{CurrentConditions, Forecast, ForecastDate, WeatherReport};

/// Hard cap on day entries in a report; larger `max_days` values are clamped
pub const MAX_FORECAST_DAYS: usize = cityweather_core::config::FORECAST_DAY_LIMIT;

/// Whole-response failures
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
}

/// Why a single record was skipped
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawConditions {
    temp: f64,
    humidity: f64,
    windspeed: f64,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    datetime: String,
    temp: f64,
    humidity: f64,
    windspeed: f64,
    icon: String,
}

impl From<RawConditions> for CurrentConditions {
    fn from(raw: RawConditions) -> Self {
        Self {
            temperature: raw.temp,
            humidity: raw.humidity as i32,
            wind_speed: raw.windspeed,
            icon: raw.icon,
        }
    }
}

fn ensure_object(value: &Value) -> Result<(), RecordError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(RecordError::NotAnObject)
    }
}

/// Validate the `currentConditions` block
pub fn parse_current(value: &Value) -> Result<CurrentConditions, RecordError> {
    ensure_object(value)?;
    let raw = RawConditions::deserialize(value)?;
    Ok(raw.into())
}

/// Validate one entry of `days`. A `datetime` outside `yyyy-MM-dd` is kept as text.
pub fn parse_day(value: &Value) -> Result<Forecast, RecordError> {
    ensure_object(value)?;
    let raw = RawDay::deserialize(value)?;
    let date = ForecastDate::parse(&raw.datetime);
    if date.as_date().is_none() {
        tracing::debug!("Day stamp '{}' is not yyyy-MM-dd, keeping it as text", raw.datetime);
    }

    Ok(Forecast {
        date,
        temperature: raw.temp,
        humidity: raw.humidity as i32,
        wind_speed: raw.windspeed,
        icon: raw.icon,
    })
}

/// Parse a timeline response body for `city`.
///
/// Only the first `max_days` (never more than [`MAX_FORECAST_DAYS`]) entries
/// of `days` are looked at; malformed ones among them are skipped and the
/// rest keep provider order.
pub fn parse_report(city: &str, body: &str, max_days: usize) -> Result<WeatherReport, ParseError> {
    let json: Value = serde_json::from_str(body)?;
    let root = json.as_object().ok_or(ParseError::NotAnObject)?;

    let current = match root.get("currentConditions") {
        Some(block) => match parse_current(block) {
            Ok(current) => {
                note_unknown_icon(&current.icon);
                Some(current)
            }
            Err(e) => {
                tracing::debug!("Skipping current conditions: {}", e);
                None
            }
        },
        None => {
            tracing::debug!("Response has no currentConditions block");
            None
        }
    };

    let days = match root.get("days").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .take(max_days.min(MAX_FORECAST_DAYS))
            .enumerate()
            .filter_map(|(index, entry)| match parse_day(entry) {
                Ok(day) => {
                    note_unknown_icon(&day.icon);
                    Some(day)
                }
                Err(e) => {
                    tracing::debug!("Skipping day entry {}: {}", index, e);
                    None
                }
            })
            .collect(),
        None => {
            tracing::debug!("Response has no days array");
            Vec::new()
        }
    };

    Ok(WeatherReport {
        city: city.to_string(),
        current,
        days,
        fetched_at: Utc::now(),
    })
}

fn note_unknown_icon(code: &str) {
    if !IconBucket::is_recognized(code) {
        tracing::debug!("Unrecognized icon code '{}', showing as clear", code);
    }
}
