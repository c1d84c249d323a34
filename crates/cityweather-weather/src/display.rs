//! Text formatting for reports. Numbers are truncated toward zero, never rounded.

use crate::types::{CurrentConditions, Forecast, ForecastDate};

pub fn format_temperature(celsius: f64) -> String {
    format!("{}°C", celsius.trunc() as i64)
}

pub fn format_humidity(percent: i32) -> String {
    format!("%{}", percent)
}

pub fn format_wind(kmh: f64) -> String {
    format!("{} km/h", kmh.trunc() as i64)
}

/// e.g. `03 May Saturday`; a stamp that wasn't a date is shown as received
pub fn format_day(date: &ForecastDate) -> String {
    match date {
        ForecastDate::Calendar(date) => date.format("%d %B %A").to_string(),
        ForecastDate::Raw(text) => text.clone(),
    }
}

pub fn share_text(city: &str, temperature: &str) -> String {
    format!("Today in {} the weather is {}!", city, temperature)
}

/// Formatted cells of the current conditions card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionsSummary {
    pub icon: &'static str,
    pub temperature: String,
    pub humidity: String,
    pub wind: String,
}

impl From<&CurrentConditions> for ConditionsSummary {
    fn from(current: &CurrentConditions) -> Self {
        Self {
            icon: current.bucket().icon_name(),
            temperature: format_temperature(current.temperature),
            humidity: format_humidity(current.humidity),
            wind: format_wind(current.wind_speed),
        }
    }
}

/// Formatted cells of one forecast table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRow {
    pub day: String,
    pub icon: &'static str,
    pub temperature: String,
    pub humidity: String,
    pub wind: String,
}

impl From<&Forecast> for ForecastRow {
    fn from(forecast: &Forecast) -> Self {
        Self {
            day: format_day(&forecast.date),
            icon: forecast.bucket().icon_name(),
            temperature: format_temperature(forecast.temperature),
            humidity: format_humidity(forecast.humidity),
            wind: format_wind(forecast.wind_speed),
        }
    }
}
