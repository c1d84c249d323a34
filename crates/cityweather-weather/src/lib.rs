//! Weather lookup for cityweather
//!
//! Fetches current conditions and a daily forecast from Visual Crossing,
//! resolves which city to ask for, and formats the result for display.

pub mod display;
pub mod error_mapping;
pub mod geocode;
pub mod icon;
pub mod location;
pub mod maps;
pub mod parse;
pub mod provider;
pub mod resolver;
pub mod types;
pub mod window;

pub use geocode::Geocoder;
pub use icon::IconBucket;
pub use location::{FixedLocationSource, IpLocationSource, LocationSource};
pub use maps::{map_url, open_city_in_maps, MapError, MapLauncher, SystemMapLauncher};
pub use parse::{parse_report, ParseError, RecordError, MAX_FORECAST_DAYS};
pub use provider::{WeatherProvider, WeatherSource};
pub use resolver::{validate_city_input, CityResolver, CitySource, ResolveError, ResolvedCity};
pub use types::*;
pub use window::ForecastWindow;
