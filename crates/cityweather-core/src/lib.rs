pub mod config;
pub mod error;

pub use config::{Config, GeocodingConfig, LocationConfig, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, InputError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used. Logs go to
/// stderr so stdout stays clean for rendered output.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("cityweather core initialized");
    Ok(())
}
