use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the weather provider credential.
pub const API_KEY_ENV: &str = "CITYWEATHER_API_KEY";

/// Environment variable overriding the fallback city.
pub const CITY_ENV: &str = "CITYWEATHER_CITY";

/// Most day entries a report may hold.
pub const FORECAST_DAY_LIMIT: usize = 15;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// City resolution settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Forward/reverse geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Visual Crossing host, without the service path
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Provider credential. Prefer setting `CITYWEATHER_API_KEY` instead of
    /// writing the key to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Unit group sent to the provider
    #[serde(default = "default_unit_group")]
    pub unit_group: String,

    /// Response sections requested from the provider
    #[serde(default = "default_include")]
    pub include: String,

    /// Transport timeout for a single request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of day entries kept from a response, 1..=15
    #[serde(default = "default_max_days")]
    pub max_days: usize,
}

fn default_weather_base_url() -> String {
    "https://weather.visualcrossing.com".to_string()
}

fn default_unit_group() -> String {
    "metric".to_string()
}

fn default_include() -> String {
    "current,days".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_days() -> usize {
    FORECAST_DAY_LIMIT
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            api_key: None,
            unit_group: default_unit_group(),
            include: default_include(),
            timeout_secs: default_timeout_secs(),
            max_days: default_max_days(),
        }
    }
}

impl WeatherConfig {
    /// Check if a credential is configured (not a placeholder)
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty() && !k.starts_with("YOUR_"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// City used when neither input nor detection yields one
    #[serde(default = "default_fallback_city")]
    pub fallback_city: String,

    /// Try to detect the city from the device's approximate position
    #[serde(default = "default_detect")]
    pub detect: bool,

    /// IP geolocation endpoint used for detection
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Fixed position; when both are set, detection uses them instead of IP lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

fn default_fallback_city() -> String {
    "Istanbul".to_string()
}

fn default_detect() -> bool {
    true
}

fn default_ip_lookup_url() -> String {
    "https://ipapi.co/json/".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fallback_city: default_fallback_city(),
            detect: default_detect(),
            ip_lookup_url: default_ip_lookup_url(),
            latitude: None,
            longitude: None,
        }
    }
}

impl LocationConfig {
    /// Configured fixed position, if both coordinates are present
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim instance
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Nominatim requires an identifying user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("cityweather/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config.with_env_overrides());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config.with_env_overrides())
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Apply `CITYWEATHER_API_KEY` and `CITYWEATHER_CITY` on top of file values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::var(API_KEY_ENV).ok(), std::env::var(CITY_ENV).ok())
    }

    fn with_overrides(mut self, api_key: Option<String>, city: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.weather.api_key = Some(key);
        }
        if let Some(city) = city.filter(|c| !c.trim().is_empty()) {
            self.location.fallback_city = city.trim().to_string();
        }
        self
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);
        if self.location.detect && self.location.fixed_position().is_none() {
            validate_url(
                &self.location.ip_lookup_url,
                "location.ip_lookup_url",
                &mut result,
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 300 {
            result.add_warning("weather.timeout_secs", "Timeout is unusually long (>300s)");
        }

        if self.weather.max_days == 0 {
            result.add_error("weather.max_days", "At least one forecast day is required");
        } else if self.weather.max_days > FORECAST_DAY_LIMIT {
            result.add_error(
                "weather.max_days",
                format!("At most {} forecast days are supported", FORECAST_DAY_LIMIT),
            );
        }

        if self.weather.unit_group.trim().is_empty() {
            result.add_error("weather.unit_group", "Unit group must not be empty");
        }

        if self.location.fallback_city.trim().is_empty() {
            result.add_error("location.fallback_city", "Fallback city must not be empty");
        }

        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                result.add_error("location.latitude", "Latitude must be within -90..=90");
            }
        }
        if let Some(lon) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                result.add_error("location.longitude", "Longitude must be within -180..=180");
            }
        }
        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            result.add_warning(
                "location",
                "Only one coordinate is set; fixed position will be ignored",
            );
        }

        if self.geocoding.user_agent.trim().is_empty() {
            result.add_error("geocoding.user_agent", "User agent must not be empty");
        }

        // Missing key only matters once a fetch is attempted
        if !self.weather.has_api_key() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured - set {}", API_KEY_ENV),
            );
        }

        result
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("cityweather");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        // Default config should be valid (only warnings, no errors)
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_fallback_city_is_istanbul() {
        assert_eq!(Config::default().location.fallback_city, "Istanbul");
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
    }

    #[test]
    fn test_placeholder_api_key_is_not_configured() {
        let mut config = Config::default();
        config.weather.api_key = Some("YOUR_API_KEY".to_string());
        assert!(!config.weather.has_api_key());
        config.weather.api_key = Some("abc123".to_string());
        assert!(config.weather.has_api_key());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.geocoding.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.weather.timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.timeout_secs"));
    }

    #[test]
    fn test_max_days_above_limit_is_error() {
        let mut config = Config::default();
        config.weather.max_days = 20;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.max_days"));

        config.weather.max_days = FORECAST_DAY_LIMIT;
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let mut config = Config::default();
        config.location.latitude = Some(120.0);
        config.location.longitude = Some(10.0);
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));
    }

    #[test]
    fn test_overrides_apply_trimmed_city_and_key() {
        let config = Config::default()
            .with_overrides(Some("k".to_string()), Some("  Paris ".to_string()));
        assert_eq!(config.weather.api_key.as_deref(), Some("k"));
        assert_eq!(config.location.fallback_city, "Paris");
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let config = Config::default().with_overrides(Some("  ".to_string()), Some(String::new()));
        assert!(config.weather.api_key.is_none());
        assert_eq!(config.location.fallback_city, "Istanbul");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[location]\nfallback_city = \"Ankara\"\n").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let config: Config = toml::from_str(&contents).unwrap();
        assert_eq!(config.location.fallback_city, "Ankara");
        assert_eq!(config.weather.unit_group, "metric");
        assert_eq!(config.weather.include, "current,days");
        assert_eq!(config.weather.max_days, 15);
    }

    #[test]
    fn test_save_and_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.location.fallback_city = "Izmir".to_string();
        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let reparsed: Config = toml::from_str(&contents).unwrap();
        assert_eq!(reparsed.location.fallback_city, "Izmir");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
