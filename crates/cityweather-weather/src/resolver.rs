//! Decide which city to look up: typed input, detected locality, or fallback.

use cityweather_core::{Config, InputError};
use std::fmt;

use crate::geocode::Geocoder;
use crate::location::{source_from_config, LocationSource};
use crate::types::{GeocodeError, LocationError};

/// Trim user input and reject empty names.
pub fn validate_city_input(input: &str) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(InputError::EmptyCity)
    } else {
        Ok(trimmed.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// Where a resolved city name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitySource {
    Input,
    Detected,
    Fallback,
}

impl fmt::Display for CitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "entered"),
            Self::Detected => write!(f, "detected from your location"),
            Self::Fallback => write!(f, "default city"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCity {
    pub name: String,
    pub source: CitySource,
}

pub struct CityResolver {
    locator: Option<Box<dyn LocationSource>>,
    geocoder: Geocoder,
    fallback: String,
}

impl fmt::Debug for CityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CityResolver")
            .field("detect", &self.locator.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl CityResolver {
    pub fn new(
        locator: Option<Box<dyn LocationSource>>,
        geocoder: Geocoder,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            geocoder,
            fallback: fallback.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let locator = source_from_config(&config.location)?;
        let geocoder = Geocoder::new(&config.geocoding)?;
        Ok(Self::new(
            locator,
            geocoder,
            config.location.fallback_city.clone(),
        ))
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    /// One-shot location fix, reverse geocoded to a locality name
    pub async fn detect(&self) -> Result<String, ResolveError> {
        let locator = self.locator.as_ref().ok_or(LocationError::Disabled)?;

        let location = locator.current_location().await.map_err(|e| {
            tracing::warn!("Could not get device location: {}", e);
            e
        })?;
        tracing::debug!("Got location: {}, {}", location.latitude, location.longitude);

        let city = self.geocoder.reverse(&location).await.map_err(|e| {
            tracing::warn!("Could not resolve location to a city: {}", e);
            e
        })?;
        Ok(city)
    }

    /// Typed input wins, then detection, then the fallback city.
    ///
    /// Blank `explicit` input counts as absent here; callers that must warn
    /// about it should run [`validate_city_input`] first.
    pub async fn resolve(&self, explicit: Option<&str>) -> ResolvedCity {
        if let Some(name) = explicit.and_then(|s| validate_city_input(s).ok()) {
            return ResolvedCity {
                name,
                source: CitySource::Input,
            };
        }

        if self.locator.is_some() {
            match self.detect().await {
                Ok(name) => {
                    return ResolvedCity {
                        name,
                        source: CitySource::Detected,
                    }
                }
                Err(e) => tracing::info!("Falling back to {}: {}", self.fallback, e),
            }
        }

        ResolvedCity {
            name: self.fallback.clone(),
            source: CitySource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FixedLocationSource;
    use crate::types::Location;
    use async_trait::async_trait;
    use cityweather_core::GeocodingConfig;

    struct NamedLocation(&'static str);

    #[async_trait]
    impl LocationSource for NamedLocation {
        async fn current_location(&self) -> Result<Location, LocationError> {
            Ok(Location {
                city_name: Some(self.0.to_string()),
                ..Location::new(0.0, 0.0)
            })
        }
    }

    struct Unavailable;

    #[async_trait]
    impl LocationSource for Unavailable {
        async fn current_location(&self) -> Result<Location, LocationError> {
            Err(LocationError::ServiceUnavailable)
        }
    }

    fn resolver(locator: Option<Box<dyn LocationSource>>) -> CityResolver {
        let geocoder = Geocoder::new(&GeocodingConfig::default()).unwrap();
        CityResolver::new(locator, geocoder, "Istanbul")
    }

    #[test]
    fn test_validate_trims() {
        assert_eq!(validate_city_input("  Paris \n").unwrap(), "Paris");
    }

    #[test]
    fn test_validate_rejects_blank() {
        assert_eq!(validate_city_input(""), Err(InputError::EmptyCity));
        assert_eq!(validate_city_input(" \t\n"), Err(InputError::EmptyCity));
    }

    #[tokio::test]
    async fn test_input_wins() {
        let r = resolver(Some(Box::new(NamedLocation("Izmir"))));
        let resolved = r.resolve(Some(" Paris ")).await;
        assert_eq!(resolved.name, "Paris");
        assert_eq!(resolved.source, CitySource::Input);
    }

    #[tokio::test]
    async fn test_detected_when_no_input() {
        let r = resolver(Some(Box::new(NamedLocation("Izmir"))));
        let resolved = r.resolve(None).await;
        assert_eq!(resolved.name, "Izmir");
        assert_eq!(resolved.source, CitySource::Detected);
    }

    #[tokio::test]
    async fn test_blank_input_falls_through_to_detection() {
        let r = resolver(Some(Box::new(NamedLocation("Izmir"))));
        assert_eq!(r.resolve(Some("   ")).await.source, CitySource::Detected);
    }

    #[tokio::test]
    async fn test_fallback_when_detection_fails() {
        let r = resolver(Some(Box::new(Unavailable)));
        let resolved = r.resolve(None).await;
        assert_eq!(resolved.name, "Istanbul");
        assert_eq!(resolved.source, CitySource::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_when_detection_disabled() {
        let r = resolver(None);
        assert!(matches!(
            r.detect().await,
            Err(ResolveError::Location(LocationError::Disabled))
        ));
        assert_eq!(r.resolve(None).await.source, CitySource::Fallback);
    }

    #[tokio::test]
    async fn test_fixed_source_without_name_needs_geocoder() {
        // Geocoder points at a closed port, so reverse lookup fails and we fall back.
        let geocoder = Geocoder::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeocodingConfig::default()
        })
        .unwrap();
        let r = CityResolver::new(
            Some(Box::new(FixedLocationSource::new(41.0, 29.0))),
            geocoder,
            "Istanbul",
        );
        assert!(matches!(r.detect().await, Err(ResolveError::Geocode(_))));
        assert_eq!(r.resolve(None).await.source, CitySource::Fallback);
    }
}
