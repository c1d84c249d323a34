use serde::{Deserialize, Serialize};

/// Local display icon a provider icon code falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconBucket {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Snow,
}

impl IconBucket {
    /// Map a Visual Crossing icon code to a bucket.
    ///
    /// Total: codes outside the table land in `Clear`, same as `clear-day`.
    /// Use [`IconBucket::is_recognized`] to tell the two apart.
    pub fn from_code(code: &str) -> Self {
        match code {
            "rain" | "showers" | "tstorms" => Self::Rain,
            "snow" => Self::Snow,
            "partly-cloudy-day" | "partly-cloudy-night" => Self::PartlyCloudy,
            "cloudy" | "overcast" => Self::Cloudy,
            "clear-day" | "clear-night" => Self::Clear,
            _ => Self::Clear,
        }
    }

    /// True if `code` has an explicit entry in the mapping table
    pub fn is_recognized(code: &str) -> bool {
        matches!(
            code,
            "rain"
                | "showers"
                | "tstorms"
                | "snow"
                | "partly-cloudy-day"
                | "partly-cloudy-night"
                | "cloudy"
                | "overcast"
                | "clear-day"
                | "clear-night"
        )
    }

    /// Asset name of the local icon
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sunicon",
            Self::PartlyCloudy => "partlyCloudyicon",
            Self::Cloudy => "cloudyicon",
            Self::Rain => "rainicon",
            Self::Snow => "snowicon",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
        }
    }
}
