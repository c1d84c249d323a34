//! Forecast window: how many leading days of a report are shown.

use std::fmt;
use std::str::FromStr;

use crate::types::Forecast;

/// Display granularity chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastWindow {
    #[default]
    Today,
    FiveDay,
    FifteenDay,
}

impl ForecastWindow {
    pub const ALL: [ForecastWindow; 3] = [Self::Today, Self::FiveDay, Self::FifteenDay];

    /// Segment index 0/1/2 to a window; anything else is `None`
    pub fn from_selector(selector: usize) -> Option<Self> {
        Self::ALL.get(selector).copied()
    }

    pub fn selector(&self) -> usize {
        match self {
            Self::Today => 0,
            Self::FiveDay => 1,
            Self::FifteenDay => 2,
        }
    }

    /// Number of days this window shows at most
    pub fn max_days(&self) -> usize {
        match self {
            Self::Today => 1,
            Self::FiveDay => 5,
            Self::FifteenDay => 15,
        }
    }

    /// Leading `min(days.len(), self.max_days())` entries of `days`
    pub fn project<'a>(&self, days: &'a [Forecast]) -> &'a [Forecast] {
        &days[..days.len().min(self.max_days())]
    }
}

impl fmt::Display for ForecastWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::FiveDay => write!(f, "5 days"),
            Self::FifteenDay => write!(f, "15 days"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown forecast window '{0}' (expected 1, 5 or 15)")]
pub struct ParseWindowError(String);

impl FromStr for ForecastWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1d" | "today" => Ok(Self::Today),
            "5" | "5d" | "five" => Ok(Self::FiveDay),
            "15" | "15d" | "fifteen" => Ok(Self::FifteenDay),
            other => Err(ParseWindowError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn days(n: usize) -> Vec<Forecast> {
        let start = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        (0..n)
            .map(|i| Forecast {
                date: (start + Duration::days(i as i64)).into(),
                temperature: 20.0,
                humidity: 50,
                wind_speed: 10.0,
                icon: "clear-day".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_selector_mapping() {
        assert_eq!(ForecastWindow::from_selector(0), Some(ForecastWindow::Today));
        assert_eq!(ForecastWindow::from_selector(1), Some(ForecastWindow::FiveDay));
        assert_eq!(ForecastWindow::from_selector(2), Some(ForecastWindow::FifteenDay));
        assert_eq!(ForecastWindow::from_selector(3), None);
    }

    #[test]
    fn test_selector_round_trip() {
        for window in ForecastWindow::ALL {
            assert_eq!(ForecastWindow::from_selector(window.selector()), Some(window));
        }
    }

    #[test]
    fn test_projection_length_is_min_of_len_and_window() {
        for len in [0, 1, 3, 5, 7, 15, 20] {
            let all = days(len);
            for window in ForecastWindow::ALL {
                assert_eq!(
                    window.project(&all).len(),
                    len.min(window.max_days()),
                    "len={len} window={window}"
                );
            }
        }
    }

    #[test]
    fn test_projection_is_prefix() {
        let all = days(10);
        let shown = ForecastWindow::FiveDay.project(&all);
        assert_eq!(shown, &all[..5]);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let all = days(10);
        let once = ForecastWindow::FiveDay.project(&all);
        let twice = ForecastWindow::FiveDay.project(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!("15".parse::<ForecastWindow>().unwrap(), ForecastWindow::FifteenDay);
        assert_eq!("Today".parse::<ForecastWindow>().unwrap(), ForecastWindow::Today);
        assert_eq!(" 5d ".parse::<ForecastWindow>().unwrap(), ForecastWindow::FiveDay);
        assert!("7".parse::<ForecastWindow>().is_err());
    }
}
