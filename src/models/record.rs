//! Weather observation records as fetched and after normalization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Column;

/// Binary rain label used as the classification target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RainLabel {
    NoRain,
    Rain,
}

impl RainLabel {
    /// Numeric class value (0 or 1)
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            RainLabel::NoRain => 0,
            RainLabel::Rain => 1,
        }
    }

    /// Map a class value back to a label. Anything non-zero is rain.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            RainLabel::NoRain
        } else {
            RainLabel::Rain
        }
    }

    /// Parse a CSV cell. Accepts `0/1`, `true/false` and `yes/no`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" | "yes" => Some(RainLabel::Rain),
            "0" | "0.0" | "false" | "no" => Some(RainLabel::NoRain),
            _ => None,
        }
    }
}

impl From<bool> for RainLabel {
    fn from(rain: bool) -> Self {
        if rain {
            RainLabel::Rain
        } else {
            RainLabel::NoRain
        }
    }
}

impl fmt::Display for RainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainLabel::NoRain => f.write_str("No Rain"),
            RainLabel::Rain => f.write_str("Rain"),
        }
    }
}

/// Provider-shaped observation in provider units. Every field may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWeatherRecord {
    pub city: Option<String>,
    /// Temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Feels-like temperature in Celsius
    pub feels_like_c: Option<f64>,
    /// Relative humidity in percent
    pub humidity_pct: Option<f64>,
    /// Pressure in hPa
    pub pressure_hpa: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed_ms: Option<f64>,
    pub description: Option<String>,
    /// Visibility in meters
    pub visibility_m: Option<f64>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Offset from UTC in seconds
    pub timezone: Option<i64>,
    /// Cloud cover in percent
    pub cloudiness_pct: Option<f64>,
}

/// Normalized observation: one row per city and observation time.
///
/// Units are fixed for a whole dataset: temperatures in whole degrees
/// Celsius, wind speed in whole km/h, visibility in km, pressure in hPa,
/// humidity and cloudiness in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub cloudiness: Option<f64>,
    pub visibility: Option<f64>,
    pub weather: Option<String>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub timezone: Option<i64>,
    /// Label supplied with the data, if any
    pub rain: Option<RainLabel>,
    /// Derived column values read from a file. Used only when the inputs
    /// of the formula are missing.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub supplied: BTreeMap<Column, f64>,
}

impl WeatherRecord {
    /// Create an empty record for a city
    pub fn new<S: Into<String>>(city: S) -> Self {
        Self {
            city: city.into(),
            ..Default::default()
        }
    }
}
