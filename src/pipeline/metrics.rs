//! Derived comfort, severity and daylight metrics

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Column, WeatherDataset, WeatherRecord};

/// Metrics computed from a single record. A metric is `None` when one of
/// its inputs is missing. Values are not clamped to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub comfort_index: Option<f64>,
    pub severity_index: Option<f64>,
    pub daylight_hours: Option<f64>,
}

/// `(100 - |temperature - feels_like|) + (100 - humidity) / 2`
#[must_use]
pub fn comfort_index(temperature: f64, feels_like: f64, humidity: f64) -> f64 {
    (100.0 - (temperature - feels_like).abs()) + (100.0 - humidity) / 2.0
}

/// `0.3 * wind_speed + 0.4 * cloudiness + (100 - visibility)`
#[must_use]
pub fn severity_index(wind_speed: f64, cloudiness: f64, visibility: f64) -> f64 {
    wind_speed * 0.3 + cloudiness * 0.4 + (100.0 - visibility)
}

/// Hours between sunrise and sunset
#[must_use]
pub fn daylight_hours(sunrise: DateTime<Utc>, sunset: DateTime<Utc>) -> f64 {
    (sunset - sunrise).num_milliseconds() as f64 / 3_600_000.0
}

/// Compute all derived metrics for a record
#[must_use]
pub fn derive_metrics(record: &WeatherRecord) -> DerivedMetrics {
    let comfort_index = match (record.temperature, record.feels_like, record.humidity) {
        (Some(t), Some(f), Some(h)) => Some(comfort_index(t, f, h)),
        _ => None,
    };
    let severity_index = match (record.wind_speed, record.cloudiness, record.visibility) {
        (Some(w), Some(c), Some(v)) => Some(severity_index(w, c, v)),
        _ => None,
    };
    let daylight_hours = match (record.sunrise, record.sunset) {
        (Some(rise), Some(set)) => Some(daylight_hours(rise, set)),
        _ => None,
    };

    DerivedMetrics {
        comfort_index,
        severity_index,
        daylight_hours,
    }
}

/// UTC hour of sunrise
#[must_use]
pub fn sunrise_hour(record: &WeatherRecord) -> Option<f64> {
    record.sunrise.map(|t| f64::from(t.hour()))
}

/// UTC hour of sunset
#[must_use]
pub fn sunset_hour(record: &WeatherRecord) -> Option<f64> {
    record.sunset.map(|t| f64::from(t.hour()))
}

/// Register the derived columns on the dataset schema.
///
/// Derived values are computed on read, so this only decides which of them
/// can be selected as features and written out. The hour columns need the
/// matching timestamp column.
pub fn add_derived_columns(dataset: &mut WeatherDataset) {
    let mut added = Vec::new();
    for column in [Column::ComfortIndex, Column::SeverityIndex, Column::DaylightHours] {
        if dataset.add_column(column) {
            added.push(column);
        }
    }
    if dataset.has_column(Column::Sunrise) && dataset.add_column(Column::SunriseHour) {
        added.push(Column::SunriseHour);
    }
    if dataset.has_column(Column::Sunset) && dataset.add_column(Column::SunsetHour) {
        added.push(Column::SunsetHour);
    }
    debug!("Registered derived columns: {:?}", added);
}
