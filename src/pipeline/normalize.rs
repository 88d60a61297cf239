//! Unit and naming normalization of provider records

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{RawWeatherRecord, WeatherRecord};

/// What to do with a raw record that lacks a required field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Replace missing numbers with 0 and keep the record
    #[default]
    ZeroFill,
    /// Drop the record
    Skip,
}

/// Convert m/s to km/h
#[must_use]
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    speed_ms * 3.6
}

/// Convert meters to kilometers
#[must_use]
pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

/// Round to the nearest whole number, halves to even
#[must_use]
pub fn round_whole(value: f64) -> f64 {
    value.round_ties_even()
}

/// Upper-case the first character and lower-case the rest
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Names of the required fields missing from `raw`. Visibility is optional
/// and read as 0 when absent.
fn missing_fields(raw: &RawWeatherRecord) -> Vec<&'static str> {
    let checks = [
        ("city", raw.city.is_none()),
        ("temperature", raw.temperature_c.is_none()),
        ("feels_like", raw.feels_like_c.is_none()),
        ("humidity", raw.humidity_pct.is_none()),
        ("pressure", raw.pressure_hpa.is_none()),
        ("wind_speed", raw.wind_speed_ms.is_none()),
        ("description", raw.description.is_none()),
        ("sunrise", raw.sunrise.is_none()),
        ("sunset", raw.sunset.is_none()),
        ("timezone", raw.timezone.is_none()),
        ("cloudiness", raw.cloudiness_pct.is_none()),
    ];
    checks
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
}

/// Normalize one raw record.
///
/// Returns `None` only under [`MissingFieldPolicy::Skip`] when a required
/// field is absent. Under zero-fill, missing numbers become 0 while missing
/// text and timestamps stay absent.
#[must_use]
pub fn normalize_record(raw: &RawWeatherRecord, policy: MissingFieldPolicy) -> Option<WeatherRecord> {
    let missing = missing_fields(raw);
    if !missing.is_empty() {
        match policy {
            MissingFieldPolicy::Skip => {
                warn!(
                    "Skipping record for {:?}: missing {}",
                    raw.city,
                    missing.join(", ")
                );
                return None;
            }
            MissingFieldPolicy::ZeroFill => {
                debug!("Zero-filling {} for {:?}", missing.join(", "), raw.city);
            }
        }
    }

    let fill = |value: Option<f64>| Some(value.unwrap_or(0.0));

    Some(WeatherRecord {
        city: capitalize(raw.city.as_deref().unwrap_or_default()),
        temperature: fill(raw.temperature_c).map(round_whole),
        feels_like: fill(raw.feels_like_c).map(round_whole),
        humidity: fill(raw.humidity_pct),
        pressure: fill(raw.pressure_hpa),
        wind_speed: fill(raw.wind_speed_ms).map(ms_to_kmh).map(round_whole),
        cloudiness: fill(raw.cloudiness_pct),
        visibility: fill(raw.visibility_m).map(meters_to_km),
        weather: raw.description.as_deref().map(capitalize),
        sunrise: raw.sunrise,
        sunset: raw.sunset,
        timezone: Some(raw.timezone.unwrap_or(0)),
        rain: None,
        supplied: Default::default(),
    })
}

/// Normalize a batch of raw provider records into the fixed schema
#[must_use]
pub fn normalize(raw_records: &[RawWeatherRecord], policy: MissingFieldPolicy) -> Vec<WeatherRecord> {
    raw_records
        .iter()
        .filter_map(|raw| normalize_record(raw, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw_paris() -> RawWeatherRecord {
        RawWeatherRecord {
            city: Some("PARIS".to_string()),
            temperature_c: Some(18.6),
            feels_like_c: Some(17.5),
            humidity_pct: Some(64.0),
            pressure_hpa: Some(1012.0),
            wind_speed_ms: Some(10.0),
            description: Some("light RAIN".to_string()),
            visibility_m: Some(8000.0),
            sunrise: Some(Utc.with_ymd_and_hms(2024, 5, 1, 4, 30, 0).unwrap()),
            sunset: Some(Utc.with_ymd_and_hms(2024, 5, 1, 19, 15, 0).unwrap()),
            timezone: Some(7200),
            cloudiness_pct: Some(75.0),
        }
    }

    #[test]
    fn test_wind_speed_conversion_is_exact() {
        assert_eq!(ms_to_kmh(10.0), 36.0);
    }

    #[test]
    fn test_rounding_halves_to_even() {
        assert_eq!(round_whole(2.5), 2.0);
        assert_eq!(round_whole(3.5), 4.0);
        assert_eq!(round_whole(-0.4), -0.0);
        assert_eq!(round_whole(17.6), 18.0);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("new YORK"), "New york");
        assert_eq!(capitalize("são paulo"), "São paulo");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_normalize_record_units() {
        let record = normalize_record(&raw_paris(), MissingFieldPolicy::ZeroFill).unwrap();
        assert_eq!(record.city, "Paris");
        assert_eq!(record.temperature, Some(19.0));
        assert_eq!(record.feels_like, Some(18.0));
        assert_eq!(record.wind_speed, Some(36.0));
        assert_eq!(record.visibility, Some(8.0));
        assert_eq!(record.weather.as_deref(), Some("Light rain"));
        assert_eq!(record.timezone, Some(7200));
        assert_eq!(record.rain, None);
    }

    #[test]
    fn test_missing_visibility_reads_as_zero() {
        let mut raw = raw_paris();
        raw.visibility_m = None;
        let record = normalize_record(&raw, MissingFieldPolicy::Skip).unwrap();
        assert_eq!(record.visibility, Some(0.0));
    }

    #[test]
    fn test_missing_field_policies() {
        let mut raw = raw_paris();
        raw.humidity_pct = None;

        assert!(normalize_record(&raw, MissingFieldPolicy::Skip).is_none());

        let filled = normalize_record(&raw, MissingFieldPolicy::ZeroFill).unwrap();
        assert_eq!(filled.humidity, Some(0.0));
    }

    #[test]
    fn test_normalize_batch_drops_only_incomplete() {
        let mut incomplete = raw_paris();
        incomplete.sunset = None;
        let batch = vec![raw_paris(), incomplete, raw_paris()];

        assert_eq!(normalize(&batch, MissingFieldPolicy::Skip).len(), 2);
        assert_eq!(normalize(&batch, MissingFieldPolicy::ZeroFill).len(), 3);
    }
}
