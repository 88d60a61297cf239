//! Column names of the tabular weather schema

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named column of a weather dataset.
///
/// The names match the CSV header produced by the fetch pipeline, so a file
/// written by [`crate::ingest::write_csv`] can be read back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    City,
    Temperature,
    FeelsLike,
    Humidity,
    Pressure,
    WindSpeed,
    Cloudiness,
    Visibility,
    Weather,
    Sunrise,
    Sunset,
    Timezone,
    Rain,
    ComfortIndex,
    SeverityIndex,
    DaylightHours,
    SunriseHour,
    SunsetHour,
}

impl Column {
    /// Every column in canonical schema order
    pub const ALL: [Column; 18] = [
        Column::City,
        Column::Temperature,
        Column::FeelsLike,
        Column::Humidity,
        Column::Pressure,
        Column::WindSpeed,
        Column::Cloudiness,
        Column::Visibility,
        Column::Weather,
        Column::Sunrise,
        Column::Sunset,
        Column::Timezone,
        Column::Rain,
        Column::ComfortIndex,
        Column::SeverityIndex,
        Column::DaylightHours,
        Column::SunriseHour,
        Column::SunsetHour,
    ];

    /// Columns a live fetch always provides
    pub const FETCH_SCHEMA: [Column; 12] = [
        Column::City,
        Column::Temperature,
        Column::FeelsLike,
        Column::Humidity,
        Column::Pressure,
        Column::WindSpeed,
        Column::Cloudiness,
        Column::Visibility,
        Column::Weather,
        Column::Sunrise,
        Column::Sunset,
        Column::Timezone,
    ];

    /// Header name used in CSV files and feature lists
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Column::City => "City",
            Column::Temperature => "Temperature",
            Column::FeelsLike => "Feels Like",
            Column::Humidity => "Humidity",
            Column::Pressure => "Pressure",
            Column::WindSpeed => "Wind Speed",
            Column::Cloudiness => "Cloudiness (%)",
            Column::Visibility => "Visibility (km)",
            Column::Weather => "Weather",
            Column::Sunrise => "Sunrise (UTC)",
            Column::Sunset => "Sunset (UTC)",
            Column::Timezone => "Timezone",
            Column::Rain => "Rain",
            Column::ComfortIndex => "Comfort Index",
            Column::SeverityIndex => "Severity Index",
            Column::DaylightHours => "Daylight Duration (hrs)",
            Column::SunriseHour => "Sunrise_hour",
            Column::SunsetHour => "Sunset_hour",
        }
    }

    /// Look a column up by its header name. Surrounding whitespace is ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Column> {
        let name = name.trim();
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Whether the column holds numbers usable as model features
    #[must_use]
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Column::City | Column::Weather | Column::Sunrise | Column::Sunset
        )
    }

    /// Whether the column is computed from other columns rather than ingested
    #[must_use]
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Column::ComfortIndex
                | Column::SeverityIndex
                | Column::DaylightHours
                | Column::SunriseHour
                | Column::SunsetHour
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_is_inverse() {
        for column in Column::ALL {
            assert_eq!(Column::from_name(column.name()), Some(column));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(Column::from_name("Dew Point"), None);
        assert_eq!(Column::from_name(" Humidity "), Some(Column::Humidity));
    }

    #[test]
    fn test_numeric_columns() {
        assert!(Column::Humidity.is_numeric());
        assert!(Column::ComfortIndex.is_numeric());
        assert!(!Column::City.is_numeric());
        assert!(!Column::Sunrise.is_numeric());
    }
}
