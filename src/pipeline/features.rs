//! Feature matrix construction

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::labels::rain_target;
use super::metrics::{derive_metrics, sunrise_hour, sunset_hour};
use crate::models::{Column, WeatherDataset, WeatherRecord};
use crate::{Result, WeatherInsightsError};

/// Features the rain classifier is trained on unless configured otherwise
pub const DEFAULT_FEATURES: [&str; 6] = [
    "Humidity",
    "Pressure",
    "Wind Speed",
    "Cloudiness (%)",
    "Feels Like",
    "Temperature",
];

/// How requested features absent from the schema are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// Drop absent features silently
    #[default]
    Lenient,
    /// Fail when any requested feature is absent
    Strict,
}

/// Numeric feature rows aligned with the rain target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Selected feature names in column order
    pub feature_names: Vec<String>,
    /// One row per record
    pub rows: Vec<Vec<f64>>,
    /// Rain label per record (0 or 1)
    pub targets: Vec<u8>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one feature across all rows
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.feature_names.iter().position(|n| n == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Copy holding only the given row indices, in that order.
    /// Fails when an index is out of range.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows()) {
            return Err(WeatherInsightsError::validation(format!(
                "Row index {} out of range for {} rows",
                bad,
                self.n_rows()
            )));
        }
        Ok(Self {
            feature_names: self.feature_names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        })
    }
}

/// Numeric value of a column for a record, derived columns included.
/// Derived columns are recomputed when their inputs are present and fall
/// back to the value read from file otherwise. Text and timestamp columns
/// have no numeric value.
#[must_use]
pub fn column_value(record: &WeatherRecord, column: Column) -> Option<f64> {
    let value = computed_value(record, column);
    if value.is_none() && column.is_derived() {
        return record.supplied.get(&column).copied();
    }
    value
}

fn computed_value(record: &WeatherRecord, column: Column) -> Option<f64> {
    match column {
        Column::Temperature => record.temperature,
        Column::FeelsLike => record.feels_like,
        Column::Humidity => record.humidity,
        Column::Pressure => record.pressure,
        Column::WindSpeed => record.wind_speed,
        Column::Cloudiness => record.cloudiness,
        Column::Visibility => record.visibility,
        Column::Timezone => record.timezone.map(|tz| tz as f64),
        Column::Rain => record.rain.map(|r| f64::from(r.as_u8())),
        Column::ComfortIndex => derive_metrics(record).comfort_index,
        Column::SeverityIndex => derive_metrics(record).severity_index,
        Column::DaylightHours => derive_metrics(record).daylight_hours,
        Column::SunriseHour => sunrise_hour(record),
        Column::SunsetHour => sunset_hour(record),
        Column::City | Column::Weather | Column::Sunrise | Column::Sunset => None,
    }
}

/// Missing, NaN and infinite values become 0
#[must_use]
pub fn sanitize(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Resolve requested names to numeric columns present in the schema.
/// Returns the usable columns in request order and the names left out.
fn resolve_features<'a, S: AsRef<str>>(
    dataset: &WeatherDataset,
    feature_names: &'a [S],
) -> (Vec<Column>, Vec<&'a str>) {
    let mut selected = Vec::new();
    let mut absent = Vec::new();

    for name in feature_names {
        let name = name.as_ref();
        match Column::from_name(name) {
            Some(column) if column.is_numeric() && dataset.has_column(column) => {
                if !selected.contains(&column) {
                    selected.push(column);
                }
            }
            _ => absent.push(name),
        }
    }

    (selected, absent)
}

/// Build the feature matrix and rain target for a dataset.
///
/// Requested names are kept in order when the schema carries them; in
/// lenient mode the others are dropped, in strict mode they are an error.
/// The matrix always has one row per record.
pub fn build_feature_matrix<S: AsRef<str>>(
    dataset: &WeatherDataset,
    feature_names: &[S],
    mode: FeatureMode,
) -> Result<FeatureMatrix> {
    let (columns, absent) = resolve_features(dataset, feature_names);

    if !absent.is_empty() {
        match mode {
            FeatureMode::Strict => {
                return Err(WeatherInsightsError::validation(format!(
                    "Features not present in dataset: {}",
                    absent.join(", ")
                )));
            }
            FeatureMode::Lenient => {
                debug!("Dropping features not present in dataset: {:?}", absent);
            }
        }
    }

    let rows = dataset
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|&column| sanitize(column_value(record, column)))
                .collect()
        })
        .collect();

    let targets = dataset
        .iter()
        .map(|record| rain_target(dataset, record).as_u8())
        .collect();

    let matrix = FeatureMatrix {
        feature_names: columns.iter().map(|c| c.name().to_string()).collect(),
        rows,
        targets,
    };

    info!(
        "Built feature matrix with {} rows and {} features",
        matrix.n_rows(),
        matrix.n_features()
    );

    Ok(matrix)
}
