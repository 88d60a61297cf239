//! Tabular aggregates over a weather dataset
//!
//! City selection, summary statistics, per-city averages, condition
//! frequency, correlation and per-city rain predictions. Missing values are
//! skipped by every statistic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::classifier::GradientBoostingClassifier;
use crate::models::{Column, RainLabel, WeatherDataset};
use crate::pipeline::{FeatureMatrix, column_value};
use crate::{Result, WeatherInsightsError};

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Linear interpolation between the closest ranks of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn present_values(dataset: &WeatherDataset, column: Column) -> Vec<f64> {
    dataset
        .iter()
        .filter_map(|record| column_value(record, column))
        .filter(|v| v.is_finite())
        .collect()
}

/// Cities in order of first appearance
#[must_use]
pub fn unique_cities(dataset: &WeatherDataset) -> Vec<String> {
    let mut cities: Vec<String> = Vec::new();
    for record in dataset.iter() {
        if !cities.contains(&record.city) {
            cities.push(record.city.clone());
        }
    }
    cities
}

/// Keep only the rows of the selected cities.
///
/// At least one and at most `max_cities` cities must be selected.
pub fn select_cities<S: AsRef<str>>(
    dataset: &WeatherDataset,
    cities: &[S],
    max_cities: usize,
) -> Result<WeatherDataset> {
    if cities.is_empty() {
        return Err(WeatherInsightsError::validation(
            "Please select at least one city",
        ));
    }
    if cities.len() > max_cities {
        return Err(WeatherInsightsError::validation(format!(
            "Please select only up to {} cities, got {}",
            max_cities,
            cities.len()
        )));
    }

    let selected = dataset.filtered(|record| cities.iter().any(|c| c.as_ref() == record.city));
    debug!(
        "Selected {} of {} rows for {} cities",
        selected.len(),
        dataset.len(),
        cities.len()
    );
    Ok(selected)
}

/// Summary statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: Column,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Count, mean, sample standard deviation, min, quartiles and max of each
/// column over its present values
#[must_use]
pub fn describe(dataset: &WeatherDataset, columns: &[Column]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .map(|&column| {
            let mut values = present_values(dataset, column);
            values.sort_by(f64::total_cmp);

            let count = values.len();
            let average = mean(&values);
            let std = match (average, count) {
                (Some(m), n) if n > 1 => {
                    let variance =
                        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
                    Some(variance.sqrt())
                }
                _ => None,
            };

            ColumnSummary {
                column,
                count,
                mean: average,
                std,
                min: values.first().copied(),
                q25: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q75: quantile(&values, 0.75),
                max: values.last().copied(),
            }
        })
        .collect()
}

/// Mean per city of a set of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageTable {
    pub columns: Vec<String>,
    pub rows: Vec<CityAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityAverage {
    pub city: String,
    /// One mean per column, None when the city has no value for it
    pub values: Vec<Option<f64>>,
}

impl AverageTable {
    #[must_use]
    pub fn get(&self, city: &str, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.iter().find(|r| r.city == city)?.values[index]
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

impl fmt::Display for AverageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let city_width = self
            .rows
            .iter()
            .map(|r| r.city.chars().count())
            .chain(std::iter::once(4))
            .max()
            .unwrap_or(4);

        write!(f, "{:<city_width$}", "City")?;
        for column in &self.columns {
            write!(f, "  {:>w$}", column, w = column.len().max(8))?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<city_width$}", row.city)?;
            for (column, value) in self.columns.iter().zip(&row.values) {
                write!(f, "  {:>w$}", format_cell(*value), w = column.len().max(8))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-city means rounded to 2 decimals, cities sorted by name
#[must_use]
pub fn city_averages(dataset: &WeatherDataset, columns: &[Column]) -> AverageTable {
    let mut cities = unique_cities(dataset);
    cities.sort();

    let rows = cities
        .into_iter()
        .map(|city| {
            let values = columns
                .iter()
                .map(|&column| {
                    let values: Vec<f64> = dataset
                        .iter()
                        .filter(|r| r.city == city)
                        .filter_map(|r| column_value(r, column))
                        .filter(|v| v.is_finite())
                        .collect();
                    mean(&values).map(round2)
                })
                .collect();
            CityAverage { city, values }
        })
        .collect();

    AverageTable {
        columns: columns.iter().map(|c| c.name().to_string()).collect(),
        rows,
    }
}

/// Occurrences of one weather description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCount {
    pub weather: String,
    pub count: usize,
}

/// Count rows per weather description, most frequent first and ties by name.
/// Rows without a description are not counted.
#[must_use]
pub fn weather_condition_frequency(dataset: &WeatherDataset) -> Vec<ConditionCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for weather in dataset.iter().filter_map(|r| r.weather.as_deref()) {
        *counts.entry(weather).or_insert(0) += 1;
    }

    let mut frequency: Vec<ConditionCount> = counts
        .into_iter()
        .map(|(weather, count)| ConditionCount {
            weather: weather.to_string(),
            count,
        })
        .collect();
    frequency.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.weather.cmp(&b.weather)));
    frequency
}

/// Pairwise Pearson correlation of numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .columns
            .iter()
            .map(|c| c.name().len())
            .max()
            .unwrap_or(0);

        write!(f, "{:label_width$}", "")?;
        for column in &self.columns {
            write!(f, "  {:>w$}", column.name(), w = column.name().len().max(6))?;
        }
        writeln!(f)?;
        for (column, row) in self.columns.iter().zip(&self.values) {
            write!(f, "{:<label_width$}", column.name())?;
            for (other, value) in self.columns.iter().zip(row) {
                write!(f, "  {:>w$}", format_cell(*value), w = other.name().len().max(6))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in pairs {
        covariance += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Pearson correlation of every pair of columns over the rows where both
/// values are present. Fewer than two pairs or a constant column leave the
/// entry undefined.
#[must_use]
pub fn correlation_matrix(dataset: &WeatherDataset, columns: &[Column]) -> CorrelationMatrix {
    let cells: Vec<Vec<Option<f64>>> = dataset
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|&c| column_value(record, c).filter(|v| v.is_finite()))
                .collect()
        })
        .collect();

    let values = (0..columns.len())
        .map(|i| {
            (0..columns.len())
                .map(|j| {
                    let pairs: Vec<(f64, f64)> = cells
                        .iter()
                        .filter_map(|row| Some((row[i]?, row[j]?)))
                        .collect();
                    pearson(&pairs)
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    }
}

/// Averages of two cities side by side with the mean over both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityComparison {
    pub cities: [String; 2],
    pub columns: Vec<String>,
    /// Mean of each column over the rows of both cities
    pub combined: Vec<Option<f64>>,
    /// Per-city means of the same columns
    pub per_city: AverageTable,
}

/// Compare two cities. Both must occur in the dataset; the same city twice
/// is allowed and compares it with itself.
pub fn compare_cities(
    dataset: &WeatherDataset,
    city_a: &str,
    city_b: &str,
    columns: &[Column],
) -> Result<CityComparison> {
    for city in [city_a, city_b] {
        if !dataset.iter().any(|r| r.city == city) {
            return Err(WeatherInsightsError::validation(format!(
                "City '{city}' not found in dataset"
            )));
        }
    }

    let rows = dataset.filtered(|r| r.city == city_a || r.city == city_b);
    let combined = columns
        .iter()
        .map(|&column| mean(&present_values(&rows, column)))
        .collect();

    Ok(CityComparison {
        cities: [city_a.to_string(), city_b.to_string()],
        columns: columns.iter().map(|c| c.name().to_string()).collect(),
        combined,
        per_city: city_averages(&rows, columns),
    })
}

/// Predicted label of one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPrediction {
    pub city: String,
    /// Feature values as fed to the model
    pub features: Vec<f64>,
    pub predicted: RainLabel,
}

/// Predictions for the selected cities with their feature averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    pub feature_names: Vec<String>,
    pub predictions: Vec<CityPrediction>,
    /// Per-city mean of the model features, rounded to 2 decimals
    pub averages: AverageTable,
}

/// Predict rain for every row of the selected cities.
///
/// `matrix` must have been built from `dataset`, row for row.
pub fn predict_cities<S: AsRef<str>>(
    model: &GradientBoostingClassifier,
    dataset: &WeatherDataset,
    matrix: &FeatureMatrix,
    cities: &[S],
) -> Result<PredictionTable> {
    if matrix.n_rows() != dataset.len() {
        return Err(WeatherInsightsError::validation(format!(
            "Feature matrix has {} rows but the dataset has {}",
            matrix.n_rows(),
            dataset.len()
        )));
    }

    let indices: Vec<usize> = dataset
        .iter()
        .enumerate()
        .filter(|(_, r)| cities.iter().any(|c| c.as_ref() == r.city))
        .map(|(i, _)| i)
        .collect();

    let selected = matrix.select_rows(&indices)?;
    let labels = model.predict(&selected.rows)?;

    let predictions: Vec<CityPrediction> = indices
        .iter()
        .zip(selected.rows)
        .zip(labels)
        .map(|((&i, features), label)| CityPrediction {
            city: dataset.records[i].city.clone(),
            features,
            predicted: RainLabel::from_class(label),
        })
        .collect();

    let mut names: Vec<String> = predictions.iter().map(|p| p.city.clone()).collect();
    names.sort();
    names.dedup();
    let rows = names
        .into_iter()
        .map(|city| {
            let values = (0..matrix.n_features())
                .map(|j| {
                    let values: Vec<f64> = predictions
                        .iter()
                        .filter(|p| p.city == city)
                        .map(|p| p.features[j])
                        .collect();
                    mean(&values).map(round2)
                })
                .collect();
            CityAverage { city, values }
        })
        .collect();

    Ok(PredictionTable {
        feature_names: matrix.feature_names.clone(),
        predictions,
        averages: AverageTable {
            columns: matrix.feature_names.clone(),
            rows,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ModelParams;
    use crate::models::WeatherRecord;
    use crate::pipeline::{FeatureMode, prepare};

    fn record(city: &str, temperature: f64, humidity: Option<f64>, weather: &str) -> WeatherRecord {
        WeatherRecord {
            temperature: Some(temperature),
            humidity,
            weather: Some(weather.to_string()),
            ..WeatherRecord::new(city)
        }
    }

    fn dataset() -> WeatherDataset {
        WeatherDataset::new(
            [
                Column::City,
                Column::Temperature,
                Column::Humidity,
                Column::Weather,
            ],
            vec![
                record("Paris", 10.0, Some(80.0), "Light rain"),
                record("Oslo", 2.0, Some(60.0), "Clear sky"),
                record("Paris", 14.0, None, "Overcast clouds"),
                record("Lima", 20.0, Some(70.0), "Clear sky"),
                record("Oslo", 4.0, Some(65.0), "Light rain"),
            ],
        )
    }

    #[test]
    fn test_unique_cities_keep_first_appearance() {
        assert_eq!(unique_cities(&dataset()), vec!["Paris", "Oslo", "Lima"]);
    }

    #[test]
    fn test_select_cities_bounds() {
        let data = dataset();
        let selected = select_cities(&data, &["Oslo", "Lima"], 5).unwrap();
        assert_eq!(selected.len(), 3);
        assert_eq!(selected.columns(), data.columns());

        let none: [&str; 0] = [];
        assert!(select_cities(&data, &none, 5).is_err());
        assert!(select_cities(&data, &["a", "b", "c", "d", "e", "f"], 5).is_err());
    }

    #[test]
    fn test_describe() {
        let summary = describe(&dataset(), &[Column::Temperature, Column::Humidity]);
        let temperature = &summary[0];
        assert_eq!(temperature.count, 5);
        assert_eq!(temperature.mean, Some(10.0));
        assert_eq!(temperature.min, Some(2.0));
        assert_eq!(temperature.median, Some(10.0));
        assert_eq!(temperature.q25, Some(4.0));
        assert_eq!(temperature.q75, Some(14.0));
        assert_eq!(temperature.max, Some(20.0));
        // sample variance of 2, 4, 10, 14, 20 is 216 / 4
        assert!((temperature.std.unwrap() - 54.0_f64.sqrt()).abs() < 1e-9);

        let humidity = &summary[1];
        assert_eq!(humidity.count, 4);
        // sorted 60, 65, 70, 80: position 0.75 between 60 and 65
        assert_eq!(humidity.q25, Some(63.75));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let data = dataset().filtered(|r| r.city == "Lima");
        let summary = describe(&data, &[Column::Temperature]);
        assert_eq!(summary[0].std, None);
        assert_eq!(summary[0].q75, Some(20.0));
    }

    #[test]
    fn test_city_averages_sorted_and_rounded() {
        let mut data = dataset();
        data.records[2].temperature = Some(14.333);
        let table = city_averages(&data, &[Column::Temperature, Column::Humidity]);

        let cities: Vec<_> = table.rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Lima", "Oslo", "Paris"]);
        assert_eq!(table.get("Paris", "Temperature"), Some(12.17));
        assert_eq!(table.get("Paris", "Humidity"), Some(80.0));
        assert_eq!(table.get("Oslo", "Humidity"), Some(62.5));
        assert!(table.to_string().starts_with("City"));
    }

    #[test]
    fn test_weather_condition_frequency() {
        let frequency = weather_condition_frequency(&dataset());
        assert_eq!(
            frequency,
            vec![
                ConditionCount {
                    weather: "Clear sky".to_string(),
                    count: 2
                },
                ConditionCount {
                    weather: "Light rain".to_string(),
                    count: 2
                },
                ConditionCount {
                    weather: "Overcast clouds".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_correlation_matrix() {
        let mut data = dataset();
        data.add_column(Column::FeelsLike);
        data.add_column(Column::Pressure);
        for r in &mut data.records {
            r.feels_like = r.temperature.map(|t| 2.0 * t + 1.0);
            r.pressure = Some(1013.0);
        }

        let matrix = correlation_matrix(
            &data,
            &[Column::Temperature, Column::FeelsLike, Column::Pressure],
        );
        let r = matrix.get(Column::Temperature, Column::FeelsLike).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(matrix.get(Column::Temperature, Column::Pressure), None);
        assert_eq!(matrix.get(Column::Pressure, Column::Pressure), None);
        assert!(matrix.to_string().contains("Feels Like"));
    }

    #[test]
    fn test_correlation_uses_pairwise_rows() {
        let data = dataset();
        let matrix = correlation_matrix(&data, &[Column::Temperature, Column::Humidity]);
        // Paris 14.0 has no humidity, leaving four pairs
        assert!(matrix.get(Column::Temperature, Column::Humidity).is_some());
        let single = data.filtered(|r| r.city == "Lima");
        let matrix = correlation_matrix(&single, &[Column::Temperature, Column::Humidity]);
        assert_eq!(matrix.get(Column::Temperature, Column::Humidity), None);
    }

    #[test]
    fn test_compare_cities() {
        let comparison =
            compare_cities(&dataset(), "Paris", "Oslo", &[Column::Temperature]).unwrap();
        assert_eq!(comparison.combined, vec![Some(7.5)]);
        assert_eq!(comparison.per_city.get("Oslo", "Temperature"), Some(3.0));
        assert!(compare_cities(&dataset(), "Paris", "Atlantis", &[Column::Temperature]).is_err());
    }

    #[test]
    fn test_predict_cities() {
        let records: Vec<WeatherRecord> = (0..40)
            .map(|i| {
                let humidity = (i * 37 % 100) as f64;
                let city = if i % 2 == 0 { "Dry" } else { "Wet" };
                WeatherRecord {
                    humidity: Some(humidity),
                    cloudiness: Some(10.0),
                    weather: Some("Clear".to_string()),
                    ..WeatherRecord::new(city)
                }
            })
            .collect();
        let data = WeatherDataset::new(
            [Column::City, Column::Humidity, Column::Cloudiness, Column::Weather],
            records,
        );
        let (prepared, matrix) = prepare(&data, &["Humidity"], FeatureMode::Lenient).unwrap();
        let mut model = GradientBoostingClassifier::new(ModelParams::default());
        model.fit(&matrix.rows, &matrix.targets).unwrap();

        let table = predict_cities(&model, &prepared, &matrix, &["Wet"]).unwrap();
        assert_eq!(table.predictions.len(), 20);
        assert!(table.predictions.iter().all(|p| p.city == "Wet"));
        for prediction in &table.predictions {
            let expected = RainLabel::from(prediction.features[0] > 75.0);
            assert_eq!(prediction.predicted, expected);
        }
        assert_eq!(table.averages.rows.len(), 1);
        assert_eq!(table.feature_names, vec!["Humidity"]);
    }
}
