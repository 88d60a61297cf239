//! Rain label derivation

use tracing::info;

use crate::models::{Column, RainLabel, WeatherDataset, WeatherRecord};

/// Humidity above which a record is labelled rain
pub const HUMIDITY_THRESHOLD: f64 = 75.0;
/// Cloudiness above which a record is labelled rain
pub const CLOUDINESS_THRESHOLD: f64 = 60.0;

/// Rain iff humidity > 75, cloudiness > 60, or the description mentions
/// "rain" in any case. Missing values never satisfy a condition.
#[must_use]
pub fn derive_label(record: &WeatherRecord) -> RainLabel {
    let humid = record.humidity.is_some_and(|h| h > HUMIDITY_THRESHOLD);
    let cloudy = record.cloudiness.is_some_and(|c| c > CLOUDINESS_THRESHOLD);
    let rainy = record
        .weather
        .as_deref()
        .is_some_and(|w| w.to_lowercase().contains("rain"));

    RainLabel::from(humid || cloudy || rainy)
}

/// Fill in rain labels when the dataset schema carries none.
///
/// A `Rain` column already present is left untouched, and so is any label a
/// record already holds. Returns whether labels were derived.
pub fn apply_rain_labels(dataset: &mut WeatherDataset) -> bool {
    if dataset.has_column(Column::Rain) {
        return false;
    }

    for record in &mut dataset.records {
        if record.rain.is_none() {
            record.rain = Some(derive_label(record));
        }
    }
    dataset.add_column(Column::Rain);

    info!(
        "'Rain' column auto-created for {} records from humidity, cloudiness and weather text",
        dataset.len()
    );
    true
}

/// Training target for a record: the supplied label when the schema has a
/// `Rain` column (empty cells count as no rain), otherwise the derived one.
#[must_use]
pub fn rain_target(dataset: &WeatherDataset, record: &WeatherRecord) -> RainLabel {
    if dataset.has_column(Column::Rain) {
        record.rain.unwrap_or(RainLabel::NoRain)
    } else {
        record.rain.unwrap_or_else(|| derive_label(record))
    }
}
