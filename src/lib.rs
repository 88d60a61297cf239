//! `weather-insights` - City weather features and rain prediction
//!
//! This library fetches current weather for a list of cities, normalizes it
//! into a fixed tabular schema, derives rain labels and comfort/severity
//! metrics, and trains a gradient-boosted classifier that predicts rain.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod weather;

// Re-export core types for public API
pub use classifier::{
    ClassificationReport, GradientBoostingClassifier, ModelParams, TrainingMetrics,
    train_rain_classifier,
};
pub use config::AppConfig;
pub use error::WeatherInsightsError;
pub use ingest::{collect_weather, load_csv, read_csv, write_csv};
pub use models::{Column, RainLabel, RawWeatherRecord, WeatherDataset, WeatherRecord};
pub use pipeline::{
    DerivedMetrics, FeatureMatrix, FeatureMode, MissingFieldPolicy, build_feature_matrix,
    derive_label, derive_metrics, normalize, prepare,
};
pub use weather::{OpenWeatherClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherInsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
