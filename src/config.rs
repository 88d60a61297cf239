//! Configuration management for the weather insights tool
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::classifier::ModelParams;
use crate::pipeline::{DEFAULT_FEATURES, FeatureMode, MissingFieldPolicy};
use crate::{Result, WeatherInsightsError};

/// Cities fetched when the configuration names none
pub const DEFAULT_CITIES: [&str; 50] = [
    "Delhi", "New York", "Tokyo", "Paris", "London", "Beijing", "Moscow", "Berlin", "Dubai",
    "Mumbai", "Los Angeles", "Chicago", "Toronto", "São Paulo", "Buenos Aires", "Cairo",
    "Istanbul", "Bangkok", "Seoul", "Jakarta", "Sydney", "Melbourne", "Mexico City", "Madrid",
    "Rome", "Lagos", "Nairobi", "Cape Town", "Karachi", "Lima", "Singapore", "Hong Kong",
    "Barcelona", "Vienna", "Budapest", "Warsaw", "Prague", "Dublin", "Brussels", "Amsterdam",
    "Zurich", "Geneva", "Stockholm", "Oslo", "Helsinki", "Copenhagen", "Doha", "Riyadh", "Tehran",
    "Kuala Lumpur",
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Feature pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Rain classifier configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// API key; takes precedence over `api_key_file`
    pub api_key: Option<String>,
    /// File holding the API key
    #[serde(default = "default_api_key_file")]
    pub api_key_file: PathBuf,
    /// Base URL of the provider
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Cities to fetch
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,
}

/// Feature pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Requested model features, in column order
    #[serde(default = "default_feature_names")]
    pub feature_names: Vec<String>,
    /// Handling of requested features missing from the data
    #[serde(default)]
    pub feature_mode: FeatureMode,
    /// Handling of provider records with missing fields
    #[serde(default)]
    pub missing_fields: MissingFieldPolicy,
    /// Largest number of cities that can be selected at once
    #[serde(default = "default_max_selected_cities")]
    pub max_selected_cities: usize,
}

/// Rain classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Boosting hyperparameters
    #[serde(flatten)]
    pub params: ModelParams,
    /// Share of rows held out for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed of the train/test shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_key_file() -> PathBuf {
    PathBuf::from("api_key.txt")
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_cities() -> Vec<String> {
    DEFAULT_CITIES.iter().map(|c| (*c).to_string()).collect()
}

fn default_feature_names() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|f| (*f).to_string()).collect()
}

fn default_max_selected_cities() -> usize {
    5
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_file: default_api_key_file(),
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            cities: default_cities(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feature_names: default_feature_names(),
            feature_mode: FeatureMode::default(),
            missing_fields: MissingFieldPolicy::default(),
            max_selected_cities: default_max_selected_cities(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            params: ModelParams::default(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    /// Resolve the provider credential from the config or the key file.
    ///
    /// A missing or empty credential is fatal and must be reported before
    /// any fetch starts.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        let key = fs::read_to_string(&self.api_key_file).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                WeatherInsightsError::config(format!(
                    "API key file not found at {}",
                    self.api_key_file.display()
                ))
            } else {
                WeatherInsightsError::config(format!(
                    "Cannot read API key file {}: {}",
                    self.api_key_file.display(),
                    e
                ))
            }
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(WeatherInsightsError::config(format!(
                "API key file {} is empty",
                self.api_key_file.display()
            )));
        }
        Ok(key.to_string())
    }
}

impl AppConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the given path
    pub fn load_from_path(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path
            .map(Path::to_path_buf)
            .or_else(Self::get_config_path)
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        } else if config_path.is_some() {
            return Err(WeatherInsightsError::config(format!(
                "Config file not found: {}",
                config_file.display()
            )));
        }

        // Environment overrides, e.g. WEATHER_INSIGHTS_WEATHER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_INSIGHTS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("weather.cities")
                .with_list_parse_key("pipeline.feature_names")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-insights").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.cities.is_empty() {
            self.weather.cities = default_cities();
        }
        if self.pipeline.feature_names.is_empty() {
            self.pipeline.feature_names = default_feature_names();
        }
        if self.pipeline.max_selected_cities == 0 {
            self.pipeline.max_selected_cities = default_max_selected_cities();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(WeatherInsightsError::config(
                "Weather API timeout cannot exceed 300 seconds",
            ));
        }

        let test_fraction = self.model.test_fraction;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(WeatherInsightsError::config(format!(
                "Test fraction must be between 0 and 1 (exclusive), got {test_fraction}"
            )));
        }

        let params = &self.model.params;
        if params.n_estimators == 0 || params.n_estimators > 10_000 {
            return Err(WeatherInsightsError::config(
                "Number of estimators must be between 1 and 10000",
            ));
        }
        if !(params.learning_rate > 0.0 && params.learning_rate <= 1.0) {
            return Err(WeatherInsightsError::config(
                "Learning rate must be in (0, 1]",
            ));
        }
        if params.max_depth == 0 || params.max_depth > 16 {
            return Err(WeatherInsightsError::config(
                "Maximum tree depth must be between 1 and 16",
            ));
        }
        if params.min_child_weight < 0.0 || params.reg_lambda < 0.0 {
            return Err(WeatherInsightsError::config(
                "Minimum child weight and L2 regularization cannot be negative",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherInsightsError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherInsightsError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(WeatherInsightsError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.weather.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.weather.cities.len(), 50);
        assert_eq!(config.pipeline.feature_mode, FeatureMode::Lenient);
        assert_eq!(config.pipeline.max_selected_cities, 5);
        assert_eq!(config.model.test_fraction, 0.2);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AppConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = AppConfig::default();
        config.model.test_fraction = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "abc123"
cities = ["Oslo", "Lima"]

[pipeline]
feature_mode = "strict"
feature_names = ["Humidity", "Comfort Index"]

[model]
n_estimators = 50
seed = 7
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(Some(file.path())).unwrap();
        assert_eq!(config.weather.cities, vec!["Oslo", "Lima"]);
        assert_eq!(config.pipeline.feature_mode, FeatureMode::Strict);
        assert_eq!(config.pipeline.feature_names, vec!["Humidity", "Comfort Index"]);
        assert_eq!(config.model.params.n_estimators, 50);
        assert_eq!(config.model.params.max_depth, 5);
        assert_eq!(config.model.seed, 7);
        assert_eq!(config.weather.resolve_api_key().unwrap(), "abc123");
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let result = AppConfig::load_from_path(Some(Path::new("/no/such/config.toml")));
        assert!(matches!(result, Err(WeatherInsightsError::Config { .. })));
    }

    #[test]
    fn test_api_key_from_file() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(key_file, "  key-from-file  ").unwrap();

        let config = WeatherConfig {
            api_key_file: key_file.path().to_path_buf(),
            ..WeatherConfig::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "key-from-file");
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let config = WeatherConfig {
            api_key: Some("   ".to_string()),
            api_key_file: PathBuf::from("/no/such/api_key.txt"),
            ..WeatherConfig::default()
        };
        let err = config.resolve_api_key().unwrap_err();
        assert!(matches!(err, WeatherInsightsError::Config { .. }));
        assert!(err.to_string().contains("API key file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AppConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weather-insights"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
