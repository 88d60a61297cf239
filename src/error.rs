//! Error types and handling for the weather insights library

use thiserror::Error;

/// Main error type for the weather insights library
#[derive(Error, Debug)]
pub enum WeatherInsightsError {
    /// Configuration-related errors, including a missing credential
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Malformed tabular data
    #[error("Data error: {message}")]
    Data { message: String },

    /// Training or prediction failures
    #[error("Model error: {message}")]
    Model { message: String },

    /// CSV reader/writer errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherInsightsError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new data error
    pub fn data<S: Into<String>>(message: S) -> Self {
        Self::Data {
            message: message.into(),
        }
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherInsightsError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API key.")
            }
            WeatherInsightsError::Api { .. } => {
                "Unable to reach the weather provider. Please check your internet connection."
                    .to_string()
            }
            WeatherInsightsError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherInsightsError::Data { message } => {
                format!("The dataset could not be read: {message}")
            }
            WeatherInsightsError::Csv { .. } => {
                "The CSV file is malformed. Please check its header and rows.".to_string()
            }
            WeatherInsightsError::Model { message } => {
                format!("Rain model failed: {message}")
            }
            WeatherInsightsError::Io { .. } => {
                "File operation failed. Please check the path and file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for WeatherInsightsError {
    fn from(err: reqwest::Error) -> Self {
        WeatherInsightsError::api(err.to_string())
    }
}

impl From<config::ConfigError> for WeatherInsightsError {
    fn from(err: config::ConfigError) -> Self {
        WeatherInsightsError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherInsightsError::config("missing API key");
        assert!(matches!(config_err, WeatherInsightsError::Config { .. }));

        let api_err = WeatherInsightsError::api("status 401");
        assert!(matches!(api_err, WeatherInsightsError::Api { .. }));

        let validation_err = WeatherInsightsError::validation("no cities selected");
        assert!(matches!(validation_err, WeatherInsightsError::Validation { .. }));

        let model_err = WeatherInsightsError::model("not trained");
        assert!(matches!(model_err, WeatherInsightsError::Model { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = WeatherInsightsError::config("API key file not found");
        assert!(config_err.user_message().contains("API key file not found"));

        let api_err = WeatherInsightsError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = WeatherInsightsError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherInsightsError = io_err.into();
        assert!(matches!(err, WeatherInsightsError::Io { .. }));
    }
}
