//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::{Result, WeatherInsightsError};

/// Filter directive for the configured level. `RUST_LOG` takes precedence
/// unless `verbose` forces debug output.
fn build_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    if verbose {
        return EnvFilter::try_new("debug")
            .map_err(|e| WeatherInsightsError::config(format!("Invalid log filter: {e}")));
    }
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            WeatherInsightsError::config(format!("Invalid log level '{}': {e}", config.level))
        }),
    }
}

/// Install the global subscriber. Logs go to stderr so table output on
/// stdout stays clean.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = build_filter(config, verbose)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format.as_str() {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| WeatherInsightsError::config(format!("Cannot initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig::default();
        let filter = build_filter(&config, true).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggingConfig {
            level: "weather=loudest".to_string(),
            format: "pretty".to_string(),
        };
        // only meaningful when RUST_LOG is unset
        if std::env::var("RUST_LOG").is_err() {
            assert!(build_filter(&config, false).is_err());
        }
    }
}
