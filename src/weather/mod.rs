//! Weather provider seam
//!
//! The pipeline only needs "give me the current observation for a city";
//! [`WeatherProvider`] is that contract and [`OpenWeatherClient`] the live
//! implementation.

pub mod openweather;

pub use openweather::OpenWeatherClient;

use crate::Result;
use crate::models::RawWeatherRecord;

/// Source of current weather observations
pub trait WeatherProvider {
    /// Fetch the current observation for a city. Any failure, including a
    /// non-200 response, is an error and means "no data for this city".
    fn current_weather(&self, city: &str) -> Result<RawWeatherRecord>;
}
