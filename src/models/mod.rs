//! Data models for weather observations
//!
//! This module contains the core domain models organized by concern:
//! - Column: names of the tabular schema
//! - Record: raw provider observations, normalized records and the rain label
//! - Dataset: records together with the columns their schema carries

pub mod column;
pub mod dataset;
pub mod record;

pub use column::Column;
pub use dataset::WeatherDataset;
pub use record::{RainLabel, RawWeatherRecord, WeatherRecord};
