//! Getting weather data in and out
//!
//! - tabular: CSV load and store of normalized datasets
//! - collector: live collection through a [`crate::weather::WeatherProvider`]

pub mod collector;
pub mod tabular;

pub use collector::collect_weather;
pub use tabular::{load_csv, parse_timestamp, read_csv, write_csv, write_csv_to};
