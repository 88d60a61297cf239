//! Best-effort batch collection of live observations

use tracing::{info, instrument, warn};

use crate::models::RawWeatherRecord;
use crate::weather::WeatherProvider;

/// Query the provider for each city in order.
///
/// A city whose request fails is logged and left out; the batch continues.
#[instrument(skip(provider, cities), fields(cities = cities.len()))]
pub fn collect_weather<P, S>(provider: &P, cities: &[S]) -> Vec<RawWeatherRecord>
where
    P: WeatherProvider + ?Sized,
    S: AsRef<str>,
{
    let mut records = Vec::with_capacity(cities.len());

    for city in cities {
        let city = city.as_ref();
        match provider.current_weather(city) {
            Ok(record) => records.push(record),
            Err(e) => warn!("No data for {}: {}", city, e),
        }
    }

    info!(
        "Collected weather for {} of {} cities",
        records.len(),
        cities.len()
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Result, WeatherInsightsError};

    struct FlakyProvider;

    impl WeatherProvider for FlakyProvider {
        fn current_weather(&self, city: &str) -> Result<RawWeatherRecord> {
            if city == "Atlantis" {
                return Err(WeatherInsightsError::api("404 Not Found: city not found"));
            }
            Ok(RawWeatherRecord {
                city: Some(city.to_string()),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_failed_city_is_skipped() {
        let records = collect_weather(&FlakyProvider, &["Paris", "Atlantis", "Tokyo"]);
        let cities: Vec<_> = records.iter().filter_map(|r| r.city.as_deref()).collect();
        assert_eq!(cities, vec!["Paris", "Tokyo"]);
    }

    #[test]
    fn test_empty_city_list() {
        let cities: [&str; 0] = [];
        assert!(collect_weather(&FlakyProvider, &cities).is_empty());
    }
}
