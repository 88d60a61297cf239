//! Blocking client for the OpenWeatherMap current weather endpoint

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::models::RawWeatherRecord;
use crate::pipeline::normalize::capitalize;
use crate::{Result, WeatherInsightsError};

/// Weather API client for OpenWeatherMap
pub struct OpenWeatherClient {
    /// HTTP client
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client. The credential must already be resolved.
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weather-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherInsightsError::api(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request_url(&self, city: &str) -> String {
        format!(
            "{}/weather?q={}&appid={}&units=metric",
            self.base_url,
            urlencoding::encode(&capitalize(city)),
            urlencoding::encode(&self.api_key)
        )
    }
}

impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    fn current_weather(&self, city: &str) -> Result<RawWeatherRecord> {
        let start_time = Instant::now();
        debug!("Requesting current weather from {}/weather", self.base_url);

        let response = self.client.get(self.request_url(city)).send()?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(WeatherInsightsError::api(format!(
                "{} - {}",
                status,
                body.trim()
            )));
        }

        let payload: CurrentWeatherResponse = response.json().map_err(|e| {
            WeatherInsightsError::api(format!("Invalid weather data for {city}: {e}"))
        })?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved current weather for {} in {:.3}s",
            city,
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(payload.into())
    }
}

/// Current weather response. Only the fields the pipeline reads are mapped,
/// and each of them may be absent.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub name: Option<String>,
    pub main: Option<MainData>,
    pub wind: Option<WindData>,
    #[serde(default)]
    pub weather: Vec<ConditionData>,
    pub visibility: Option<f64>,
    pub sys: Option<SysData>,
    pub timezone: Option<i64>,
    pub clouds: Option<CloudData>,
}

#[derive(Debug, Deserialize)]
pub struct MainData {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WindData {
    pub speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ConditionData {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SysData {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CloudData {
    pub all: Option<f64>,
}

fn from_unix(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

impl From<CurrentWeatherResponse> for RawWeatherRecord {
    fn from(response: CurrentWeatherResponse) -> Self {
        let main = response.main.as_ref();
        let sys = response.sys.as_ref();

        RawWeatherRecord {
            city: response.name.clone(),
            temperature_c: main.and_then(|m| m.temp),
            feels_like_c: main.and_then(|m| m.feels_like),
            humidity_pct: main.and_then(|m| m.humidity),
            pressure_hpa: main.and_then(|m| m.pressure),
            wind_speed_ms: response.wind.as_ref().and_then(|w| w.speed),
            description: response
                .weather
                .first()
                .and_then(|w| w.description.clone()),
            visibility_m: response.visibility,
            sunrise: from_unix(sys.and_then(|s| s.sunrise)),
            sunset: from_unix(sys.and_then(|s| s.sunset)),
            timezone: response.timezone,
            cloudiness_pct: response.clouds.as_ref().and_then(|c| c.all),
        }
    }
}
