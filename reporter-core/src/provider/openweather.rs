use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;

use crate::{ReporterError, Units, WeatherRecord};

use super::WeatherProvider;

pub const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    units: Units,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, units: Units) -> Self {
        Self::with_client(api_key, units, Client::new())
    }

    pub fn with_client(api_key: String, units: Units, http: Client) -> Self {
        Self {
            api_key,
            units,
            base_url: CURRENT_WEATHER_URL.to_string(),
            http,
        }
    }

    /// Point the provider at a different current-weather endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("units", &self.units)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

/// Error body, e.g. `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, city: &str) -> Result<WeatherRecord, ReporterError> {
        debug!("requesting current weather: city={city} units={}", self.units);

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ReporterError::network("failed to send request to OpenWeather", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ReporterError::network("failed to read OpenWeather response body", e))?;

        debug!("OpenWeather responded: status={status} bytes={}", body.len());

        check_status(status, city, &body)?;
        let record = parse_current(city, &body, Utc::now())?;

        info!(
            "fetched current weather: city={} temperature={} humidity={}",
            record.city, record.temperature, record.humidity
        );
        Ok(record)
    }
}

/// Map a non-success status to the matching error kind.
fn check_status(status: StatusCode, city: &str, body: &str) -> Result<(), ReporterError> {
    if status.is_success() {
        return Ok(());
    }

    let message = serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| truncate_body(body));

    Err(match status {
        StatusCode::UNAUTHORIZED => ReporterError::Auth(format!(
            "OpenWeather rejected the API key ({message}). Check OPENWEATHER_API_KEY."
        )),
        StatusCode::NOT_FOUND => ReporterError::NotFound(format!("'{city}' ({message})")),
        _ => ReporterError::Network {
            context: format!("OpenWeather request failed with status {status}: {message}"),
            source: None,
        },
    })
}

/// Build a record from a current-weather JSON body.
fn parse_current(
    requested_city: &str,
    body: &str,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherRecord, ReporterError> {
    let raw: serde_json::Value = serde_json::from_str(body).map_err(|e| ReporterError::Parse {
        message: "response body is not valid JSON".to_string(),
        source: Some(e),
    })?;

    let parsed: OwCurrentResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ReporterError::Parse {
            message: "response is missing required fields".to_string(),
            source: Some(e),
        })?;

    if !parsed.main.temp.is_finite() {
        return Err(ReporterError::parse("temperature is not a finite number"));
    }
    if parsed.main.humidity > 100 {
        return Err(ReporterError::parse(format!(
            "humidity {} is outside 0-100",
            parsed.main.humidity
        )));
    }

    let city = if parsed.name.trim().is_empty() {
        requested_city.to_string()
    } else {
        parsed.name
    };

    let condition = parsed
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(WeatherRecord {
        city,
        timestamp: fetched_at,
        temperature: parsed.main.temp,
        humidity: parsed.main.humidity,
        condition,
        raw_source: Some(raw),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
