use crate::{Config, ReporterError, WeatherRecord, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for an already validated city name.
    async fn current_weather(&self, city: &str) -> Result<WeatherRecord, ReporterError>;
}

/// Construct the provider from config and an API key.
pub fn provider_from_config(
    config: &Config,
    api_key: String,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let units = config.units()?;

    let mut http = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        http = http.timeout(Duration::from_secs(secs));
    }
    let http = http.build()?;

    Ok(Box::new(OpenWeatherProvider::with_client(api_key, units, http)))
}
