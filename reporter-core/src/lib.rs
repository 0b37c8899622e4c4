//! Core library for the `weather-reporter` CLI.
//!
//! This crate defines:
//! - City name validation
//! - The OpenWeather client behind the [`WeatherProvider`] abstraction
//! - Report formatting
//! - The append-only CSV log and its summary
//! - Preferences handling
//!
//! It is used by `reporter-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod store;
pub mod validate;

pub use config::{Config, api_key_from_env};
pub use error::{ReporterError, StorageError};
pub use format::{format_report, format_summary};
pub use model::{Units, WeatherRecord};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{CsvStore, Summary};
pub use validate::validate_city;

/// Validate `raw_city`, look it up and append the result to `store`.
///
/// A failed lookup never touches the log.
pub async fn fetch_and_record(
    provider: &dyn WeatherProvider,
    store: &CsvStore,
    raw_city: &str,
) -> Result<WeatherRecord, ReporterError> {
    let city = validate_city(raw_city)?;
    let record = provider.current_weather(&city).await?;
    store.append(&record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openweather::{OpenWeatherProvider, stub};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Mutex<Vec<String>>,
        missing: bool,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current_weather(&self, city: &str) -> Result<WeatherRecord, ReporterError> {
            self.calls.lock().unwrap().push(city.to_string());
            if self.missing {
                return Err(ReporterError::NotFound(city.to_string()));
            }
            Ok(WeatherRecord {
                city: city.to_string(),
                timestamp: Utc::now(),
                temperature: 12.5,
                humidity: 64,
                condition: "light rain".to_string(),
                raw_source: None,
            })
        }
    }

    #[tokio::test]
    async fn invalid_city_never_reaches_provider() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("log.csv"));
        let provider = FakeProvider::default();

        let err = fetch_and_record(&provider, &store, "   ").await.unwrap_err();
        assert!(matches!(err, ReporterError::InvalidInput(_)));
        assert!(provider.calls.lock().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn failed_lookup_is_not_logged() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("log.csv"));
        let provider = FakeProvider { missing: true, ..FakeProvider::default() };

        let err = fetch_and_record(&provider, &store, "Atlantis").await.unwrap_err();
        assert!(matches!(err, ReporterError::NotFound(_)));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn provider_sees_normalized_city() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("log.csv"));
        let provider = FakeProvider::default();

        fetch_and_record(&provider, &store, "  Buenos   Aires ").await.unwrap();
        assert_eq!(*provider.calls.lock().unwrap(), vec!["Buenos Aires".to_string()]);
    }

    #[tokio::test]
    async fn appending_n_lookups_summarizes_to_n() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("log.csv"));
        let provider = FakeProvider::default();
        let cities = ["Oslo", "Lagos", "Oslo", "Quito", "Lagos"];

        for city in cities {
            fetch_and_record(&provider, &store, city).await.unwrap();
        }

        let summary = store.summarize().unwrap();
        assert_eq!(summary.count, cities.len());
        assert_eq!(
            summary.cities.keys().cloned().collect::<Vec<_>>(),
            vec!["Lagos".to_string(), "Oslo".to_string(), "Quito".to_string()]
        );
    }

    #[tokio::test]
    async fn london_end_to_end() {
        let body = r#"{"name":"London","main":{"temp":15.2,"humidity":70},"weather":[{"description":"cloudy"}]}"#;
        let (url, _server) = stub::serve_once("200 OK", body).await;
        let provider = OpenWeatherProvider::with_client("KEY".into(), Units::Metric, stub::client())
            .with_base_url(url);

        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("weather_log.csv"));

        let record = fetch_and_record(&provider, &store, "London").await.unwrap();
        let report = format_report(&record, Units::Metric);
        for needle in ["London", "15.2", "70", "cloudy"] {
            assert!(report.contains(needle), "report is missing {needle}: {report}");
        }

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let rows: Vec<_> = contents.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("London,"));
        assert!(rows[0].ends_with(",15.2,70,cloudy"));
    }
}
