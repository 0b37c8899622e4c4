use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Result of one successful weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    /// When the lookup was made.
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    /// Relative humidity, 0-100.
    pub humidity: u8,
    pub condition: String,
    /// Provider payload the record was built from. Never written to the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_source: Option<serde_json::Value>,
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    /// Temperature suffix for this unit system.
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial, standard."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn units_parse_ignores_case() {
        assert_eq!(Units::try_from("Imperial").unwrap(), Units::Imperial);
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn raw_source_is_skipped_when_absent() {
        let record = WeatherRecord {
            city: "Oslo".into(),
            timestamp: Utc::now(),
            temperature: -3.5,
            humidity: 81,
            condition: "snow".into(),
            raw_source: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("raw_source").is_none());
        assert_eq!(json["city"], "Oslo");
    }
}
