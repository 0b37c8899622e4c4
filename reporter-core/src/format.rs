//! Human-readable rendering of lookups and log summaries.

use std::fmt::Write;

use crate::{Summary, Units, WeatherRecord};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn format_report(record: &WeatherRecord, units: Units) -> String {
    format!(
        "Weather for {city}\n\
         \x20 Temperature: {temp:.1}{symbol}\n\
         \x20 Humidity:    {humidity}%\n\
         \x20 Condition:   {condition}\n\
         \x20 Fetched at:  {time}\n",
        city = record.city,
        temp = record.temperature,
        symbol = units.temperature_symbol(),
        humidity = record.humidity,
        condition = record.condition,
        time = record.timestamp.format(TIME_FORMAT),
    )
}

/// Temperatures are printed as logged; the log does not record unit systems.
pub fn format_summary(summary: &Summary) -> String {
    if summary.count == 0 {
        return "No lookups logged yet.\n".to_string();
    }

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Logged lookups:  {}", summary.count);
    let _ = writeln!(out, "Distinct cities: {}", summary.distinct_cities());
    for (city, lookups) in &summary.cities {
        let _ = writeln!(out, "  {city} ({lookups})");
    }
    if let Some(coldest) = &summary.coldest {
        let _ = writeln!(
            out,
            "Lowest:  {:.1} in {} at {}",
            coldest.temperature,
            coldest.city,
            coldest.timestamp.format(TIME_FORMAT)
        );
    }
    if let Some(warmest) = &summary.warmest {
        let _ = writeln!(
            out,
            "Highest: {:.1} in {} at {}",
            warmest.temperature,
            warmest.city,
            warmest.timestamp.format(TIME_FORMAT)
        );
    }
    if let Some(mean) = summary.mean_temperature {
        let _ = writeln!(out, "Mean:    {mean:.1}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn london() -> WeatherRecord {
        WeatherRecord {
            city: "London".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 1, 12, 30, 0).unwrap(),
            temperature: 15.2,
            humidity: 70,
            condition: "cloudy".into(),
            raw_source: None,
        }
    }

    #[test]
    fn report_has_fixed_layout() {
        let report = format_report(&london(), Units::Metric);
        assert_eq!(
            report,
            "Weather for London\n  Temperature: 15.2°C\n  Humidity:    70%\n  Condition:   cloudy\n  Fetched at:  2025-10-01 12:30 UTC\n"
        );
    }

    #[test]
    fn report_uses_unit_symbol() {
        let report = format_report(&london(), Units::Imperial);
        assert!(report.contains("15.2°F"));
    }

    #[test]
    fn empty_summary() {
        assert_eq!(format_summary(&Summary::default()), "No lookups logged yet.\n");
    }

    #[test]
    fn summary_lists_cities_and_extremes() {
        let mut paris = london();
        paris.city = "Paris".into();
        paris.temperature = 21.0;

        let text = format_summary(&Summary::from_records(&[london(), paris, london()]));
        assert!(text.contains("Logged lookups:  3"));
        assert!(text.contains("Distinct cities: 2"));
        assert!(text.contains("  London (2)\n"));
        assert!(text.contains("  Paris (1)\n"));
        assert!(text.contains("Lowest:  15.2 in London"));
        assert!(text.contains("Highest: 21.0 in Paris"));
        assert!(text.contains("Mean:    17.1"));
    }
}
