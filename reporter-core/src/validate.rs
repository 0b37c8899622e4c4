use crate::error::ReporterError;

/// Longest city name accepted, in characters.
pub const MAX_CITY_LEN: usize = 100;

/// Normalize a raw city argument: trim it and collapse whitespace runs to one space.
///
/// Fails with [`ReporterError::InvalidInput`] for empty input, names longer than
/// [`MAX_CITY_LEN`], and names containing control characters.
pub fn validate_city(raw: &str) -> Result<String, ReporterError> {
    if raw.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(ReporterError::InvalidInput(
            "city name must not contain control characters".to_string(),
        ));
    }

    let city = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if city.is_empty() {
        return Err(ReporterError::InvalidInput("city name cannot be empty".to_string()));
    }

    let len = city.chars().count();
    if len > MAX_CITY_LEN {
        return Err(ReporterError::InvalidInput(format!(
            "city name is {len} characters long (maximum is {MAX_CITY_LEN})"
        )));
    }

    Ok(city)
}
