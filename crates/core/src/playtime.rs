//! Parsing and formatting of play durations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{StoreError, StoreResult};

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m(?:in)?)?\s*$")
        .expect("failed to compile duration regex")
});

/// Parse a duration into minutes.
///
/// A bare integer is taken as minutes and may be negative so that range
/// checks stay with the store. Otherwise hours and minutes parts are
/// accepted: `"1h30m"`, `"1h 30m"`, `"2h"`, `"45m"`, `"45min"`.
pub fn parse_minutes(input: &str) -> StoreResult<i64> {
    let trimmed = input.trim();
    if let Ok(minutes) = trimmed.parse::<i64>() {
        return Ok(minutes);
    }

    let invalid = || StoreError::validation(format!("'{trimmed}' is not a duration"));
    let caps = DURATION_RE.captures(trimmed).ok_or_else(invalid)?;
    let hours = caps.get(1).map(|m| m.as_str());
    let minutes = caps.get(2).map(|m| m.as_str());
    if hours.is_none() && minutes.is_none() {
        return Err(invalid());
    }

    let parse = |raw: Option<&str>| -> StoreResult<i64> {
        raw.map(|value| value.parse::<i64>().map_err(|_| invalid()))
            .transpose()
            .map(|value| value.unwrap_or(0))
    };
    let hours = parse(hours)?;
    let minutes = parse(minutes)?;
    hours
        .checked_mul(60)
        .and_then(|total| total.checked_add(minutes))
        .ok_or_else(invalid)
}

/// Render minutes as `"2h 05m"`, or `"45m"` below one hour.
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours == 0 {
        format!("{rest}m")
    } else {
        format!("{hours}h {rest:02}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_forms() -> StoreResult<()> {
        assert_eq!(parse_minutes("90")?, 90);
        assert_eq!(parse_minutes("-15")?, -15);
        assert_eq!(parse_minutes("1h30m")?, 90);
        assert_eq!(parse_minutes("1h 30m")?, 90);
        assert_eq!(parse_minutes(" 2H ")?, 120);
        assert_eq!(parse_minutes("45m")?, 45);
        assert_eq!(parse_minutes("45min")?, 45);
        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "h", "m", "abc", "1.5h", "30m1h", "-1h"] {
            let err = parse_minutes(raw).unwrap_err();
            assert!(err.is_validation(), "{raw:?} should not parse");
        }
        assert!(parse_minutes("99999999999999999999h").is_err());
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(125), "2h 05m");
    }
}
