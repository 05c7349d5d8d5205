//! Field-level conversions shared by the platform mappers.
//!
//! Everything here is a pure function of its input. Values that cannot be
//! parsed come back as `None` and the caller substitutes the zero value.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

/// ISO-8601 duration: `PT1H30M`, `P1DT2H`, `PT0H15M0S`, `PT0.5H`.
static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)W)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("Invalid ISO duration regex")
});

/// Free-text duration component: "1 hour", "25 minutes", "1h", "90 min", "1.5 hrs".
static TEXT_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:[.,]\d+)?)\s*(days?|d|hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)\b",
    )
    .expect("Invalid text duration regex")
});

/// Midnight UTC of the date part of an ISO-8601-ish timestamp.
///
/// Only the text before the first `T` (or space) is used; the time of day is
/// discarded. Accepts `2024-04-12`, `2024-04-12T10:38:36.12`, `2024/04/12 10:00`.
pub fn date_only(timestamp: &str) -> Option<DateTime<Utc>> {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed)
        .replace('/', "-");

    match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Err(e) => {
            tracing::debug!(timestamp, error = %e, "unparseable date, using zero value");
            None
        }
    }
}

/// [`date_only`], falling back to the zero timestamp.
pub fn date_or_zero(timestamp: &str) -> DateTime<Utc> {
    date_only(timestamp).unwrap_or_default()
}

/// First whitespace-delimited token that parses as an integer, e.g. "6 servings" -> 6.
pub fn first_integer(text: &str) -> Option<u16> {
    text.split_whitespace().find_map(|token| token.parse().ok())
}

/// Whole servings from a numeric field: 24.0 -> 24. Negative or NaN gives `None`.
pub fn whole_servings(value: f64) -> Option<u16> {
    if value.is_finite() && value >= 1.0 {
        Some(value.trunc().min(u16::MAX as f64) as u16)
    } else {
        None
    }
}

/// Parse an ISO-8601 or free-text duration into a single unit.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DURATION_REGEX.captures(text) {
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let seconds = part(1) * 604_800.0
            + part(2) * 86_400.0
            + part(3) * 3_600.0
            + part(4) * 60.0
            + part(5);
        return to_duration(text, seconds);
    }

    let mut seconds = 0.0;
    let mut matched = false;
    for caps in TEXT_DURATION_REGEX.captures_iter(text) {
        let value: f64 = match caps[1].replace(',', ".").parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let unit = caps[2].to_ascii_lowercase();
        let scale = if unit.starts_with('d') {
            86_400.0
        } else if unit.starts_with('h') {
            3_600.0
        } else if unit.starts_with('m') {
            60.0
        } else {
            1.0
        };
        seconds += value * scale;
        matched = true;
    }
    if matched {
        return to_duration(text, seconds);
    }

    // A bare number is minutes.
    if let Ok(minutes) = text.parse::<f64>() {
        if minutes.is_finite() && minutes >= 0.0 {
            return to_duration(text, minutes * 60.0);
        }
    }

    tracing::debug!(text, "unparseable duration, using zero value");
    None
}

/// Seconds as a `Duration`; `None` when out of range.
fn to_duration(text: &str, seconds: f64) -> Option<Duration> {
    let duration = Duration::try_from_secs_f64(seconds).ok();
    if duration.is_none() {
        tracing::debug!(text, seconds, "duration out of range, using zero value");
    }
    duration
}

/// Whole minutes as a `Duration`, zero on overflow.
pub fn minutes(value: u64) -> Duration {
    value
        .checked_mul(60)
        .map(Duration::from_secs)
        .unwrap_or_default()
}

/// Attach a unit suffix to a non-empty value: ("322", " kcal") -> "322 kcal".
pub fn with_unit(value: &str, unit: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        String::new()
    } else {
        format!("{}{}", value, unit)
    }
}

/// Split an instruction blob into trimmed paragraphs.
///
/// Paragraphs are separated by a blank line, either as real newlines or as
/// the escaped two-character `\n` sequences some exports contain.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\\n\\n")
        .flat_map(|chunk| chunk.split("\n\n"))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Render an ingredient amount without trailing zeros: 2.0 -> "2", 0.33 -> "0.33".
pub fn format_amount(amount: f64) -> String {
    format!("{}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_only_truncates_time() {
        assert_eq!(
            date_only("2024-12-18T08:18:02Z"),
            Some(Utc.with_ymd_and_hms(2024, 12, 18, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_date_only_variants() {
        let expected = Some(Utc.with_ymd_and_hms(2024, 4, 12, 0, 0, 0).unwrap());
        assert_eq!(date_only("2024-04-12"), expected);
        assert_eq!(date_only("2024-04-12T19:18:04.359452"), expected);
        assert_eq!(date_only("2024/04/12 10:00:00"), expected);
        assert_eq!(date_only("2024-04-12T10:00:00.000+02:00"), expected);
    }

    #[test]
    fn test_date_only_invalid() {
        assert_eq!(date_only(""), None);
        assert_eq!(date_only("yesterday"), None);
        assert_eq!(date_or_zero("yesterday"), DateTime::<Utc>::default());
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("6 servings"), Some(6));
        assert_eq!(first_integer("Serves 4 to 6"), Some(4));
        assert_eq!(first_integer("a dozen"), None);
        assert_eq!(first_integer(""), None);
    }

    #[test]
    fn test_whole_servings() {
        assert_eq!(whole_servings(24.0), Some(24));
        assert_eq!(whole_servings(2.5), Some(2));
        assert_eq!(whole_servings(0.0), None);
        assert_eq!(whole_servings(f64::NAN), None);
    }

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_duration("PT15M"), Some(Duration::from_secs(15 * 60)));
        assert_eq!(parse_duration("PT1H25M"), Some(Duration::from_secs(85 * 60)));
        assert_eq!(parse_duration("PT0H15M0S"), Some(Duration::from_secs(15 * 60)));
        assert_eq!(parse_duration("P1DT2H"), Some(Duration::from_secs(26 * 3600)));
        assert_eq!(parse_duration("PT0.5H"), Some(Duration::from_secs(30 * 60)));
    }

    #[test]
    fn test_parse_text_duration() {
        assert_eq!(
            parse_duration("1 hour 25 minutes"),
            Some(Duration::from_secs(85 * 60))
        );
        assert_eq!(parse_duration("25 minutes"), Some(Duration::from_secs(25 * 60)));
        assert_eq!(parse_duration("2 hours"), Some(Duration::from_secs(2 * 3600)));
        assert_eq!(parse_duration("1h 30m"), Some(Duration::from_secs(90 * 60)));
        assert_eq!(parse_duration("1,5 hrs"), Some(Duration::from_secs(90 * 60)));
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45 * 60)));
    }

    #[test]
    fn test_parse_duration_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("a while"), None);
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        assert_eq!(parse_duration("PT99999999999999999999H"), None);
        assert_eq!(parse_duration("99999999999999999999 hours"), None);
        assert_eq!(parse_duration("1e300"), None);
    }

    #[test]
    fn test_minutes() {
        assert_eq!(minutes(15), Duration::from_secs(15 * 60));
        assert_eq!(minutes(0), Duration::ZERO);
        assert_eq!(minutes(u64::MAX), Duration::ZERO);
    }

    #[test]
    fn test_with_unit() {
        assert_eq!(with_unit("322", " kcal"), "322 kcal");
        assert_eq!(with_unit("6.7", "g"), "6.7g");
        assert_eq!(with_unit("", "g"), "");
        assert_eq!(with_unit("  ", "g"), "");
    }

    #[test]
    fn test_split_paragraphs_escaped() {
        assert_eq!(
            split_paragraphs("step1\\n\\nstep2 \\n\\n  step3"),
            vec!["step1", "step2", "step3"]
        );
    }

    #[test]
    fn test_split_paragraphs_real_newlines() {
        assert_eq!(
            split_paragraphs("Mix well.\n\nBake for 20 minutes.\nServe."),
            vec!["Mix well.", "Bake for 20 minutes.\nServe."]
        );
    }

    #[test]
    fn test_split_paragraphs_keeps_single_escaped_newline() {
        assert_eq!(split_paragraphs("a  \\nb"), vec!["a  \\nb"]);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.33), "0.33");
        assert_eq!(format_amount(0.5), "0.5");
    }
}
