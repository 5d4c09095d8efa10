//! # Duration Parsing
//!
//! Parses duration strings such as `500ms`, `10s`, `1m30s`, `1.5h` or `1d`.
//!
//! A duration is one or more `<number><unit>` segments with no separators.
//! Numbers may carry a fractional part. Units: `ns`, `us` (or `µs`), `ms`,
//! `s`, `m`, `h`, `d`.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

static DURATION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?(?:ns|us|µs|ms|s|m|h|d))+$")
        .expect("Failed to compile DURATION_FORMAT regex - this should never happen")
});

static DURATION_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<number>\d+(?:\.\d+)?)(?P<unit>ns|us|µs|ms|s|m|h|d)")
        .expect("Failed to compile DURATION_SEGMENT regex - this should never happen")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration string cannot be empty")]
    Empty,
    #[error(
        "invalid duration format '{0}'. Expected <number><unit> segments (e.g. '500ms', '10s', '1m30s')"
    )]
    InvalidFormat(String),
    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse a duration string into a [`Duration`]
///
/// Zero is a valid result here; callers that need a positive interval check
/// for it themselves.
pub fn parse_duration(value: &str) -> Result<Duration, DurationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let lower = trimmed.to_lowercase();
    if !DURATION_FORMAT.is_match(&lower) {
        return Err(DurationError::InvalidFormat(trimmed.to_string()));
    }

    let mut nanos = 0f64;
    for captures in DURATION_SEGMENT.captures_iter(&lower) {
        let number: f64 = captures["number"]
            .parse()
            .map_err(|_err| DurationError::InvalidFormat(trimmed.to_string()))?;
        let scale = match &captures["unit"] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "d" => 86400e9,
            _ => return Err(DurationError::InvalidFormat(trimmed.to_string())),
        };
        nanos += number * scale;
    }

    let nanos = nanos.round();
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(DurationError::OutOfRange(trimmed.to_string()));
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "rounded, finite and range-checked above"
    )]
    let nanos = nanos as u64;
    Ok(Duration::from_nanos(nanos))
}
