//! Human-readable durations (`250ms`, `5s`, `1m30s`, `1h`).
//!
//! Used by the config file and by command-line flags. Also provides the
//! `serialize`/`deserialize` pair for `#[serde(with = "...")]`.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration [{0}]")]
    Invalid(String),
    #[error("missing unit in duration [{0}]")]
    MissingUnit(String),
    #[error("unknown unit [{unit}] in duration [{input}]")]
    UnknownUnit { unit: String, input: String },
}

/// Parse a sequence of `<number><unit>` pairs. Units: `h`, `m`, `s`, `ms`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total_ms = 0f64;
    let mut rest = text;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;

        let unit_len = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let unit_ms = match unit {
            "h" => 3_600_000.0,
            "m" => 60_000.0,
            "s" => 1_000.0,
            "ms" => 1.0,
            "" => return Err(DurationError::MissingUnit(input.to_string())),
            other => {
                return Err(DurationError::UnknownUnit {
                    unit: other.to_string(),
                    input: input.to_string(),
                })
            }
        };

        total_ms += value * unit_ms;
        rest = tail;
    }

    Ok(Duration::from_millis(total_ms.round() as u64))
}

/// Render a duration in the shortest exact form (`30s`, `1500ms`).
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{ms}ms")
    }
}

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(de::Error::custom)
}
