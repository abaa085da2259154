use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "crl-monitor")]
#[command(about = "Exports generation and expiration times of CRLs as Prometheus metrics")]
pub struct Args {
    /// Interval at which CRLs are fetched from distribution points (e.g. "1h", "15m", "1h30m")
    #[arg(long, default_value = "1h", value_parser = parse_refresh_interval)]
    pub refresh_interval: Duration,

    /// Config file listing CRLs to monitor
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing or unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("refresh interval must be greater than zero")]
    Zero,
}

/// Suffix to nanoseconds multiplier
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1_000.0),
    ("µs", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "1h", "1h30m", "2.5s" or "500ms"
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let is_numeric = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = s;
    let mut nanos = 0.0;

    while !rest.is_empty() {
        let number_len = rest.find(|c| !is_numeric(c)).unwrap_or(rest.len());
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;
        rest = &rest[number_len..];

        let unit_len = rest.find(is_numeric).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let multiplier = UNITS
            .iter()
            .find(|(suffix, _)| *suffix == unit)
            .map(|(_, multiplier)| *multiplier)
            .ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;
        rest = &rest[unit_len..];

        nanos += value * multiplier;
    }

    Ok(Duration::from_nanos(nanos as u64))
}

fn parse_refresh_interval(input: &str) -> Result<Duration, DurationError> {
    let interval = parse_duration(input)?;
    if interval.is_zero() {
        return Err(DurationError::Zero);
    }
    Ok(interval)
}
