/**
 * Normalization of the human formatted values printed by load testing tools.
 *
 * Transfer rates are normalized to MB/s and latencies to milliseconds.
 * Units are only recognized as a suffix: `"2.01gb"` is a rate in GB/s, but a
 * `b` anywhere else in the string is not a unit and the parse fails.
 */
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("empty value")]
    Empty,
    #[error("invalid number {number:?} in {value:?}")]
    InvalidNumber { value: String, number: String },
}

#[derive(Debug, Clone, Copy)]
enum Scale {
    Mul(f64),
    Div(f64),
}

impl Scale {
    fn apply(self, n: f64) -> f64 {
        match self {
            Scale::Mul(f) => n * f,
            Scale::Div(d) => n / d,
        }
    }
}

// Longest suffixes first, so that "mb" is not read as a bare "b".
const TRANSFER_UNITS: [(&str, Scale); 4] = [
    ("gb", Scale::Mul(1024.0)),
    ("mb", Scale::Mul(1.0)),
    ("kb", Scale::Div(1024.0)),
    ("b", Scale::Div(1024.0 * 1024.0)),
];

const LATENCY_UNITS: [(&str, Scale); 3] = [
    ("ms", Scale::Mul(1.0)),
    ("us", Scale::Div(1000.0)),
    ("s", Scale::Mul(1000.0)),
];

fn parse_with_units(value: &str, units: &[(&str, Scale)]) -> Result<f64, UnitError> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(UnitError::Empty);
    }
    let (number, scale) = units
        .iter()
        .find_map(|(suffix, scale)| {
            normalized
                .strip_suffix(suffix)
                .map(|number| (number.trim_end(), *scale))
        })
        .unwrap_or((normalized.as_str(), Scale::Mul(1.0)));

    number
        .parse::<f64>()
        .map(|n| scale.apply(n))
        .map_err(|_| UnitError::InvalidNumber {
            value: value.to_owned(),
            number: number.to_owned(),
        })
}

/// Parses a transfer rate (`2.01GB`, `300MB`, `400KB`, `512B` or a bare
/// number already in MB/s) into MB/s.
pub fn parse_transfer_rate(value: &str) -> Result<f64, UnitError> {
    parse_with_units(value, &TRANSFER_UNITS)
}

/// Parses a latency (`12.5ms`, `400us`, `1.2s` or a bare number already in
/// milliseconds) into milliseconds.
pub fn parse_latency(value: &str) -> Result<f64, UnitError> {
    parse_with_units(value, &LATENCY_UNITS)
}

/// wrk targets are paths below the served `static/` directory.
pub fn normalize_file_size(target: &str) -> String {
    target.replace("static/", "")
}
