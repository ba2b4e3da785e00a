//! Type definitions shared by the TOC commands

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{ToopError, ToopResult};

/// Render a boolean as the single-character flag the TOCS expects
pub fn flag(value: bool) -> char {
    if value {
        'T'
    } else {
        'F'
    }
}

/// Whether `value` can travel as one space separated request argument
pub fn is_token(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Reject values that would break the space separated request line
pub fn check_token<'a>(what: &str, value: &'a str) -> ToopResult<&'a str> {
    if !is_token(value) {
        return Err(ToopError::invalid_argument(format!(
            "{} must be a single non-empty word: {:?}",
            what, value
        )));
    }
    Ok(value)
}

/// Render a double the way the TOCS has always received them.
///
/// Integral values keep one decimal place (`2.0`), magnitudes outside
/// `[1e-3, 1e7)` use exponent notation (`1.0E7`).
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-3..1e7).contains(&magnitude) {
        let s = format!("{}", value);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        let s = format!("{:E}", value);
        match s.split_once('E') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                format!("{}.0E{}", mantissa, exponent)
            }
            _ => s,
        }
    }
}

/// Target acquisition mode for ACQUIRE
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AcquireMode {
    #[default]
    None,
    Brightest,
    Wcs,
}

impl AcquireMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquireMode::None => "NONE",
            AcquireMode::Brightest => "BRIGHTEST",
            AcquireMode::Wcs => "WCS",
        }
    }
}

impl FromStr for AcquireMode {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(AcquireMode::None),
            "BRIGHTEST" => Ok(AcquireMode::Brightest),
            "WCS" => Ok(AcquireMode::Wcs),
            _ => Err(ToopError::invalid_argument(format!("unknown acquire mode: {}", s))),
        }
    }
}

/// Acquisition precision for ACQUIRE
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AcquirePrecision {
    #[default]
    Normal,
    High,
}

impl AcquirePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquirePrecision::Normal => "NORMAL",
            AcquirePrecision::High => "HIGH",
        }
    }
}

impl FromStr for AcquirePrecision {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(AcquirePrecision::Normal),
            "HIGH" => Ok(AcquirePrecision::High),
            _ => Err(ToopError::invalid_argument(format!("unknown acquire precision: {}", s))),
        }
    }
}

/// Cassegrain rotator mode for ROTATOR
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum RotatorMode {
    Sky,
    Float,
    /// Fixed mount angle in degrees
    Mount(f64),
}

impl RotatorMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            RotatorMode::Sky => "SKY",
            RotatorMode::Float => "FLOAT",
            RotatorMode::Mount(_) => "MOUNT",
        }
    }
}

/// Autoguider state for AUTO
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AutoguiderState {
    On,
    Off,
}

impl AutoguiderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoguiderState::On => "ON",
            AutoguiderState::Off => "OFF",
        }
    }
}

impl From<bool> for AutoguiderState {
    fn from(on: bool) -> Self {
        if on {
            AutoguiderState::On
        } else {
            AutoguiderState::Off
        }
    }
}

impl fmt::Display for AutoguiderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `T`/`F` (or `true`/`false`) command line flag
pub fn parse_flag(s: &str) -> ToopResult<bool> {
    match s.to_ascii_lowercase().as_str() {
        "t" | "true" => Ok(true),
        "f" | "false" => Ok(false),
        _ => Err(ToopError::invalid_argument(format!("not a boolean flag: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_token() {
        assert!(is_token("SDSS-R"));
        assert!(!is_token(""));
        assert!(!is_token("SDSS R"));
        assert!(!is_token("4690.2\nQUIT"));
        assert_eq!(check_token("filter", "clear").unwrap(), "clear");
        assert!(matches!(
            check_token("filter", "a\tb"),
            Err(ToopError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(true), 'T');
        assert_eq!(flag(false), 'F');
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(2.0), "2.0");
        assert_eq!(format_decimal(-3.0), "-3.0");
        assert_eq!(format_decimal(0.0), "0.0");
        assert_eq!(format_decimal(1.25), "1.25");
        assert_eq!(format_decimal(-0.5), "-0.5");
        assert_eq!(format_decimal(12345678.0), "1.2345678E7");
        assert_eq!(format_decimal(10000000.0), "1.0E7");
        assert_eq!(format_decimal(0.0001), "1.0E-4");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("wcs".parse::<AcquireMode>().unwrap(), AcquireMode::Wcs);
        assert_eq!("HIGH".parse::<AcquirePrecision>().unwrap(), AcquirePrecision::High);
        assert!("sideways".parse::<AcquireMode>().is_err());
        assert_eq!(AutoguiderState::from(true).as_str(), "ON");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("T").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
