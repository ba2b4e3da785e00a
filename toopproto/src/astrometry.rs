//! Right ascension and declination values in sexagesimal notation

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{ToopError, ToopResult};

const SECONDS_PER_DAY: f64 = 86_400.0;
const ARCSEC_PER_QUARTER_TURN: f64 = 324_000.0;

/// Split `AA:BB:CC.cc` (or whitespace separated) into its three fields
fn split_fields<'a>(s: &'a str, what: &str) -> ToopResult<(&'a str, &'a str, &'a str)> {
    let fields: Vec<&str> = s
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();
    match fields.as_slice() {
        [a, b, c] => Ok((*a, *b, *c)),
        _ => Err(ToopError::invalid_argument(format!(
            "{} must have three colon separated fields: {}",
            what, s
        ))),
    }
}

fn parse_field<T: FromStr>(field: &str, what: &str, whole: &str) -> ToopResult<T> {
    field.parse::<T>().map_err(|_| {
        ToopError::invalid_argument(format!("bad {} field {} in {}", what, field, whole))
    })
}

/// Write hundredths of a unit as `AA:BB:CC.cc`
fn write_sexagesimal(f: &mut fmt::Formatter<'_>, centi: u64) -> fmt::Result {
    let major = centi / 360_000;
    let minutes = (centi / 6_000) % 60;
    let seconds = (centi / 100) % 60;
    let hundredths = centi % 100;
    write!(f, "{:02}:{:02}:{:02}.{:02}", major, minutes, seconds, hundredths)
}

/// Right ascension, held as seconds of time in `[0, 86400)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Ra {
    seconds: f64,
}

impl Ra {
    pub fn from_hms(hours: u32, minutes: u32, seconds: f64) -> ToopResult<Self> {
        if hours > 23 || minutes > 59 || !(0.0..60.0).contains(&seconds) {
            return Err(ToopError::invalid_argument(format!(
                "RA {}:{}:{} out of range",
                hours, minutes, seconds
            )));
        }
        Ok(Self {
            seconds: f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds,
        })
    }

    /// Seconds of time since 0h
    pub fn total_seconds(&self) -> f64 {
        self.seconds
    }

    pub fn to_degrees(&self) -> f64 {
        self.seconds / 240.0
    }
}

impl FromStr for Ra {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        let (h, m, sec) = split_fields(s.trim(), "RA")?;
        Ra::from_hms(
            parse_field(h, "hours", s)?,
            parse_field(m, "minutes", s)?,
            parse_field(sec, "seconds", s)?,
        )
    }
}

impl fmt::Display for Ra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = (SECONDS_PER_DAY * 100.0) as u64;
        let centi = (self.seconds * 100.0).round() as u64 % day;
        write_sexagesimal(f, centi)
    }
}

/// Declination, held as signed arcseconds in `[-324000, 324000]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dec {
    arcseconds: f64,
}

impl Dec {
    pub fn from_dms(negative: bool, degrees: u32, minutes: u32, seconds: f64) -> ToopResult<Self> {
        let magnitude = f64::from(degrees) * 3600.0 + f64::from(minutes) * 60.0 + seconds;
        if minutes > 59 || !(0.0..60.0).contains(&seconds) || magnitude > ARCSEC_PER_QUARTER_TURN {
            return Err(ToopError::invalid_argument(format!(
                "Dec {}{}:{}:{} out of range",
                if negative { "-" } else { "+" },
                degrees,
                minutes,
                seconds
            )));
        }
        Ok(Self {
            arcseconds: if negative { -magnitude } else { magnitude },
        })
    }

    pub fn total_arcseconds(&self) -> f64 {
        self.arcseconds
    }

    pub fn to_degrees(&self) -> f64 {
        self.arcseconds / 3600.0
    }
}

impl FromStr for Dec {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (d, m, sec) = split_fields(unsigned, "Dec")?;
        Dec::from_dms(
            negative,
            parse_field(d, "degrees", s)?,
            parse_field(m, "minutes", s)?,
            parse_field(sec, "seconds", s)?,
        )
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centi = (self.arcseconds.abs() * 100.0).round() as u64;
        let sign = if self.arcseconds < 0.0 && centi > 0 { '-' } else { '+' };
        write!(f, "{}", sign)?;
        write_sexagesimal(f, centi)
    }
}
