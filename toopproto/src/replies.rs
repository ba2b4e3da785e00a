//! Typed results extracted from successful TOCS replies

use serde::{Deserialize, Serialize};
use crate::error::{ToopError, ToopResult};

/// HELO results: the new session and its allowance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeloReply {
    pub session_id: String,
    /// Session limit in seconds
    pub session_limit: i32,
    /// Time remaining in seconds
    pub time_remaining: i32,
    pub priority: i32,
}

/// EXPOSE results: files written plus the pipeline's measurements
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExposeReply {
    pub filenames: Vec<String>,
    pub seeing: f64,
    pub counts: i32,
    pub photometric: f64,
    pub sky_brightness: f64,
    pub x_pix: f64,
    pub y_pix: f64,
}

/// POSITION results for a target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionReply {
    /// Degrees
    pub altitude: f64,
    /// Degrees
    pub azimuth: f64,
    /// Seconds until the target rises
    pub time_to_rise: i32,
    /// Seconds until the target sets
    pub time_to_set: i32,
    /// Degrees
    pub moon_distance: f64,
    pub category: String,
    /// `RISEN` or `SET`
    pub state: String,
}

impl PositionReply {
    pub const STATE_RISEN: &'static str = "RISEN";
    pub const STATE_SET: &'static str = "SET";

    pub fn is_risen(&self) -> bool {
        self.state == Self::STATE_RISEN
    }
}

/// WHEN results: how long until the service can run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhenReply {
    /// Seconds
    pub time: i32,
    pub current_service: String,
}

/// STATUS result: one keyword's value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReply {
    pub keyword: String,
    pub value: String,
}

impl StatusReply {
    pub fn value_int(&self) -> ToopResult<i32> {
        self.value.trim().parse().map_err(|_| {
            ToopError::parse(format!("status {} value {} is not an integer", self.keyword, self.value))
        })
    }

    pub fn value_double(&self) -> ToopResult<f64> {
        self.value.trim().parse().map_err(|_| {
            ToopError::parse(format!("status {} value {} is not a double", self.keyword, self.value))
        })
    }
}
