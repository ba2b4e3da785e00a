//! Error definitions for TOOP

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the client reports for failures that never reached the TOCS
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

/// TOOP error types
#[derive(Error, Debug)]
pub enum ToopError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session data error: {0}")]
    SessionData(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{command} failed:{failure}")]
    Command {
        command: String,
        failure: CommandFailure,
    },
}

impl ToopError {
    pub fn parse(msg: impl Into<String>) -> Self {
        ToopError::Parse(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ToopError::InvalidArgument(msg.into())
    }

    pub fn session_data(msg: impl Into<String>) -> Self {
        ToopError::SessionData(msg.into())
    }

    /// The failure details if this error came from a failed command
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            ToopError::Command { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias for TOOP operations
pub type ToopResult<T> = Result<T, ToopError>;

/// Where in the exchange a command failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    /// Refused locally before anything was sent
    Rejected,
    /// Connection, write or read failure
    Transport,
    /// The TOCS answered with an ERROR reply
    Protocol,
    /// The reply could not be understood or lacked expected values
    Parse,
}

/// Why a single command did not succeed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandFailure {
    pub kind: FailureKind,
    pub code: Option<String>,
    pub message: String,
}

impl CommandFailure {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            code: None,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            code: Some(INTERNAL_ERROR_CODE.to_string()),
            message: message.into(),
        }
    }

    pub fn protocol(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Protocol,
            code,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Parse,
            code: None,
            message: message.into(),
        }
    }

    /// `code:message`, or just the message when no code is known
    pub fn error_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}:{}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
