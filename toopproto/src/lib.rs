//! TOOP protocol library (toopproto)
//!
//! Definitions shared by everything that talks to a Telescope Operations
//! Control System: the reply grammar, command descriptors, instrument
//! configurations and the session data they read and update.

pub mod error;
pub mod protocol;
pub mod types;
pub mod astrometry;
pub mod session_data;
pub mod instrument;
pub mod replies;
pub mod commands;

pub use error::*;
pub use protocol::*;
pub use types::*;
pub use astrometry::*;
pub use session_data::{keys, SessionData, ROOT_KEY};
pub use instrument::*;
pub use replies::*;
pub use commands::*;
