//! toop - command line client for a Telescope Operations Control System
//!
//! Sends one TOC command, or the scripted observation sequence, using the
//! session data file named on the command line.

pub mod args;
pub mod run;

pub use args::*;
pub use run::*;
