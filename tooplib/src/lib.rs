//! TOOP client library (tooplib)
//!
//! This library provides the client side of the TOC protocol: the socket
//! transport, the generic command executor and a session API with one method
//! per command.

pub mod client;
pub mod config;
pub mod connection;
pub mod session;

pub use client::*;
pub use config::*;
pub use connection::*;
pub use session::*;
pub use toopproto::*;
