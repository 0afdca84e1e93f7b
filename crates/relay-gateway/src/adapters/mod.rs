//! Adapters for the relay.
//!
//! Infrastructure implementations: the command-running executor and the
//! error-to-HTTP conversions.

pub mod command;
pub mod error_conversions;

pub use command::CommandExecutor;
