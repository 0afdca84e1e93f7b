//! Attack simulations against the relay endpoint.
//!
//! Each module plays an attacker who can see and modify traffic but does not
//! hold the envelope secret.

pub mod envelope_tamper;
pub mod error_oracle;
