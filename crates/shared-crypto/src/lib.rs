//! # Shared Crypto - Envelope Primitives
//!
//! Cryptographic building blocks used by the relay's envelope codec.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Sealed envelopes |
//! | `kdf` | HMAC-SHA256 | Deriving AEAD keys from the shared secret |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit random nonce, constant-time, side-channel immune
//! - **Poly1305**: any modified byte of nonce, ciphertext or associated data
//!   fails authentication
//! - **Key material** is zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod kdf;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use kdf::derive_key;
pub use symmetric::{open, seal, Nonce, SecretKey, KEY_LEN, NONCE_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
