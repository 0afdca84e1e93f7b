//! Envelope codec.
//!
//! Turns a structured value into an opaque transport token and back.
//!
//! ## Claims
//!
//! Both schemes carry the same claim set:
//!
//! ```text
//! { "payload": <value>, "iat": <secs>, "nbf": <secs>, "exp": <secs> }
//! ```
//!
//! `exp` is mandatory on decode; `iat` and `nbf` are optional so tokens from
//! minimal signers are accepted.
//!
//! ## Failure reporting
//!
//! [`EnvelopeError`] distinguishes sub-cases for logs only. Callers on the
//! request path must collapse every variant into one generic client error.

pub mod jwt;
pub mod sealed;

pub use jwt::JwtCodec;
pub use sealed::SealedCodec;

use crate::domain::config::{EnvelopeConfig, EnvelopeScheme};
use crate::domain::error::GatewayError;
use crate::ports::TimeSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Signs and/or encrypts structured values into transport tokens.
pub trait EnvelopeCodec: Send + Sync {
    /// Wrap `value` into a token.
    ///
    /// Fails only on a keying or serialization fault.
    fn encode(&self, value: &Value) -> Result<String, EnvelopeError>;

    /// Verify `token` and return the payload it carries.
    fn decode(&self, token: &str) -> Result<Value, EnvelopeError>;

    /// Scheme implemented by this codec
    fn scheme(&self) -> EnvelopeScheme;
}

/// Envelope failures. Internal detail only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// Token is not well-formed (base64, segments, length)
    #[error("bad token encoding: {0}")]
    Encoding(String),
    /// Signature or AEAD tag did not verify
    #[error("signature verification failed")]
    Signature,
    /// Token past `exp`
    #[error("token expired (exp {exp}, now {now})")]
    Expired { exp: u64, now: u64 },
    /// Token before `nbf`
    #[error("token not yet valid (nbf {nbf}, now {now})")]
    NotYetValid { nbf: u64, now: u64 },
    /// Claims missing, mistyped, or payload not structured data
    #[error("bad claims: {0}")]
    Claims(String),
    /// Sealed token version byte not understood
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),
    /// Encoding side failure
    #[error("failed to produce token: {0}")]
    Produce(String),
    /// Key material unusable
    #[error("key material: {0}")]
    Key(String),
}

/// Claim set carried by every envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    pub exp: u64,
}

/// Issues and checks the time-bounded claims.
#[derive(Clone)]
pub struct ClaimsPolicy {
    valid_duration: u64,
    leeway: u64,
    clock: Arc<dyn TimeSource>,
}

impl ClaimsPolicy {
    pub fn new(valid_duration: Duration, leeway: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            valid_duration: valid_duration.as_secs().max(1),
            leeway: leeway.as_secs(),
            clock,
        }
    }

    /// Claims for a fresh token
    pub fn issue(&self, payload: Value) -> Claims {
        let now = self.clock.now();
        Claims {
            payload,
            iat: Some(now),
            nbf: Some(now),
            exp: now.saturating_add(self.valid_duration),
        }
    }

    /// Check `nbf`/`exp` against the clock
    pub fn check(&self, claims: &Claims) -> Result<(), EnvelopeError> {
        let now = self.clock.now();

        if now >= claims.exp.saturating_add(self.leeway) {
            return Err(EnvelopeError::Expired {
                exp: claims.exp,
                now,
            });
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(self.leeway) {
                return Err(EnvelopeError::NotYetValid { nbf, now });
            }
        }

        Ok(())
    }
}

/// Build the configured codec.
///
/// Missing or unusable key material is a startup failure.
pub fn build_codec(
    config: &EnvelopeConfig,
    clock: Arc<dyn TimeSource>,
) -> Result<Arc<dyn EnvelopeCodec>, GatewayError> {
    let secret = config
        .secret
        .as_ref()
        .ok_or_else(|| GatewayError::KeyMaterial("envelope secret is not set".into()))?;
    let policy = ClaimsPolicy::new(config.valid_duration, config.leeway, clock);

    let codec: Arc<dyn EnvelopeCodec> = match config.scheme {
        EnvelopeScheme::Jwt => Arc::new(
            JwtCodec::new(secret.expose(), policy)
                .map_err(|e| GatewayError::KeyMaterial(e.to_string()))?,
        ),
        EnvelopeScheme::Sealed => Arc::new(
            SealedCodec::new(secret.expose(), policy)
                .map_err(|e| GatewayError::KeyMaterial(e.to_string()))?,
        ),
    };
    Ok(codec)
}

/// Structural parse of a decoded payload.
///
/// Front-ends commonly serialize the query to a JSON string before signing
/// it; such strings are parsed here. The result must be an object or array.
pub fn into_structured(payload: Value) -> Result<Value, EnvelopeError> {
    let value = match payload {
        Value::String(raw) => serde_json::from_str::<Value>(&raw)
            .map_err(|e| EnvelopeError::Claims(format!("payload string is not JSON: {}", e)))?,
        other => other,
    };

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(EnvelopeError::Claims(
            "payload is not structured data".into(),
        )),
    }
}

fn check_secret_len(secret: &[u8]) -> Result<(), EnvelopeError> {
    if secret.len() < shared_crypto::kdf::MIN_SECRET_LEN {
        return Err(EnvelopeError::Key(format!(
            "secret must be at least {} bytes, got {}",
            shared_crypto::kdf::MIN_SECRET_LEN,
            secret.len()
        )));
    }
    Ok(())
}
