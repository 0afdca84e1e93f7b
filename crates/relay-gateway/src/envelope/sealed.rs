//! Sealed (encrypted) envelope.
//!
//! Token layout before base64url (no padding):
//!
//! ```text
//! +---------+-----------+---------------------------+
//! | version | nonce     | ciphertext || tag         |
//! | 1 byte  | 24 bytes  | n + 16 bytes              |
//! +---------+-----------+---------------------------+
//! ```
//!
//! The plaintext is the JSON claim set. The version byte is bound as
//! associated data. The cipher key is derived from the configured secret so
//! the same secret never keys two different schemes.

use super::{check_secret_len, Claims, ClaimsPolicy, EnvelopeCodec, EnvelopeError};
use crate::domain::config::EnvelopeScheme;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use shared_crypto::{derive_key, open, seal, Nonce, SecretKey, NONCE_LEN};

/// Current token format
pub const SEALED_VERSION: u8 = 1;

const KEY_CONTEXT: &[u8] = b"glass-relay/envelope/sealed/v1";
const TAG_LEN: usize = 16;

/// XChaCha20-Poly1305 codec
pub struct SealedCodec {
    key: SecretKey,
    policy: ClaimsPolicy,
}

impl SealedCodec {
    pub fn new(secret: &[u8], policy: ClaimsPolicy) -> Result<Self, EnvelopeError> {
        check_secret_len(secret)?;
        let key = derive_key(secret, KEY_CONTEXT).map_err(|e| EnvelopeError::Key(e.to_string()))?;
        Ok(Self { key, policy })
    }
}

impl EnvelopeCodec for SealedCodec {
    fn encode(&self, value: &Value) -> Result<String, EnvelopeError> {
        let claims = self.policy.issue(value.clone());
        let plaintext =
            serde_json::to_vec(&claims).map_err(|e| EnvelopeError::Produce(e.to_string()))?;

        let (ciphertext, nonce) = seal(&self.key, &plaintext, &[SEALED_VERSION])
            .map_err(|e| EnvelopeError::Produce(e.to_string()))?;

        let mut raw = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        raw.push(SEALED_VERSION);
        raw.extend_from_slice(nonce.as_bytes());
        raw.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    fn decode(&self, token: &str) -> Result<Value, EnvelopeError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| EnvelopeError::Encoding(e.to_string()))?;

        if raw.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(EnvelopeError::Encoding(format!(
                "token too short ({} bytes)",
                raw.len()
            )));
        }

        let (version, rest) = raw.split_at(1);
        if version[0] != SEALED_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(version[0]));
        }

        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce).map_err(|e| EnvelopeError::Encoding(e.to_string()))?;

        let plaintext = open(&self.key, ciphertext, &nonce, &[SEALED_VERSION])
            .map_err(|_| EnvelopeError::Signature)?;

        let claims: Claims =
            serde_json::from_slice(&plaintext).map_err(|e| EnvelopeError::Claims(e.to_string()))?;
        self.policy.check(&claims)?;
        Ok(claims.payload)
    }

    fn scheme(&self) -> EnvelopeScheme {
        EnvelopeScheme::Sealed
    }
}
