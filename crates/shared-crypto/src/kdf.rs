//! Key derivation from the process-wide shared secret.
//!
//! The relay is configured with one shared secret. Purpose-specific keys are
//! derived from it as `HMAC-SHA256(secret, context)` so that the same secret
//! never keys two different primitives directly.

use crate::symmetric::{SecretKey, KEY_LEN};
use crate::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted shared secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Derive a 256-bit key for `context` from `secret`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyLength` if `secret` is shorter than
/// [`MIN_SECRET_LEN`].
pub fn derive_key(secret: &[u8], context: &[u8]) -> Result<SecretKey, CryptoError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: MIN_SECRET_LEN,
            actual: secret.len(),
        });
    }

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| CryptoError::InvalidKeyLength {
        expected: MIN_SECRET_LEN,
        actual: secret.len(),
    })?;
    mac.update(context);

    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&mac.finalize().into_bytes());
    Ok(SecretKey::from_bytes(bytes))
}
