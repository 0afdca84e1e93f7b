//! HS256 JWT envelope.
//!
//! Compatible with front-ends that sign `{payload, iat, nbf, exp}` with a
//! shared secret. The time claims are checked by [`ClaimsPolicy`] against the
//! injected clock rather than by `jsonwebtoken`, so tests control time.

use super::{check_secret_len, Claims, ClaimsPolicy, EnvelopeCodec, EnvelopeError};
use crate::domain::config::EnvelopeScheme;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use std::collections::HashSet;

/// JWT codec over a shared HMAC secret
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    policy: ClaimsPolicy,
}

impl JwtCodec {
    pub fn new(secret: &[u8], policy: ClaimsPolicy) -> Result<Self, EnvelopeError> {
        check_secret_len(secret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            policy,
        })
    }
}

impl EnvelopeCodec for JwtCodec {
    fn encode(&self, value: &Value) -> Result<String, EnvelopeError> {
        let claims = self.policy.issue(value.clone());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| EnvelopeError::Produce(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<Value, EnvelopeError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(&e))?;
        self.policy.check(&data.claims)?;
        Ok(data.claims.payload)
    }

    fn scheme(&self) -> EnvelopeScheme {
        EnvelopeScheme::Jwt
    }
}

fn classify(err: &jsonwebtoken::errors::Error) -> EnvelopeError {
    match err.kind() {
        JwtErrorKind::InvalidSignature => EnvelopeError::Signature,
        JwtErrorKind::MissingRequiredClaim(claim) => {
            EnvelopeError::Claims(format!("missing claim `{}`", claim))
        }
        JwtErrorKind::Json(e) => EnvelopeError::Claims(e.to_string()),
        _ => EnvelopeError::Encoding(err.to_string()),
    }
}
