//! # Envelope Tampering
//!
//! Attacker flips bits in captured tokens, replays expired ones, swaps in
//! tokens minted under another key, or downgrades the scheme. Every attempt
//! must be rejected before the collaborator runs.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use axum::http::StatusCode;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use relay_gateway::domain::config::Secret;
    use relay_gateway::{build_codec, EnvelopeScheme};
    use serde_json::json;
    use std::sync::Arc;

    fn ping() -> serde_json::Value {
        json!({"query_type": "ping", "target": "192.0.2.33"})
    }

    #[tokio::test]
    async fn test_sealed_bit_flips_never_reach_executor() {
        let executor = Arc::new(EchoExecutor::default());
        let harness = Harness::new(EnvelopeScheme::Sealed, executor.clone());
        let raw = URL_SAFE_NO_PAD.decode(harness.token(&ping())).unwrap();

        // One flip per byte keeps the test fast; bit position rotates.
        for byte in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[byte] ^= 1 << (byte % 8);
            let (status, _) = harness
                .post_token(&URL_SAFE_NO_PAD.encode(&tampered))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "byte {}", byte);
        }
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_jwt_char_substitutions_never_reach_executor() {
        let executor = Arc::new(EchoExecutor::default());
        let harness = Harness::new(EnvelopeScheme::Jwt, executor.clone());
        let token = harness.token(&ping());

        for (i, c) in token.char_indices().filter(|(_, c)| *c != '.') {
            let mut tampered = token.clone();
            let replacement = if c == 'Q' { 'R' } else { 'Q' };
            tampered.replace_range(i..i + 1, &replacement.to_string());
            let (status, _) = harness.post_token(&tampered).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "index {}", i);
        }
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        for scheme in [EnvelopeScheme::Jwt, EnvelopeScheme::Sealed] {
            let executor = Arc::new(EchoExecutor::default());
            let harness = Harness::new(scheme, executor.clone());
            let token = harness.token(&ping());

            harness.clock.advance(61);

            let (status, _) = harness.post_token(&token).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(executor.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_token_from_other_key_rejected() {
        for scheme in [EnvelopeScheme::Jwt, EnvelopeScheme::Sealed] {
            let executor = Arc::new(EchoExecutor::default());
            let harness = Harness::new(scheme, executor.clone());

            let mut forged = config(scheme).envelope;
            forged.secret = Some(Secret::new("attacker-controlled-secret-00000"));
            let forger = build_codec(&forged, harness.clock.clone()).unwrap();

            let (status, _) = harness.post_token(&forger.encode(&ping()).unwrap()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(executor.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_unsigned_jwt_rejected() {
        let executor = Arc::new(EchoExecutor::default());
        let harness = Harness::new(EnvelopeScheme::Jwt, executor.clone());

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            json!({"payload": ping(), "exp": NOW + 60}).to_string(),
        );
        let token = format!("{}.{}.", header, claims);

        let (status, _) = harness.post_token(&token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_scheme_confusion_rejected() {
        let executor = Arc::new(EchoExecutor::default());
        let sealed = Harness::new(EnvelopeScheme::Sealed, executor.clone());
        let jwt = Harness::new(EnvelopeScheme::Jwt, Arc::new(EchoExecutor::default()));

        let (status, _) = sealed.post_token(&jwt.token(&ping())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(executor.calls(), 0);
    }
}
