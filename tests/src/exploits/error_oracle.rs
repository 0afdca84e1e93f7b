//! # Error Oracle
//!
//! An attacker probing the endpoint must not learn why an envelope was
//! rejected. Tampered, expired, foreign-key, truncated and garbage tokens all
//! produce byte-identical responses. Collaborator panics must not leak either.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use relay_gateway::domain::config::Secret;
    use relay_gateway::domain::error::messages;
    use relay_gateway::{
        build_codec, AgentError, EnvelopeScheme, QueryExecutor, QueryResult, Request,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn envelope_failures(scheme: EnvelopeScheme) -> Vec<(StatusCode, Value)> {
        let harness = Harness::new(scheme, Arc::new(EchoExecutor::default()));
        let payload = json!({"query_type": "ping", "target": "192.0.2.50"});
        let valid = harness.token(&payload);

        let mut tampered = valid.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let truncated = valid[..valid.len() / 2].to_string();

        let mut foreign = config(scheme).envelope;
        foreign.secret = Some(Secret::new("some-other-deployment-secret-000"));
        let foreign = build_codec(&foreign, harness.clock.clone())
            .unwrap()
            .encode(&payload)
            .unwrap();

        let not_structured = harness.token(&json!("plain text, not json"));

        let mut responses = Vec::new();
        for token in [&tampered, &truncated, &foreign, &not_structured] {
            responses.push(harness.post_token(token).await);
        }
        responses.push(harness.post_token("garbage").await);
        responses.push(harness.post_token("").await);

        harness.clock.advance(3_600);
        responses.push(harness.post_token(&valid).await);

        responses
    }

    #[tokio::test]
    async fn test_all_envelope_failures_look_identical() {
        for scheme in [EnvelopeScheme::Jwt, EnvelopeScheme::Sealed] {
            let responses = envelope_failures(scheme).await;
            let expected = (
                StatusCode::BAD_REQUEST,
                json!({"error": messages::MALFORMED_ENVELOPE}),
            );
            for (i, response) in responses.iter().enumerate() {
                assert_eq!(response, &expected, "{:?} case {}", scheme, i);
            }
        }
    }

    struct LeakyPanic;

    #[async_trait]
    impl QueryExecutor for LeakyPanic {
        async fn execute(&self, _request: &Request) -> Result<QueryResult, AgentError> {
            panic!("ssh password for core-router-1 is hunter2");
        }
    }

    #[tokio::test]
    async fn test_collaborator_panic_is_generic_500() {
        let harness = Harness::new(EnvelopeScheme::Jwt, Arc::new(LeakyPanic));

        let (status, body) = harness
            .query(&json!({"query_type": "ping", "target": "192.0.2.1"}))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&body), messages::INTERNAL);
        assert!(!body.to_string().contains("hunter2"));
    }
}
