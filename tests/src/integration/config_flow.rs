//! # Configuration Flow Tests
//!
//! Config file → environment overrides → validation → running router.

#[cfg(test)]
mod tests {
    use crate::support::*;
    use axum::http::StatusCode;
    use relay_gateway::domain::config::env;
    use relay_gateway::{AgentConfig, ConfigError, EnvelopeScheme, GatewayError, RelayService};
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_sealed_scheme_from_file_serves_queries() {
        let file = write_config(&format!(
            r#"
port = 9443

[envelope]
scheme = "sealed"
secret = "{}"
valid_duration = "2m"
"#,
            SECRET
        ));

        let config = AgentConfig::load(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.envelope.scheme, EnvelopeScheme::Sealed);
        assert_eq!(config.envelope.valid_duration, Duration::from_secs(120));

        let harness = Harness::with_config(config, Arc::new(EchoExecutor::default()));
        let (status, result) = harness
            .query(&json!({"query_type": "ping", "target": "198.51.100.4"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["target"], "198.51.100.4");
    }

    #[test]
    fn test_env_secret_overrides_file() {
        let file = write_config(
            r#"
[envelope]
secret = "too-short"
"#,
        );
        let mut config = AgentConfig::load(file.path()).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeakSecret { min: 32, actual: 9 })
        ));

        let vars = HashMap::from([
            (env::SECRET, SECRET.to_string()),
            (env::PORT, "8443".to_string()),
            (env::DEBUG, "true".to_string()),
        ]);
        config
            .apply_overrides(|key| vars.get(key).cloned())
            .unwrap();

        config.validate().unwrap();
        assert_eq!(config.port, 8443);
        assert!(config.debug);
    }

    #[test]
    fn test_defaults_require_secret() {
        assert!(matches!(
            AgentConfig::default().validate(),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            RelayService::new(AgentConfig::default(), Arc::new(EchoExecutor::default())),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_command_key_rejected() {
        let file = write_config(&format!(
            r#"
[envelope]
secret = "{}"

[execution.commands.whois]
program = "whois"
args = ["{{target}}"]
"#,
            SECRET
        ));
        let config = AgentConfig::load(file.path()).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_secret_not_leaked_in_debug_output() {
        let config = config(EnvelopeScheme::Jwt);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(SECRET));
    }
}
