//! Agent configuration with validation.
//!
//! Loaded from a TOML file, then overridden from `AGENT_*` environment
//! variables, then validated once before the server starts. Everything here
//! is read-only after startup.

use crate::domain::request::QueryType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimum accepted envelope secret length in bytes
pub const MIN_SECRET_LEN: usize = shared_crypto::kdf::MIN_SECRET_LEN;

/// Environment variables that override file settings
pub mod env {
    pub const LISTEN_ADDRESS: &str = "AGENT_LISTEN_ADDRESS";
    pub const PORT: &str = "AGENT_PORT";
    pub const DEBUG: &str = "AGENT_DEBUG";
    pub const SECRET: &str = "AGENT_SECRET";
    pub const TLS_CERT: &str = "AGENT_TLS_CERT";
    pub const TLS_KEY: &str = "AGENT_TLS_KEY";
}

/// Main agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Bind address
    pub listen_address: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Verbose logging
    pub debug: bool,
    /// TLS identity
    pub tls: TlsConfig,
    /// Envelope scheme and key material
    pub envelope: EnvelopeConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// Command execution
    pub execution: ExecutionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            debug: false,
            tls: TlsConfig::default(),
            envelope: EnvelopeConfig::default(),
            limits: LimitsConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `AGENT_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::LISTEN_ADDRESS) {
            self.listen_address = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_override(env::LISTEN_ADDRESS, &value))?;
        }
        if let Some(value) = lookup(env::PORT) {
            self.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_override(env::PORT, &value))?;
        }
        if let Some(value) = lookup(env::DEBUG) {
            self.debug = parse_bool(&value)
                .ok_or_else(|| ConfigError::invalid_override(env::DEBUG, &value))?;
        }
        if let Some(value) = lookup(env::SECRET) {
            self.envelope.secret = Some(Secret::new(value));
        }
        if let Some(value) = lookup(env::TLS_CERT) {
            self.tls.cert_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::TLS_KEY) {
            self.tls.key_path = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        // Key material
        match &self.envelope.secret {
            None => return Err(ConfigError::MissingSecret),
            Some(secret) if secret.expose().len() < MIN_SECRET_LEN => {
                return Err(ConfigError::WeakSecret {
                    min: MIN_SECRET_LEN,
                    actual: secret.expose().len(),
                });
            }
            Some(_) => {}
        }

        if self.envelope.valid_duration.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "envelope.valid_duration cannot be 0".into(),
            ));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.execution.timeout.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "execution.timeout cannot be 0".into(),
            ));
        }

        for (name, command) in &self.execution.commands {
            if name.parse::<QueryType>().is_err() {
                return Err(ConfigError::InvalidCommand(format!(
                    "unknown query type `{}`",
                    name
                )));
            }
            if command.program.trim().is_empty() {
                return Err(ConfigError::InvalidCommand(format!(
                    "empty program for `{}`",
                    name
                )));
            }
        }

        if self.tls.cert_path.as_os_str().is_empty() || self.tls.key_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidTls(
                "cert_path and key_path are required".into(),
            ));
        }

        Ok(())
    }

    /// Get server bind address
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }
}

/// TLS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to PEM certificate chain
    pub cert_path: PathBuf,
    /// Path to PEM private key
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("agent_cert.pem"),
            key_path: PathBuf::from("agent_key.pem"),
        }
    }
}

/// Envelope scheme selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeScheme {
    /// HS256-signed JWT
    #[default]
    Jwt,
    /// XChaCha20-Poly1305 sealed token
    Sealed,
}

/// Envelope configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Token format
    pub scheme: EnvelopeScheme,
    /// Shared secret (>= 32 bytes). Usually supplied via `AGENT_SECRET`.
    pub secret: Option<Secret>,
    /// Lifetime of tokens this agent issues
    #[serde(with = "humantime_serde")]
    pub valid_duration: Duration,
    /// Clock skew tolerated when checking `nbf`/`exp`
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            scheme: EnvelopeScheme::Jwt,
            secret: None,
            valid_duration: Duration::from_secs(60),
            leeway: Duration::ZERO,
        }
    }
}

/// Shared secret. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("<redacted>")
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 64KB)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 64 * 1024,
        }
    }
}

/// Command template for one query type.
///
/// `{target}`, `{vrf}` and `{source}` are substituted inside each argument.
/// `source_args` are prepended only when the request carries a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub source_args: Vec<String>,
}

impl CommandTemplate {
    fn new(program: &str, args: &[&str], source_args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            source_args: source_args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Per-command timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Command templates keyed by query type name
    pub commands: BTreeMap<String, CommandTemplate>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        let mut commands = BTreeMap::new();
        commands.insert(
            QueryType::Ping.as_str().to_string(),
            CommandTemplate::new("ping", &["-c", "5", "-w", "5", "{target}"], &["-I", "{source}"]),
        );
        commands.insert(
            QueryType::Traceroute.as_str().to_string(),
            CommandTemplate::new(
                "traceroute",
                &["-w", "1", "-q", "1", "{target}"],
                &["-s", "{source}"],
            ),
        );

        Self {
            timeout: Duration::from_secs(30),
            commands,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },
    /// TOML parsing error
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Environment override could not be parsed
    #[error("invalid value for {var}: {value:?}")]
    InvalidOverride { var: String, value: String },
    /// Port 0
    #[error("port cannot be 0")]
    InvalidPort,
    /// No envelope secret configured
    #[error("envelope secret is not set (config envelope.secret or AGENT_SECRET)")]
    MissingSecret,
    /// Envelope secret too short
    #[error("envelope secret must be at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid duration value
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    /// Invalid command template
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    /// Invalid TLS settings
    #[error("invalid TLS configuration: {0}")]
    InvalidTls(String),
}

impl ConfigError {
    fn invalid_override(var: &str, value: &str) -> Self {
        ConfigError::InvalidOverride {
            var: var.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
