//! TOML Configuration File Support
//!
//! Configuration loading for nutri-chat surfaces, backed by a TOML file at
//! `~/.config/nutri-chat/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/nutri-chat/config.toml` (typically `~/.config/nutri-chat/config.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [answer_service]
//! host = "127.0.0.1"
//! port = 8009
//! timeout_secs = 120
//!
//! [registration_service]
//! host = "127.0.0.1"
//! port = 8056
//!
//! [chat]
//! skip_signup = false
//! ```
//!
//! # Environment
//!
//! | Variable                     | Overrides                        |
//! |------------------------------|----------------------------------|
//! | `NUTRI_ANSWER_HOST`          | `answer_service.host`            |
//! | `NUTRI_ANSWER_PORT`          | `answer_service.port`            |
//! | `NUTRI_ANSWER_TIMEOUT_SECS`  | `answer_service.timeout_secs`    |
//! | `NUTRI_REGISTER_HOST`        | `registration_service.host`      |
//! | `NUTRI_REGISTER_PORT`        | `registration_service.port`      |
//! | `NUTRI_SKIP_SIGNUP`          | `chat.skip_signup`               |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ServiceEndpoint;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// One service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Host name or address
    pub host: Option<String>,

    /// Port number
    pub port: Option<u16>,

    /// Per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: Option<u64>,
}

/// Chat section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Start on the chat screen instead of the signup form
    pub skip_signup: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Answer service section
    pub answer_service: ServiceToml,

    /// Registration service section
    pub registration_service: ServiceToml,

    /// Chat section
    pub chat: ChatToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration for a nutri-chat surface
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Where the answer service lives
    pub answer: ServiceEndpoint,

    /// Where the registration service lives
    pub registration: ServiceEndpoint,

    /// Start on the chat screen instead of the signup form
    pub skip_signup: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            answer: ServiceEndpoint::answer_default(),
            registration: ServiceEndpoint::registration_default(),
            skip_signup: false,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check that both endpoints are usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty host or a zero port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("answer_service", &self.answer),
            ("registration_service", &self.registration),
        ] {
            if endpoint.host.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.host must not be empty"
                )));
            }
            if endpoint.port == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.port must not be 0"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/nutri-chat/config.toml` or
/// `~/.config/nutri-chat/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("nutri-chat").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI arguments are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// result fails validation. A missing config file is not an error.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ClientToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_service_toml(endpoint: &mut ServiceEndpoint, toml: &ServiceToml) {
    if let Some(ref host) = toml.host {
        endpoint.host = host.clone();
    }
    if let Some(port) = toml.port {
        endpoint.port = port;
    }
    if let Some(secs) = toml.timeout_secs {
        endpoint.timeout = timeout_from_secs(secs);
    }
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) {
    apply_service_toml(&mut config.answer, &toml.answer_service);
    apply_service_toml(&mut config.registration, &toml.registration_service);

    if let Some(skip) = toml.chat.skip_signup {
        config.skip_signup = skip;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut ClientConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("NUTRI_ANSWER_HOST") {
        config.answer.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("NUTRI_ANSWER_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.answer.port = p;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(timeout) = env("NUTRI_ANSWER_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.answer.timeout = timeout_from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(host) = env("NUTRI_REGISTER_HOST") {
        config.registration.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("NUTRI_REGISTER_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.registration.port = p;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(skip) = env("NUTRI_SKIP_SIGNUP") {
        config.skip_signup = skip != "0" && skip.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Answer service host override
    pub answer_host: Option<String>,

    /// Answer service port override
    pub answer_port: Option<u16>,

    /// Registration service host override
    pub register_host: Option<String>,

    /// Registration service port override
    pub register_port: Option<u16>,

    /// Skip-signup override
    pub skip_signup: Option<bool>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set answer service host override
    #[must_use]
    pub fn with_answer_host(mut self, host: String) -> Self {
        self.answer_host = Some(host);
        self
    }

    /// Set answer service port override
    #[must_use]
    pub fn with_answer_port(mut self, port: u16) -> Self {
        self.answer_port = Some(port);
        self
    }

    /// Set registration service host override
    #[must_use]
    pub fn with_register_host(mut self, host: String) -> Self {
        self.register_host = Some(host);
        self
    }

    /// Set registration service port override
    #[must_use]
    pub fn with_register_port(mut self, port: u16) -> Self {
        self.register_port = Some(port);
        self
    }

    /// Set skip-signup override
    #[must_use]
    pub fn with_skip_signup(mut self, skip: bool) -> Self {
        self.skip_signup = Some(skip);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the result is unusable.
    pub fn apply(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        if self.answer_host.is_some()
            || self.answer_port.is_some()
            || self.register_host.is_some()
            || self.register_port.is_some()
            || self.skip_signup.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref host) = self.answer_host {
            config.answer.host = host.clone();
        }
        if let Some(port) = self.answer_port {
            config.answer.port = port;
        }
        if let Some(ref host) = self.register_host {
            config.registration.host = host.clone();
        }
        if let Some(port) = self.register_port {
            config.registration.port = port;
        }
        if let Some(skip) = self.skip_signup {
            config.skip_signup = skip;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert_eq!(config.answer.base_url(), "http://127.0.0.1:8009");
        assert_eq!(config.registration.base_url(), "http://127.0.0.1:8056");
        assert_eq!(config.answer.timeout, None);
        assert!(!config.skip_signup);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("nutri-chat"));
            assert!(p.to_string_lossy().ends_with("config.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = toml_file(
            r#"
[answer_service]
host = "answers.local"
port = 9009
timeout_secs = 30

[registration_service]
host = "accounts.local"
port = 9056

[chat]
skip_signup = true
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.answer.base_url(), "http://answers.local:9009");
        assert_eq!(config.answer.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.registration.base_url(), "http://accounts.local:9056");
        assert_eq!(config.registration.timeout, None);
        assert!(config.skip_signup);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = toml_file(
            r#"
[answer_service]
port = 7000
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.answer.base_url(), "http://127.0.0.1:7000");
        assert_eq!(config.registration, ServiceEndpoint::registration_default());
        assert!(!config.skip_signup);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let file = toml_file("[answer_service]\ntimeout_secs = 0\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.answer.timeout, None);
    }

    // =========================================================================
    // Missing File Handling Tests
    // =========================================================================

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.config_file_path, None);
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let config = load_config_with_env(None, no_env).unwrap();
        assert_eq!(config.answer, ServiceEndpoint::answer_default());
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Malformed / Invalid Tests
    // =========================================================================

    #[test]
    fn test_malformed_toml_error() {
        let file = toml_file(
            r#"
[answer_service
port = "not a number"
"#,
        );

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_zero_port_rejected() {
        let file = toml_file("[registration_service]\nport = 0\n");

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("registration_service.port"));
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = load_config_with_env(None, env_from(&[("NUTRI_ANSWER_HOST", "  ")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file(
            r#"
[answer_service]
host = "file-host"
port = 9000

[chat]
skip_signup = true
"#,
        );

        let env = env_from(&[
            ("NUTRI_ANSWER_PORT", "9100"),
            ("NUTRI_ANSWER_TIMEOUT_SECS", "5"),
            ("NUTRI_REGISTER_HOST", "env-accounts"),
            ("NUTRI_SKIP_SIGNUP", "false"),
        ]);
        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();

        assert_eq!(config.answer.host, "file-host");
        assert_eq!(config.answer.port, 9100);
        assert_eq!(config.answer.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.registration.host, "env-accounts");
        assert!(!config.skip_signup);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_ignored() {
        let config =
            load_config_with_env(None, env_from(&[("NUTRI_REGISTER_PORT", "eighty")])).unwrap();
        assert_eq!(config.registration.port, 8056);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config =
            load_config_with_env(None, env_from(&[("NUTRI_ANSWER_HOST", "env-host")])).unwrap();
        assert_eq!(config.source(), ConfigSource::Env);

        ConfigOverrides::new()
            .with_answer_host("cli-host".to_string())
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.answer.host, "cli-host");
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    // =========================================================================
    // ConfigOverrides Tests
    // =========================================================================

    #[test]
    fn test_config_overrides_apply() {
        let mut config = ClientConfig::default();

        ConfigOverrides::new()
            .with_answer_port(9001)
            .with_register_host("10.0.0.2".to_string())
            .with_register_port(9002)
            .with_skip_signup(true)
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.answer.base_url(), "http://127.0.0.1:9001");
        assert_eq!(config.registration.base_url(), "http://10.0.0.2:9002");
        assert!(config.skip_signup);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = ClientConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_config_overrides_validate() {
        let mut config = ClientConfig::default();
        let result = ConfigOverrides::new().with_answer_port(0).apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI");
        assert_eq!(format!("{}", ConfigSource::Env), "environment");
        assert_eq!(format!("{}", ConfigSource::File), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn test_config_error_display() {
        let read_err = ConfigError::ReadError {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = format!("{read_err}");
        assert!(msg.contains("/test/path"));
        assert!(msg.contains("Failed to read"));
    }
}
