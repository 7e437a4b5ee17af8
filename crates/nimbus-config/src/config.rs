// crates/nimbus-config/src/config.rs
// ============================================================================
// Module: Nimbus Configuration
// Description: Configuration loading and validation for the compute client.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: nimbus-compute, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[compute]` table describes the endpoint and credentials; the `[audit]`
//! table selects where request audit events go.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use nimbus_compute::ComputeClient;
use nimbus_compute::FileAuditSink;
use nimbus_compute::HttpTransportConfig;
use nimbus_compute::NoopAuditSink;
use nimbus_compute::RequestAuditSink;
use nimbus_compute::StderrAuditSink;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "nimbus.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "NIMBUS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Minimum response size limit in bytes.
pub(crate) const MIN_RESPONSE_BYTES: usize = 1024;
/// Maximum response size limit in bytes.
pub(crate) const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Maximum length of a service token.
pub(crate) const MAX_TOKEN_LENGTH: usize = 4096;
/// Maximum length of the user agent string.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration loaded from `nimbus.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NimbusConfig {
    /// Compute endpoint settings.
    pub compute: ComputeConfig,
    /// Request audit settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Compute endpoint configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeConfig {
    /// Compute endpoint base URL.
    pub url: String,
    /// Inline service token.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the service token.
    #[serde(default)]
    pub token_env: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum response size allowed, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP endpoints.
    #[serde(default)]
    pub allow_http: bool,
}

impl fmt::Debug for ComputeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

/// Destination of request audit events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Audit disabled.
    None,
}

/// Request audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl NimbusConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is `path` when given, else `NIMBUS_CONFIG`, else
    /// `nimbus.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compute.validate()?;
        self.audit.validate()
    }

    /// Builds the HTTP transport configuration, resolving the token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the token environment variable is unset or
    /// invalid.
    pub fn transport_config(&self) -> Result<HttpTransportConfig, ConfigError> {
        self.compute.transport_config()
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn RequestAuditSink>, ConfigError> {
        self.audit.open_sink()
    }

    /// Builds a compute client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the token, audit sink, or transport
    /// cannot be set up.
    pub fn build_client(&self) -> Result<ComputeClient, ConfigError> {
        let transport = self.transport_config()?;
        let audit = self.audit_sink()?;
        ComputeClient::from_config(transport, audit)
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl ComputeConfig {
    /// Validates endpoint, limits, and credential settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.url.trim())
            .map_err(|_| ConfigError::Invalid("compute.url must be a valid url".to_string()))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(
                    "compute.url must use https unless allow_http is set".to_string(),
                ));
            }
            _ => return Err(ConfigError::Invalid("compute.url scheme is unsupported".to_string())),
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid("compute.url must not embed credentials".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "compute.url must not carry a query or fragment".to_string(),
            ));
        }
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "compute.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(MIN_RESPONSE_BYTES..=MAX_RESPONSE_BYTES).contains(&self.max_response_bytes) {
            return Err(ConfigError::Invalid(format!(
                "compute.max_response_bytes must be between {MIN_RESPONSE_BYTES} and \
                 {MAX_RESPONSE_BYTES}"
            )));
        }
        let user_agent = self.user_agent.trim();
        if user_agent.is_empty() || user_agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid(
                "compute.user_agent must be non-empty and at most 256 bytes".to_string(),
            ));
        }
        match (&self.token, &self.token_env) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "compute.token and compute.token_env are mutually exclusive".to_string(),
                ));
            }
            (Some(token), None) => validate_token("compute.token", token)?,
            (None, Some(name)) => {
                if name.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "compute.token_env must be non-empty".to_string(),
                    ));
                }
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Builds the transport configuration, reading `token_env` when set.
    fn transport_config(&self) -> Result<HttpTransportConfig, ConfigError> {
        let token = match (&self.token, &self.token_env) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(name)) => {
                let value = env::var(name.trim()).map_err(|_| {
                    ConfigError::Invalid(format!("token environment variable {name} is not set"))
                })?;
                validate_token(name, &value)?;
                Some(value)
            }
            (None, None) => None,
        };
        Ok(HttpTransportConfig {
            base_url: self.url.trim().to_string(),
            token,
            timeout_ms: self.timeout_ms,
            max_response_bytes: self.max_response_bytes,
            user_agent: self.user_agent.trim().to_string(),
            allow_http: self.allow_http,
        })
    }
}

impl AuditConfig {
    /// Validates sink selection against the path setting.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("audit.path", path),
            (_, None) => Ok(()),
        }
    }

    /// Opens the selected sink.
    fn open_sink(&self) -> Result<Arc<dyn RequestAuditSink>, ConfigError> {
        match self.sink {
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for the file sink".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    10_000
}

/// Default user agent.
fn default_user_agent() -> String {
    "nimbus/0.1".to_string()
}

/// Default response size limit.
const fn default_max_response_bytes() -> usize {
    8 * 1024 * 1024
}

/// Resolves the config path from the argument or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a token value; header values cannot carry control characters.
fn validate_token(field: &str, token: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if token.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(format!("{field} contains control characters")));
    }
    Ok(())
}
