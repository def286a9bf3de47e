//! # Settings Structures
//!
//! Settings of the remote configuration client itself: where the bundle
//! lives, how long cached documents live, how often the local snapshot is
//! refreshed and how secrets are resolved.
//!
//! All structures:
//! - Use `serde` for serialization/deserialization with per-field defaults
//! - Use `validator` for input validation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Top-level settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates every settings section consumed when building a configuration
/// client.
///
/// ## Usage
/// ```rust,no_run
/// use config::Settings;
///
/// let settings = Settings::default();
/// println!("Config server: {}", settings.remote.host);
/// ```
///
/// ## Fields
/// - `remote`: Remote bundle location and download behaviour
/// - `cache`: TTL cache timings
/// - `refresh`: Local snapshot location and refresh policy
/// - `secret`: Secret manager command-line tool
///
/// ## Validation
/// Every nested section is validated with its own rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Settings {
    /// Remote bundle location
    #[serde(default)]
    #[validate(nested)]
    pub remote: RemoteSettings,

    /// TTL cache timings
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheSettings,

    /// Local snapshot refresh policy
    #[serde(default)]
    #[validate(nested)]
    pub refresh: RefreshSettings,

    /// Secret manager tool
    #[serde(default)]
    #[validate(nested)]
    pub secret: SecretSettings,
}

/// Remote bundle settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Identifies the configuration bundle on the configuration server.
///
/// ## Fields
/// - `host`: Base URL of the configuration server (default: "http://localhost:8080")
/// - `stage`: Deployment stage (default: "dummy")
/// - `environment`: Environment name (default: "development")
/// - `component`: Component whose bundle is fetched (default: "dummy")
/// - `download_timeout_seconds`: Request timeout (default: 30, range: 1-600)
/// - `access_token`: Bearer token used verbatim (optional)
/// - `access_token_secret_id`: Secret id resolved through the secret manager
///   when `access_token` is absent (optional)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RemoteSettings {
    #[serde(default = "default_remote_host")]
    #[validate(custom(function = "validate_host"))]
    pub host: String,

    #[serde(default = "default_remote_stage")]
    #[validate(length(min = 1, max = 255))]
    pub stage: String,

    #[serde(default = "default_remote_environment")]
    #[validate(length(min = 1, max = 255))]
    pub environment: String,

    #[serde(default = "default_remote_component")]
    #[validate(length(min = 1, max = 255))]
    pub component: String,

    #[serde(default = "default_download_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub download_timeout_seconds: u64,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub access_token_secret_id: Option<String>,
}

fn default_remote_host() -> String {
    "http://localhost:8080".to_string()
}

fn default_remote_stage() -> String {
    "dummy".to_string()
}

fn default_remote_environment() -> String {
    "development".to_string()
}

fn default_remote_component() -> String {
    "dummy".to_string()
}

fn default_download_timeout() -> u64 {
    30
}

fn validate_host(value: &str) -> Result<(), validator::ValidationError> {
    if (value.starts_with("http://") || value.starts_with("https://")) && value.len() <= 2048 {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Host must be an http(s) URL"))
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            stage: default_remote_stage(),
            environment: default_remote_environment(),
            component: default_remote_component(),
            download_timeout_seconds: default_download_timeout(),
            access_token: None,
            access_token_secret_id: None,
        }
    }
}

impl RemoteSettings {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_seconds)
    }
}

/// TTL cache settings.
///
/// ## Fields
/// - `sweep_interval_seconds`: How often expired entries are reclaimed
///   (default: 60, range: 1-86400)
/// - `document_ttl_seconds`: How long a parsed document stays cached
///   (default: 3600, range: 1-604800)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_sweep_interval")]
    #[validate(range(min = 1, max = 86400))]
    pub sweep_interval_seconds: u64,

    #[serde(default = "default_document_ttl")]
    #[validate(range(min = 1, max = 604800))]
    pub document_ttl_seconds: u64,
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_document_ttl() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
            document_ttl_seconds: default_document_ttl(),
        }
    }
}

impl CacheSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn document_ttl(&self) -> Duration {
        Duration::from_secs(self.document_ttl_seconds)
    }
}

/// Local snapshot refresh settings.
///
/// ## Fields
/// - `working_path`: Directory the bundle is extracted into
///   (default: "config-snapshot" under the system temp directory)
/// - `download_again_after_seconds`: Maximum snapshot age before a new
///   download (default: 300, range: 1-604800)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RefreshSettings {
    #[serde(default = "default_working_path")]
    pub working_path: PathBuf,

    #[serde(default = "default_download_again_after")]
    #[validate(range(min = 1, max = 604800))]
    pub download_again_after_seconds: u64,
}

fn default_working_path() -> PathBuf {
    std::env::temp_dir().join("config-snapshot")
}

fn default_download_again_after() -> u64 {
    300
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            working_path: default_working_path(),
            download_again_after_seconds: default_download_again_after(),
        }
    }
}

impl RefreshSettings {
    pub fn download_again_after(&self) -> Duration {
        Duration::from_secs(self.download_again_after_seconds)
    }
}

/// Secret manager settings.
///
/// ## Fields
/// - `command`: Secret manager executable (default: "bws")
/// - `access_token`: Token handed to the secret manager (optional)
/// - `timeout_seconds`: Maximum run time of one invocation
///   (default: 15, range: 1-300)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SecretSettings {
    #[serde(default = "default_secret_command")]
    #[validate(length(min = 1, max = 4096))]
    pub command: String,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_secret_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_seconds: u64,
}

fn default_secret_command() -> String {
    "bws".to_string()
}

fn default_secret_timeout() -> u64 {
    15
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            command: default_secret_command(),
            access_token: None,
            timeout_seconds: default_secret_timeout(),
        }
    }
}

impl SecretSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
