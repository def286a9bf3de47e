//! # Environment Variable Loader
//!
//! Loads settings from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! - `RC_*`: Remote bundle settings
//! - `CACHE_*`: TTL cache settings
//! - `REFRESH_*`: Snapshot refresh settings
//! - `SECRET_*`: Secret manager settings

use crate::settings::{CacheSettings, RefreshSettings, RemoteSettings, SecretSettings, Settings};
use std::env;
use std::path::PathBuf;

/// Load settings from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Environment variables override default values. Unset or unparsable
/// variables fall back to the default of their field.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_from_env()?;
///     println!("Config server: {}", settings.remote.host);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Remote Settings (`RC_*`)
/// - `RC_HOST`: Configuration server base URL (default: "http://localhost:8080")
/// - `RC_STAGE`: Stage (default: "dummy")
/// - `RC_ENVIRONMENT`: Environment (default: "development")
/// - `RC_COMPONENT`: Component (default: "dummy")
/// - `RC_DOWNLOAD_TIMEOUT_SECONDS`: Request timeout (default: 30)
/// - `RC_ACCESS_TOKEN`: Bearer token (optional)
/// - `RC_ACCESS_TOKEN_SECRET_ID`: Secret id of the bearer token (optional)
///
/// ### Cache Settings (`CACHE_*`)
/// - `CACHE_SWEEP_INTERVAL_SECONDS`: Sweep interval (default: 60)
/// - `CACHE_DOCUMENT_TTL_SECONDS`: Parsed document TTL (default: 3600)
///
/// ### Refresh Settings (`REFRESH_*`)
/// - `REFRESH_WORKING_PATH`: Extraction directory
/// - `REFRESH_DOWNLOAD_AGAIN_AFTER_SECONDS`: Snapshot max age (default: 300)
///
/// ### Secret Settings
/// - `SECRET_COMMAND`: Secret manager executable (default: "bws")
/// - `SECRETS_MANAGER_ACCESS_TOKEN`: Secret manager token (optional)
/// - `SECRET_TIMEOUT_SECONDS`: Invocation timeout (default: 15)
pub fn load_from_env() -> Result<Settings, Box<dyn std::error::Error>> {
    let settings = Settings {
        remote: load_remote_from_env()?,
        cache: load_cache_from_env()?,
        refresh: load_refresh_from_env()?,
        secret: load_secret_from_env()?,
    };

    Ok(settings)
}

fn load_remote_from_env() -> Result<RemoteSettings, Box<dyn std::error::Error>> {
    let defaults = RemoteSettings::default();

    Ok(RemoteSettings {
        host: env::var("RC_HOST").unwrap_or(defaults.host),
        stage: env::var("RC_STAGE").unwrap_or(defaults.stage),
        environment: env::var("RC_ENVIRONMENT").unwrap_or(defaults.environment),
        component: env::var("RC_COMPONENT").unwrap_or(defaults.component),
        download_timeout_seconds: parse_env("RC_DOWNLOAD_TIMEOUT_SECONDS")
            .unwrap_or(defaults.download_timeout_seconds),
        access_token: env::var("RC_ACCESS_TOKEN").ok(),
        access_token_secret_id: env::var("RC_ACCESS_TOKEN_SECRET_ID").ok(),
    })
}

fn load_cache_from_env() -> Result<CacheSettings, Box<dyn std::error::Error>> {
    let defaults = CacheSettings::default();

    Ok(CacheSettings {
        sweep_interval_seconds: parse_env("CACHE_SWEEP_INTERVAL_SECONDS")
            .unwrap_or(defaults.sweep_interval_seconds),
        document_ttl_seconds: parse_env("CACHE_DOCUMENT_TTL_SECONDS")
            .unwrap_or(defaults.document_ttl_seconds),
    })
}

fn load_refresh_from_env() -> Result<RefreshSettings, Box<dyn std::error::Error>> {
    let defaults = RefreshSettings::default();

    Ok(RefreshSettings {
        working_path: env::var("REFRESH_WORKING_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.working_path),
        download_again_after_seconds: parse_env("REFRESH_DOWNLOAD_AGAIN_AFTER_SECONDS")
            .unwrap_or(defaults.download_again_after_seconds),
    })
}

fn load_secret_from_env() -> Result<SecretSettings, Box<dyn std::error::Error>> {
    let defaults = SecretSettings::default();

    Ok(SecretSettings {
        command: env::var("SECRET_COMMAND").unwrap_or(defaults.command),
        access_token: env::var("SECRETS_MANAGER_ACCESS_TOKEN").ok(),
        timeout_seconds: parse_env("SECRET_TIMEOUT_SECONDS").unwrap_or(defaults.timeout_seconds),
    })
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
    }
}
