//! # Settings Precedence
//!
//! Merges settings from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Settings file
//! 3. Default values (lowest priority)

use crate::settings::{CacheSettings, RefreshSettings, RemoteSettings, SecretSettings, Settings};

/// Merge settings sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Applies `file_settings` and then `env_settings` on top of `defaults`.
/// A field is overridden only when the overriding source carries a value
/// different from the built-in default, so a source that leaves a field
/// unset never erases a value set by a lower source.
///
/// ## Usage
/// ```rust,no_run
/// use config::{Settings, load_from_env, load_from_file, merge_settings};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let from_file = load_from_file(Path::new("settings.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _settings = merge_settings(Settings::default(), from_file, "file", from_env, "env");
///     Ok(())
/// }
/// ```
pub fn merge_settings(
    defaults: Settings,
    file_settings: Settings,
    file_source_name: &str,
    env_settings: Settings,
    env_source_name: &str,
) -> Settings {
    let settings = merge_with_logging(defaults, &file_settings, file_source_name);
    merge_with_logging(settings, &env_settings, env_source_name)
}

fn merge_with_logging(mut base: Settings, override_settings: &Settings, source_name: &str) -> Settings {
    let mut changes = Vec::new();

    merge_remote(&mut base.remote, &override_settings.remote, &mut changes);
    merge_cache(&mut base.cache, &override_settings.cache, &mut changes);
    merge_refresh(&mut base.refresh, &override_settings.refresh, &mut changes);
    merge_secret(&mut base.secret, &override_settings.secret, &mut changes);

    if !changes.is_empty() {
        tracing::info!("Settings from {}: {:?}", source_name, changes);
    }

    base
}

fn override_field<T>(
    name: &str,
    base: &mut T,
    candidate: &T,
    default: &T,
    changes: &mut Vec<String>,
) where
    T: PartialEq + Clone + std::fmt::Debug,
{
    if candidate != default && candidate != base {
        changes.push(format!("{name} = {candidate:?}"));
        base.clone_from(candidate);
    }
}

fn override_secret(
    name: &str,
    base: &mut Option<String>,
    candidate: &Option<String>,
    changes: &mut Vec<String>,
) {
    if candidate.is_some() && candidate != base {
        changes.push(format!("{name} = ***"));
        base.clone_from(candidate);
    }
}

fn merge_remote(base: &mut RemoteSettings, other: &RemoteSettings, changes: &mut Vec<String>) {
    let default = RemoteSettings::default();

    override_field("remote.host", &mut base.host, &other.host, &default.host, changes);
    override_field("remote.stage", &mut base.stage, &other.stage, &default.stage, changes);
    override_field(
        "remote.environment",
        &mut base.environment,
        &other.environment,
        &default.environment,
        changes,
    );
    override_field(
        "remote.component",
        &mut base.component,
        &other.component,
        &default.component,
        changes,
    );
    override_field(
        "remote.download_timeout_seconds",
        &mut base.download_timeout_seconds,
        &other.download_timeout_seconds,
        &default.download_timeout_seconds,
        changes,
    );
    override_secret("remote.access_token", &mut base.access_token, &other.access_token, changes);
    override_field(
        "remote.access_token_secret_id",
        &mut base.access_token_secret_id,
        &other.access_token_secret_id,
        &default.access_token_secret_id,
        changes,
    );
}

fn merge_cache(base: &mut CacheSettings, other: &CacheSettings, changes: &mut Vec<String>) {
    let default = CacheSettings::default();

    override_field(
        "cache.sweep_interval_seconds",
        &mut base.sweep_interval_seconds,
        &other.sweep_interval_seconds,
        &default.sweep_interval_seconds,
        changes,
    );
    override_field(
        "cache.document_ttl_seconds",
        &mut base.document_ttl_seconds,
        &other.document_ttl_seconds,
        &default.document_ttl_seconds,
        changes,
    );
}

fn merge_refresh(base: &mut RefreshSettings, other: &RefreshSettings, changes: &mut Vec<String>) {
    let default = RefreshSettings::default();

    override_field(
        "refresh.working_path",
        &mut base.working_path,
        &other.working_path,
        &default.working_path,
        changes,
    );
    override_field(
        "refresh.download_again_after_seconds",
        &mut base.download_again_after_seconds,
        &other.download_again_after_seconds,
        &default.download_again_after_seconds,
        changes,
    );
}

fn merge_secret(base: &mut SecretSettings, other: &SecretSettings, changes: &mut Vec<String>) {
    let default = SecretSettings::default();

    override_field("secret.command", &mut base.command, &other.command, &default.command, changes);
    override_secret("secret.access_token", &mut base.access_token, &other.access_token, changes);
    override_field(
        "secret.timeout_seconds",
        &mut base.timeout_seconds,
        &other.timeout_seconds,
        &default.timeout_seconds,
        changes,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_merge_defaults_only() {
        let merged = merge_settings(
            Settings::default(),
            Settings::default(),
            "file",
            Settings::default(),
            "env",
        );
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = Settings::default();
        file.remote.component = "billing".to_string();
        file.cache.document_ttl_seconds = 60;

        let merged = merge_settings(Settings::default(), file, "file", Settings::default(), "env");

        assert_eq!(merged.remote.component, "billing");
        assert_eq!(merged.cache.document_ttl_seconds, 60);
        assert_eq!(merged.remote.stage, "dummy");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = Settings::default();
        file.remote.host = "https://file.example".to_string();
        file.refresh.working_path = PathBuf::from("/from/file");

        let mut env = Settings::default();
        env.remote.host = "https://env.example".to_string();

        let merged = merge_settings(Settings::default(), file, "file", env, "env");

        assert_eq!(merged.remote.host, "https://env.example");
        assert_eq!(merged.refresh.working_path, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_unset_env_does_not_erase_file_token() {
        let mut file = Settings::default();
        file.remote.access_token = Some("file-token".to_string());

        let merged = merge_settings(
            Settings::default(),
            file,
            "file",
            Settings::default(),
            "env",
        );

        assert_eq!(merged.remote.access_token.as_deref(), Some("file-token"));
    }
}
