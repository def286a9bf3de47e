//! # Settings File Loading
//!
//! Loads settings from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::settings::Settings;
use std::path::Path;

/// Settings file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Settings file has no extension")]
    NoExtension,

    #[error("Unsupported settings file format: {0}")]
    UnsupportedFormat(String),
}

fn read_settings_file(path: &Path) -> Result<String, ConfigFileError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigFileError::FileNotFound(path.display().to_string()),
        _ => ConfigFileError::Io(e),
    })
}

/// Load settings from a TOML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings = load_from_toml(Path::new("settings.toml"))?;
///     println!("Component: {}", settings.remote.component);
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `ConfigFileError` for a missing file, an unreadable file or
/// invalid TOML syntax.
pub fn load_from_toml(path: &Path) -> Result<Settings, ConfigFileError> {
    let contents = read_settings_file(path)?;

    toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))
}

/// Load settings from a YAML file.
pub fn load_from_yaml(path: &Path) -> Result<Settings, ConfigFileError> {
    let contents = read_settings_file(path)?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))
}

/// Load settings from file, detecting the format from the extension.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml` / `.yml`: YAML format
pub fn load_from_file(path: &Path) -> Result<Settings, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let toml_content = r#"
[remote]
host = "https://config.example"
stage = "beta"
environment = "staging"
component = "billing"
download_timeout_seconds = 10

[cache]
sweep_interval_seconds = 5
document_ttl_seconds = 120

[refresh]
working_path = "/var/lib/billing/config"
download_again_after_seconds = 60
"#;
        fs::write(&path, toml_content).unwrap();

        let settings = load_from_toml(&path).unwrap();
        assert_eq!(settings.remote.host, "https://config.example");
        assert_eq!(settings.remote.stage, "beta");
        assert_eq!(settings.remote.environment, "staging");
        assert_eq!(settings.remote.component, "billing");
        assert_eq!(settings.remote.download_timeout_seconds, 10);
        assert_eq!(settings.cache.sweep_interval_seconds, 5);
        assert_eq!(settings.cache.document_ttl_seconds, 120);
        assert_eq!(
            settings.refresh.working_path,
            Path::new("/var/lib/billing/config")
        );
        assert_eq!(settings.refresh.download_again_after_seconds, 60);
        assert_eq!(settings.secret.command, "bws");
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");

        let yaml_content = r#"
remote:
  host: https://config.example
  component: billing
  access_token_secret_id: 0b4f-secret
secret:
  command: /usr/local/bin/bws
  timeout_seconds: 5
"#;
        fs::write(&path, yaml_content).unwrap();

        let settings = load_from_yaml(&path).unwrap();
        assert_eq!(settings.remote.host, "https://config.example");
        assert_eq!(settings.remote.component, "billing");
        assert_eq!(
            settings.remote.access_token_secret_id.as_deref(),
            Some("0b4f-secret")
        );
        assert_eq!(settings.secret.command, "/usr/local/bin/bws");
        assert_eq!(settings.secret.timeout_seconds, 5);
    }

    #[test]
    fn test_load_from_file_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_from_file_no_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings");
        fs::write(&path, "").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::NoExtension)));
    }

    #[test]
    fn test_load_from_file_auto_detect_yml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yml");
        fs::write(&path, "remote:\n  stage: auto\n").unwrap();

        let settings = load_from_file(&path).unwrap();
        assert_eq!(settings.remote.stage, "auto");
    }

    #[test]
    fn test_load_from_toml_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[invalid\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));
    }

    #[test]
    fn test_load_from_yaml_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "remote: [unmatched\n").unwrap();

        let result = load_from_yaml(&path);
        assert!(matches!(result, Err(ConfigFileError::YamlParse(_))));
    }

    #[test]
    fn test_load_from_toml_not_found() {
        let path = Path::new("/nonexistent/path/settings.toml");
        let result = load_from_toml(path);
        assert!(matches!(result, Err(ConfigFileError::FileNotFound(_))));
    }
}
