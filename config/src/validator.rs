//! # Settings Validation
//!
//! Provides validation for all settings structures using the `validator` crate.

use crate::settings::Settings;
use validator::Validate;

/// Validate settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Validation Rules
/// ### Remote
/// - `host`: http(s) URL, at most 2048 characters
/// - `stage`, `environment`, `component`: 1-255 characters
/// - `download_timeout_seconds`: 1-600
///
/// ### Cache
/// - `sweep_interval_seconds`: 1-86400
/// - `document_ttl_seconds`: 1-604800
///
/// ### Refresh
/// - `download_again_after_seconds`: 1-604800
///
/// ### Secret
/// - `command`: 1-4096 characters
/// - `timeout_seconds`: 1-300
pub fn validate(settings: &Settings) -> Result<(), validator::ValidationErrors> {
    settings.validate()
}
