//! # Settings System
//!
//! Settings of the remote configuration client.
//!
//! This crate provides:
//! - Settings structures for the remote bundle, the TTL cache, the refresh
//!   policy and the secret manager
//! - Environment variable loading (12-factor app principles)
//! - Settings file loading (TOML/YAML)
//! - Settings precedence (env > file > defaults)
//! - Settings validation

pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod settings;
pub mod validator;

pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::merge_settings;
pub use settings::{CacheSettings, RefreshSettings, RemoteSettings, SecretSettings, Settings};
pub use validator::validate;
pub use ::validator::Validate;
