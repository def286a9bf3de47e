//! # Remote Configuration Client
//!
//! Downloads a component's configuration bundle from the configuration
//! server, keeps an extracted snapshot on disk and answers key-path lookups
//! (`Parent:Child:Key`) against the YAML documents it contains.
//!
//! ```rust,no_run
//! use client::Client;
//! use config::Settings;
//!
//! # async fn run() -> errors::Result<()> {
//! let client = Client::from_settings(&Settings::default(), None).await?;
//! let port: i64 = client.get_as("application.yaml", "Server:Port").await?;
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod downloader;
pub mod extractor;
pub mod parser;
pub mod provider;
pub mod value;

pub use client::Client;
pub use downloader::{BundleTarget, Downloader, ServerDownloader};
pub use extractor::{Extractor, TarGzExtractor};
pub use parser::{DocumentParser, YamlParser};
pub use provider::{DocumentCache, FileProvider, KEY_SEPARATOR, Provider, resolve};
pub use value::{ConfigValue, Document, coerce};
