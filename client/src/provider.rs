//! # Configuration Value Provider
//!
//! Resolves colon-separated key paths (`Root:Parent:Example`) inside the
//! configuration files of an extracted bundle.
//!
//! Parsed documents are kept in a shared [`TtlCache`] under keys derived from
//! their absolute path, so repeated lookups into one file read and parse it
//! once per document TTL.

use crate::parser::{DocumentParser, YamlParser};
use crate::value::{ConfigValue, Document, coerce};
use async_trait::async_trait;
use cache::TtlCache;
use errors::{CoreError, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Separator between the segments of a key path.
pub const KEY_SEPARATOR: char = ':';

/// Prefix of every cache key written by a [`FileProvider`].
pub const CACHE_KEY_PREFIX: &str = "config-document:";

/// Cache of parsed documents, shareable with unrelated users.
pub type DocumentCache = TtlCache<String, Arc<ConfigValue>>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the value under `key` in the document at `file_path`.
    async fn get(&self, file_path: &str, key: &str) -> Result<ConfigValue>;

    /// Forgets every document this provider has cached.
    fn clean_cache(&self);
}

/// Provider reading documents from a directory on the local file system.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Serves lookups against the files of the last extracted bundle. File paths
/// are relative to `root`.
///
/// ## Errors
/// - `NotFound`: the file does not exist
/// - `IoFailure`: the file exists but cannot be read
/// - `SerializationFailure`: the file is not a valid document
/// - `InvalidCache`: the cache holds something other than a document under
///   this provider's key
/// - `InvalidInput`: the key path is malformed or does not resolve, or the
///   file path climbs out of `root`
pub struct FileProvider<P = YamlParser> {
    root: PathBuf,
    cache: Arc<DocumentCache>,
    document_ttl: Duration,
    parser: P,
}

impl FileProvider<YamlParser> {
    pub fn new(root: impl Into<PathBuf>, cache: Arc<DocumentCache>, document_ttl: Duration) -> Self {
        Self::with_parser(root, cache, document_ttl, YamlParser)
    }
}

impl<P: DocumentParser> FileProvider<P> {
    pub fn with_parser(
        root: impl Into<PathBuf>,
        cache: Arc<DocumentCache>,
        document_ttl: Duration,
        parser: P,
    ) -> Self {
        Self {
            root: root.into(),
            cache,
            document_ttl,
            parser,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Typed lookup: like [`Provider::get`], then converts the value into `T`.
    pub async fn get_as<T>(&self, file_path: &str, key: &str) -> Result<T>
    where
        T: TryFrom<ConfigValue, Error = ConfigValue>,
    {
        coerce(key, self.get(file_path, key).await?)
    }

    /// Maps `file_path` under `root`. A leading `/` is dropped so absolute
    /// paths stay inside the bundle; `..` is rejected.
    fn absolute_path(&self, file_path: &str) -> Result<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(file_path).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    return Err(CoreError::invalid_input(
                        file_path,
                        "path escapes the configuration root",
                    ));
                }
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(CoreError::invalid_input(file_path, "path names no file"));
        }

        let joined = self.root.join(relative);
        std::path::absolute(&joined).map_err(|e| CoreError::IoFailure {
            path: joined.display().to_string(),
            reason: format!("failed to resolve absolute path: {e}"),
        })
    }

    async fn load_document(&self, file_path: &str) -> Result<Arc<ConfigValue>> {
        let path = self.absolute_path(file_path)?;
        let cache_key = format!("{CACHE_KEY_PREFIX}{}", path.display());

        if let Some(cached) = self.cache.get(&cache_key) {
            if cached.as_document().is_none() {
                return Err(CoreError::InvalidCache {
                    key: cache_key,
                    reason: format!("expected a document but found {}", cached.shape()),
                });
            }
            return Ok(cached);
        }

        let shown = path.display().to_string();
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => return Err(CoreError::NotFound { path: shown }),
            Err(e) => {
                return Err(CoreError::IoFailure {
                    path: shown,
                    reason: e.to_string(),
                });
            }
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| CoreError::IoFailure {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let value = self.parser.parse(&bytes)?;
        if value.as_document().is_none() {
            return Err(CoreError::SerializationFailure {
                reason: format!(
                    "top level of '{shown}' is a {}, expected a document",
                    value.shape()
                ),
            });
        }

        debug!(path = %shown, bytes = bytes.len(), "Loaded configuration document");
        metrics::counter!("config_provider_document_loads_total").increment(1);

        let document = Arc::new(value);
        self.cache.set(cache_key, Arc::clone(&document), self.document_ttl);
        Ok(document)
    }
}

#[async_trait]
impl<P: DocumentParser> Provider for FileProvider<P> {
    async fn get(&self, file_path: &str, key: &str) -> Result<ConfigValue> {
        let document = self.load_document(file_path).await?;
        match document.as_document() {
            Some(document) => resolve(document, key),
            None => Err(CoreError::SerializationFailure {
                reason: format!("'{file_path}' is not a document"),
            }),
        }
    }

    fn clean_cache(&self) {
        self.cache.remove_matching(|key| key.starts_with(CACHE_KEY_PREFIX));
    }
}

impl<P> std::fmt::Debug for FileProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProvider")
            .field("root", &self.root)
            .field("document_ttl", &self.document_ttl)
            .finish_non_exhaustive()
    }
}

/// Walks `key` through `document`.
///
/// Every segment but the last must name a nested document; the last one
/// yields the value, whatever its shape.
pub fn resolve(document: &Document, key: &str) -> Result<ConfigValue> {
    if key.is_empty() {
        return Err(CoreError::invalid_input(key, "key must not be empty"));
    }

    let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(CoreError::invalid_input(key, "key must not be empty"));
    };

    let mut current = document;
    for segment in parents {
        if segment.is_empty() {
            return Err(CoreError::invalid_input(key, "key contains an empty segment"));
        }

        current = match current.get(*segment) {
            Some(ConfigValue::Document(nested)) => nested,
            Some(other) => {
                return Err(CoreError::invalid_input(
                    *segment,
                    format!("expected a document but found {}", other.shape()),
                ));
            }
            None => return Err(CoreError::invalid_input(*segment, "failed to read key")),
        };
    }

    if last.is_empty() {
        return Err(CoreError::invalid_input(key, "key contains an empty segment"));
    }

    current
        .get(*last)
        .cloned()
        .ok_or_else(|| CoreError::invalid_input(*last, "key not found"))
}
