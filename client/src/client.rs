//! # Bundle Acquisition Pipeline
//!
//! Keeps a local snapshot of a component's configuration bundle and serves
//! lookups from it.
//!
//! The snapshot is **stale** when it was never downloaded, when it is older
//! than `download_again_after`, or when its working directory has vanished.
//! A lookup against a stale snapshot first runs a refresh cycle:
//!
//! 1. create the working directory (best effort)
//! 2. download the bundle
//! 3. extract it into the working directory
//! 4. record the download time and drop the provider's cached documents
//!
//! A failed cycle leaves the snapshot stale, so the next lookup retries.
//! Concurrent lookups that both observe a stale snapshot may both refresh;
//! extraction overwrites, so the outcome is the same.

use crate::downloader::{BundleTarget, Downloader, ServerDownloader};
use crate::extractor::{Extractor, TarGzExtractor};
use crate::provider::{FileProvider, Provider};
use crate::value::{ConfigValue, coerce};
use cache::TtlCache;
use config::Settings;
use errors::{CoreError, Result};
use parking_lot::Mutex;
use secret::SecretProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

pub struct Client {
    target: BundleTarget,
    working_path: PathBuf,
    download_again_after: Duration,
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn Extractor>,
    provider: Arc<dyn Provider>,
    last_download: Mutex<Option<Instant>>,
}

impl Client {
    pub fn new(
        target: BundleTarget,
        working_path: impl Into<PathBuf>,
        download_again_after: Duration,
        downloader: Arc<dyn Downloader>,
        extractor: Arc<dyn Extractor>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            target,
            working_path: working_path.into(),
            download_again_after,
            downloader,
            extractor,
            provider,
            last_download: Mutex::new(None),
        }
    }

    /// Builds a client talking to the configuration server described by
    /// `settings`.
    ///
    /// # M-CANONICAL-DOCS
    ///
    /// ## Purpose
    /// Wires a [`ServerDownloader`], a [`TarGzExtractor`] and a YAML
    /// [`FileProvider`] backed by a new [`TtlCache`].
    ///
    /// ## Access Token
    /// `remote.access_token` is used as is. Otherwise, when
    /// `remote.access_token_secret_id` is set, the token is fetched through
    /// `secrets`. With neither, requests are sent without credentials.
    ///
    /// ## Errors
    /// - `InvalidInput`: the settings fail validation, or a secret id is set
    ///   without a secret provider
    /// - any error of [`SecretProvider::get`]
    ///
    /// ## Panics
    /// Panics when called outside of a tokio runtime (the cache spawns its
    /// sweep task).
    pub async fn from_settings(
        settings: &Settings,
        secrets: Option<&dyn SecretProvider>,
    ) -> Result<Self> {
        config::validate(settings)
            .map_err(|e| CoreError::invalid_input("settings", e.to_string()))?;

        let access_token = match (
            &settings.remote.access_token,
            &settings.remote.access_token_secret_id,
        ) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(secret_id)) => {
                let secrets = secrets.ok_or_else(|| {
                    CoreError::invalid_input(
                        "remote.access_token_secret_id",
                        "a secret id is configured but no secret provider was given",
                    )
                })?;
                Some(secrets.get(secret_id).await?)
            }
            (None, None) => None,
        };

        let cache = Arc::new(TtlCache::new(settings.cache.sweep_interval()));
        let provider = FileProvider::new(
            settings.refresh.working_path.clone(),
            cache,
            settings.cache.document_ttl(),
        );
        let downloader = ServerDownloader::new(access_token, settings.remote.download_timeout())?;

        Ok(Self::new(
            BundleTarget::from_settings(&settings.remote),
            settings.refresh.working_path.clone(),
            settings.refresh.download_again_after(),
            Arc::new(downloader),
            Arc::new(TarGzExtractor),
            Arc::new(provider),
        ))
    }

    pub fn target(&self) -> &BundleTarget {
        &self.target
    }

    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Whether the next lookup will refresh the snapshot first.
    pub async fn is_stale(&self) -> bool {
        let outdated = match *self.last_download.lock() {
            Some(at) => at.elapsed() > self.download_again_after,
            None => true,
        };
        if outdated {
            return true;
        }

        !tokio::fs::metadata(&self.working_path)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
    }

    /// Returns the value under `key` in `file_path`, refreshing the snapshot
    /// first when it is stale.
    pub async fn get(&self, file_path: &str, key: &str) -> Result<ConfigValue> {
        if self.is_stale().await {
            self.refresh().await?;
        }

        self.provider.get(file_path, key).await
    }

    /// Typed lookup: like [`Client::get`], then converts the value into `T`.
    pub async fn get_as<T>(&self, file_path: &str, key: &str) -> Result<T>
    where
        T: TryFrom<ConfigValue, Error = ConfigValue>,
    {
        coerce(key, self.get(file_path, key).await?)
    }

    /// Runs one refresh cycle, regardless of staleness.
    #[instrument(skip(self), fields(component = %self.target.component, path = %self.working_path.display()))]
    pub async fn refresh(&self) -> Result<()> {
        if let Err(e) = tokio::fs::create_dir_all(&self.working_path).await {
            warn!("Failed to create working directory: {}", e);
        }

        let bundle = match self.downloader.download(&self.target).await {
            Ok(bundle) => bundle,
            Err(e) => {
                metrics::counter!("config_client_refresh_total", "outcome" => "download_failure")
                    .increment(1);
                return Err(e);
            }
        };

        if let Err(e) = self.extractor.extract(&bundle, &self.working_path).await {
            metrics::counter!("config_client_refresh_total", "outcome" => "extraction_failure")
                .increment(1);
            return Err(e);
        }

        *self.last_download.lock() = Some(Instant::now());
        self.provider.clean_cache();

        metrics::counter!("config_client_refresh_total", "outcome" => "success").increment(1);
        info!(size = bundle.len(), "Configuration snapshot refreshed");

        Ok(())
    }

    /// Deletes the working directory. Failures are logged, never returned.
    pub async fn close(&self) {
        match tokio::fs::remove_dir_all(&self.working_path).await {
            Ok(()) => debug!(path = %self.working_path.display(), "Removed working directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove working directory {}: {}",
                self.working_path.display(),
                e
            ),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.target)
            .field("working_path", &self.working_path)
            .field("download_again_after", &self.download_again_after)
            .field("last_download", &*self.last_download.lock())
            .finish_non_exhaustive()
    }
}
