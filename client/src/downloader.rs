//! # Bundle Download
//!
//! Fetches the configuration bundle of one component from the configuration
//! server.

use async_trait::async_trait;
use config::RemoteSettings;
use errors::{CoreError, Result};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// Coordinates of the bundle to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTarget {
    pub host: String,
    pub stage: String,
    pub environment: String,
    pub component: String,
}

impl BundleTarget {
    pub fn from_settings(settings: &RemoteSettings) -> Self {
        Self {
            host: settings.host.clone(),
            stage: settings.stage.clone(),
            environment: settings.environment.clone(),
            component: settings.component.clone(),
        }
    }
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the raw bundle; the bytes are opaque to the caller.
    async fn download(&self, target: &BundleTarget) -> Result<Vec<u8>>;
}

/// Downloads bundles over HTTP.
///
/// Issues `GET {host}/config?stage=..&environment=..&component=..` with a
/// bearer token. Any status other than `200 OK` is a
/// `ConfigurationRetrievalFailure`.
pub struct ServerDownloader {
    client: reqwest::Client,
    access_token: Option<String>,
    timeout: Duration,
}

impl ServerDownloader {
    pub fn new(access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::ConfigurationRetrievalFailure {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            access_token,
            timeout,
        })
    }

    pub fn bundle_url(target: &BundleTarget) -> Result<Url> {
        let base = format!("{}/config", target.host.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[
                ("stage", target.stage.as_str()),
                ("environment", target.environment.as_str()),
                ("component", target.component.as_str()),
            ],
        )
        .map_err(|e| CoreError::invalid_input("host", format!("invalid host '{}': {e}", target.host)))
    }

    fn request_error(&self, url: &Url, error: &reqwest::Error) -> CoreError {
        if error.is_timeout() {
            warn!("Configuration server did not answer within {:?}", self.timeout);
            return CoreError::timeout(format!("download from {url}"), self.timeout);
        }

        CoreError::ConfigurationRetrievalFailure {
            reason: format!("request to {url} failed: {error}"),
        }
    }
}

impl std::fmt::Debug for ServerDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDownloader")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Downloader for ServerDownloader {
    async fn download(&self, target: &BundleTarget) -> Result<Vec<u8>> {
        let url = Self::bundle_url(target)?;
        debug!(%url, "Downloading configuration bundle");

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.request_error(&url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::ConfigurationRetrievalFailure {
                reason: format!("received an unexpected status code {status}: {body}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.request_error(&url, &e))?;
        debug!(size = bytes.len(), "Downloaded configuration bundle");

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str) -> BundleTarget {
        BundleTarget {
            host: host.to_string(),
            stage: "prod".to_string(),
            environment: "eu west".to_string(),
            component: "billing".to_string(),
        }
    }

    #[test]
    fn test_bundle_url_encodes_query() {
        let url = ServerDownloader::bundle_url(&target("https://config.example/")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://config.example/config?stage=prod&environment=eu+west&component=billing"
        );
    }

    #[test]
    fn test_bundle_url_rejects_invalid_host() {
        let err = ServerDownloader::bundle_url(&target("not a url")).unwrap_err();
        assert_eq!(err.kind(), errors::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_target_from_settings() {
        let settings = RemoteSettings::default();
        let target = BundleTarget::from_settings(&settings);
        assert_eq!(target.stage, settings.stage);
        assert_eq!(target.component, settings.component);
    }

    #[test]
    fn test_debug_hides_token() {
        let downloader =
            ServerDownloader::new(Some("hidden-token".to_string()), Duration::from_secs(1)).unwrap();
        assert!(!format!("{downloader:?}").contains("hidden-token"));
    }
}
