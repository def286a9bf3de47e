use async_trait::async_trait;
use client::{
    BundleTarget, ConfigValue, DocumentParser, Downloader, Extractor, Provider, TarGzExtractor,
    YamlParser,
};
use errors::{CoreError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// YAML document used by the key-path tests.
pub const SAMPLE_DOCUMENT: &str = "\
Example:
  Inner:
    Value: 5
  Yeah: true
Root: \"yes\"
";

/// Builds an in-memory `.tar.gz` bundle holding `files` as `(path, contents)`.
pub fn tar_gz_bundle(files: &[(&str, &str)]) -> anyhow::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, contents.as_bytes())?;
    }

    Ok(builder.into_inner()?.finish()?)
}

/// Downloader serving a fixed bundle, or failing on demand.
pub struct CountingDownloader {
    bundle: Mutex<Option<Vec<u8>>>,
    calls: AtomicUsize,
    targets: Mutex<Vec<BundleTarget>>,
}

impl CountingDownloader {
    pub fn serving(bundle: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bundle: Mutex::new(Some(bundle)),
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            bundle: Mutex::new(None),
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    /// Replaces the served bundle; `None` makes later downloads fail.
    pub fn set_bundle(&self, bundle: Option<Vec<u8>>) {
        *self.bundle.lock() = bundle;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<BundleTarget> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl Downloader for CountingDownloader {
    async fn download(&self, target: &BundleTarget) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().push(target.clone());

        self.bundle
            .lock()
            .clone()
            .ok_or_else(|| CoreError::ConfigurationRetrievalFailure {
                reason: "received an unexpected status code 503 Service Unavailable".to_string(),
            })
    }
}

/// Extractor counting its calls; delegates to [`TarGzExtractor`].
#[derive(Default)]
pub struct CountingExtractor {
    inner: TarGzExtractor,
    calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for CountingExtractor {
    async fn extract(&self, bundle: &[u8], target_dir: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(bundle, target_dir).await
    }
}

/// Provider wrapper counting lookups and cache cleanups.
pub struct CountingProvider {
    inner: Arc<dyn Provider>,
    gets: AtomicUsize,
    cleans: AtomicUsize,
}

impl CountingProvider {
    pub fn wrap(inner: Arc<dyn Provider>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gets: AtomicUsize::new(0),
            cleans: AtomicUsize::new(0),
        })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn cleans(&self) -> usize {
        self.cleans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for CountingProvider {
    async fn get(&self, file_path: &str, key: &str) -> Result<ConfigValue> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(file_path, key).await
    }

    fn clean_cache(&self) {
        self.cleans.fetch_add(1, Ordering::SeqCst);
        self.inner.clean_cache();
    }
}

/// YAML parser counting how many documents it parsed.
#[derive(Clone, Default)]
pub struct CountingParser {
    calls: Arc<AtomicUsize>,
}

impl CountingParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentParser for CountingParser {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        YamlParser.parse(bytes)
    }
}
