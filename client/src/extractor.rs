//! Bundle extraction.

use async_trait::async_trait;
use errors::{CoreError, Result};
use flate2::read::GzDecoder;
use std::path::Path;
use tracing::debug;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Unpacks `bundle` into `target_dir`, overwriting files that already
    /// exist. Files absent from the bundle are left in place.
    async fn extract(&self, bundle: &[u8], target_dir: &Path) -> Result<()>;
}

/// Extracts gzip-compressed tar bundles.
///
/// Decompression runs on the blocking thread pool. Entries that would land
/// outside of the target directory abort the extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

#[async_trait]
impl Extractor for TarGzExtractor {
    async fn extract(&self, bundle: &[u8], target_dir: &Path) -> Result<()> {
        let bundle = bundle.to_vec();
        let target_dir = target_dir.to_path_buf();

        let count = tokio::task::spawn_blocking(move || unpack(&bundle, &target_dir))
            .await
            .map_err(|e| CoreError::ExtractionFailure {
                reason: format!("extraction task failed: {e}"),
            })??;

        debug!(entries = count, "Extracted configuration bundle");
        Ok(())
    }
}

fn unpack(bundle: &[u8], target_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(target_dir).map_err(|e| CoreError::ExtractionFailure {
        reason: format!("failed to create '{}': {e}", target_dir.display()),
    })?;

    let mut archive = tar::Archive::new(GzDecoder::new(bundle));
    archive.set_overwrite(true);
    archive.set_preserve_permissions(false);

    let entries = archive.entries().map_err(|e| CoreError::ExtractionFailure {
        reason: format!("failed to read archive: {e}"),
    })?;

    let mut count = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| CoreError::ExtractionFailure {
            reason: format!("failed to read archive entry: {e}"),
        })?;

        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let unpacked = entry
            .unpack_in(target_dir)
            .map_err(|e| CoreError::ExtractionFailure {
                reason: format!("failed to extract '{name}': {e}"),
            })?;

        if !unpacked {
            return Err(CoreError::ExtractionFailure {
                reason: format!("entry '{name}' escapes the target directory"),
            });
        }
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_garbage_is_extraction_failure() {
        let dir = TempDir::new().unwrap();
        let err = TarGzExtractor
            .extract(b"definitely not gzip", dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    }

    #[tokio::test]
    async fn test_creates_missing_target_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("snapshot");

        let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
            Vec::new(),
            flate2::Compression::default(),
        ));
        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "a.yaml", &b"a: 1"[..]).unwrap();
        let bundle = builder.into_inner().unwrap().finish().unwrap();

        TarGzExtractor.extract(&bundle, &target).await.unwrap();
        assert!(target.join("a.yaml").is_file());
    }
}
