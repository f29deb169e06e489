//! The fetch capability shared by all content-source kinds.

use async_trait::async_trait;
use camino::Utf8Path;

use sprout_core::{FetchedPackage, PackageManifest, PackageSource, SourceKind, SproutError};

use crate::FetcherResult;

/// Options applied to a single fetch operation
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Read the fetched package's manifest into the returned descriptor
    pub read_manifest: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { read_manifest: true }
    }
}

/// A fetcher materializes package content for one content-source kind.
///
/// Implementations are immutable after construction and safe to call
/// concurrently. Calling a fetcher with a source of a different kind is a
/// programming error and fails with `SproutError::SourceMismatch`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// The content-source kind this fetcher handles
    fn kind(&self) -> SourceKind;

    /// Materialize the package described by `source` at `dest` and return a
    /// descriptor for the fetched content
    async fn fetch(
        &self,
        source: &PackageSource,
        dest: &Utf8Path,
        opts: &FetchOptions,
    ) -> FetcherResult<FetchedPackage>;
}

/// Read `package.json` from a fetched package directory.
///
/// A missing manifest is not an error; packages without one exist.
pub(crate) async fn read_manifest(dir: &Utf8Path) -> FetcherResult<Option<PackageManifest>> {
    let manifest_path = dir.join("package.json");
    let bytes = match tokio::fs::read(&manifest_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SproutError::io(
                format!("Failed to read {manifest_path}"),
                e,
            ))
        }
    };

    let manifest = serde_json::from_slice(&bytes).map_err(|e| {
        SproutError::io(
            format!("Failed to parse {manifest_path}"),
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    Ok(Some(manifest))
}

/// Reject a source handed to a fetcher of the wrong kind
pub(crate) fn source_mismatch(fetcher: SourceKind, source: &PackageSource) -> SproutError {
    SproutError::SourceMismatch {
        fetcher,
        source: source.kind(),
    }
}
