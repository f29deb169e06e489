//! Local directory fetcher.
//!
//! Directory dependencies are used in place: fetching validates that the
//! directory exists and reads its manifest, but copies nothing.

use async_trait::async_trait;
use camino::Utf8Path;

use sprout_core::{FetchedPackage, PackageSource, SourceKind, SproutError};

use crate::fetcher::{read_manifest, source_mismatch, FetchOptions, Fetcher};
use crate::FetcherResult;

/// Fetcher for local-directory sources
pub struct DirectoryFetcher;

#[async_trait]
impl Fetcher for DirectoryFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    async fn fetch(
        &self,
        source: &PackageSource,
        _dest: &Utf8Path,
        opts: &FetchOptions,
    ) -> FetcherResult<FetchedPackage> {
        let PackageSource::Directory { path } = source else {
            return Err(source_mismatch(SourceKind::Directory, source));
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SproutError::io(format!("Failed to read {path}"), e))?;
        if !metadata.is_dir() {
            return Err(SproutError::io(
                format!("{path} is not a directory"),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "expected a directory"),
            ));
        }

        let manifest = if opts.read_manifest {
            read_manifest(path).await?
        } else {
            None
        };

        Ok(FetchedPackage {
            local_path: path.clone(),
            manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn returns_directory_in_place() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::write(
            dir.join("package.json"),
            r#"{ "name": "workspace-pkg", "version": "0.0.1" }"#,
        )
        .unwrap();

        let source = PackageSource::Directory { path: dir.clone() };
        let fetched = DirectoryFetcher
            .fetch(&source, Utf8Path::new("/tmp/unused"), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(fetched.local_path, dir);
        assert_eq!(
            fetched.manifest.unwrap().name.as_deref(),
            Some("workspace-pkg")
        );
    }

    #[tokio::test]
    async fn missing_manifest_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        let source = PackageSource::Directory { path: dir };
        let fetched = DirectoryFetcher
            .fetch(&source, Utf8Path::new("/tmp/unused"), &FetchOptions::default())
            .await
            .unwrap();

        assert!(fetched.manifest.is_none());
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let source = PackageSource::Directory {
            path: Utf8PathBuf::from("/definitely/not/here"),
        };

        let result = DirectoryFetcher
            .fetch(&source, Utf8Path::new("/tmp/unused"), &FetchOptions::default())
            .await;

        assert!(matches!(result.unwrap_err(), SproutError::Io { .. }));
    }
}
