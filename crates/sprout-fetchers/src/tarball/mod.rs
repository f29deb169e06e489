//! The tarball fetcher family.
//!
//! Remote, git-hosted, and local tarballs share one implementation
//! parameterized by kind: all three verify integrity the same way and extract
//! through the same validated path. The remote and git-hosted entries inject
//! the credential header resolved for the tarball URL.

mod extract;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use camino::Utf8Path;
use sha1::Sha1;
use sha2::{Digest, Sha512};

use sprout_auth::AuthHeaderResolver;
use sprout_core::{FetchedPackage, PackageSource, SourceKind, SproutError};
use sprout_fetch::FetchFromRegistry;

use crate::fetcher::{read_manifest, source_mismatch, FetchOptions, Fetcher};
use crate::FetcherResult;

pub use extract::extract_tarball;

/// Fetcher for one member of the tarball family
pub struct TarballFetcher {
    transport: Arc<FetchFromRegistry>,
    auth: Arc<AuthHeaderResolver>,
    kind: SourceKind,
}

impl TarballFetcher {
    /// Tarballs served by a registry or any plain HTTP(S) URL
    pub fn remote(transport: Arc<FetchFromRegistry>, auth: Arc<AuthHeaderResolver>) -> Self {
        Self {
            transport,
            auth,
            kind: SourceKind::RemoteTarball,
        }
    }

    /// Tarballs served by a git host (codeload and friends)
    pub fn git_hosted(transport: Arc<FetchFromRegistry>, auth: Arc<AuthHeaderResolver>) -> Self {
        Self {
            transport,
            auth,
            kind: SourceKind::GitHostedTarball,
        }
    }

    /// Tarballs already on the local filesystem
    pub fn local(transport: Arc<FetchFromRegistry>, auth: Arc<AuthHeaderResolver>) -> Self {
        Self {
            transport,
            auth,
            kind: SourceKind::LocalTarball,
        }
    }
}

#[async_trait]
impl Fetcher for TarballFetcher {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(
        &self,
        source: &PackageSource,
        dest: &Utf8Path,
        opts: &FetchOptions,
    ) -> FetcherResult<FetchedPackage> {
        let (bytes, integrity, label) = match (self.kind, source) {
            (SourceKind::RemoteTarball, PackageSource::RemoteTarball { url, integrity })
            | (SourceKind::GitHostedTarball, PackageSource::GitHostedTarball { url, integrity }) => {
                let auth_header = self.auth.resolve(url);
                let bytes = self.transport.get_bytes(url, auth_header.as_deref()).await?;
                (bytes, integrity.clone(), url.clone())
            }
            (SourceKind::LocalTarball, PackageSource::LocalTarball { path, integrity }) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| SproutError::io(format!("Failed to read {path}"), e))?;
                (bytes, integrity.clone(), path.to_string())
            }
            _ => return Err(source_mismatch(self.kind, source)),
        };

        if let Some(integrity) = &integrity {
            verify_integrity(&bytes, integrity, &label)?;
        }

        extract_tarball(&bytes[..], dest)?;

        let manifest = if opts.read_manifest {
            read_manifest(dest).await?
        } else {
            None
        };

        Ok(FetchedPackage {
            local_path: dest.to_owned(),
            manifest,
        })
    }
}

/// Verify tarball content against a subresource-integrity string.
///
/// SRI strings list space-separated `algo-base64digest` entries; the
/// strongest supported algorithm wins. Entries with algorithms we do not
/// implement are ignored rather than failed.
fn verify_integrity(bytes: &[u8], integrity: &str, package: &str) -> FetcherResult<()> {
    let entries: Vec<&str> = integrity.split_ascii_whitespace().collect();

    if let Some(expected) = find_digest(&entries, "sha512-") {
        let actual = general_purpose::STANDARD.encode(Sha512::digest(bytes));
        return compare_digest(package, expected, &actual);
    }
    if let Some(expected) = find_digest(&entries, "sha1-") {
        let actual = general_purpose::STANDARD.encode(Sha1::digest(bytes));
        return compare_digest(package, expected, &actual);
    }

    tracing::debug!(package, integrity, "no supported integrity algorithm, skipping check");
    Ok(())
}

fn find_digest<'a>(entries: &[&'a str], prefix: &str) -> Option<&'a str> {
    entries.iter().find_map(|entry| entry.strip_prefix(prefix))
}

fn compare_digest(package: &str, expected: &str, actual: &str) -> FetcherResult<()> {
    if expected != actual {
        return Err(SproutError::IntegrityFailure {
            package: package.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
