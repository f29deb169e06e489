//! Content-source taxonomy.
//!
//! A package can originate from a registry tarball, a git repository, or a
//! local directory; each origin needs a distinct fetch strategy. The set of
//! kinds is closed: a fetcher registry always holds exactly one fetcher per
//! kind, and unknown kinds are unrepresentable.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::PackageManifest;

/// Category of package origin requiring a distinct fetch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Tarball served over HTTP(S), typically from a registry
    RemoteTarball,
    /// Tarball on the local filesystem
    LocalTarball,
    /// Tarball served by a git host (e.g. codeload)
    GitHostedTarball,
    /// Git repository at a pinned commit
    Git,
    /// Local directory used in place
    Directory,
}

impl SourceKind {
    /// All kinds, in registry order
    pub const ALL: [SourceKind; 5] = [
        SourceKind::RemoteTarball,
        SourceKind::LocalTarball,
        SourceKind::GitHostedTarball,
        SourceKind::Git,
        SourceKind::Directory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::RemoteTarball => "remote-tarball",
            SourceKind::LocalTarball => "local-tarball",
            SourceKind::GitHostedTarball => "git-hosted-tarball",
            SourceKind::Git => "git",
            SourceKind::Directory => "directory",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved package source, ready to be handed to a fetcher
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PackageSource {
    RemoteTarball {
        url: String,
        integrity: Option<String>,
    },
    LocalTarball {
        path: Utf8PathBuf,
        integrity: Option<String>,
    },
    GitHostedTarball {
        url: String,
        integrity: Option<String>,
    },
    Git {
        repo: String,
        commit: String,
    },
    Directory {
        path: Utf8PathBuf,
    },
}

impl PackageSource {
    /// The fetch strategy this source requires
    pub fn kind(&self) -> SourceKind {
        match self {
            PackageSource::RemoteTarball { .. } => SourceKind::RemoteTarball,
            PackageSource::LocalTarball { .. } => SourceKind::LocalTarball,
            PackageSource::GitHostedTarball { .. } => SourceKind::GitHostedTarball,
            PackageSource::Git { .. } => SourceKind::Git,
            PackageSource::Directory { .. } => SourceKind::Directory,
        }
    }
}

/// Descriptor for package content materialized by a fetcher
#[derive(Debug, Clone)]
pub struct FetchedPackage {
    /// Where the package content lives on disk
    pub local_path: Utf8PathBuf,
    /// Manifest read from the fetched content, when requested
    pub manifest: Option<PackageManifest>,
}
