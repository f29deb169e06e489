//! The fetcher registry and its two-phase builder.
//!
//! Phase one constructs the complete default fetcher set, every entry wired
//! to the shared transport and credential resolver. Phase two hands that
//! immutable default set to each caller-supplied override factory and merges
//! the replacements into a new registry. Factories are independent: each one
//! observes the original defaults, never another override's output, so a
//! factory can wrap the built-in it replaces.

use std::sync::Arc;

use camino::Utf8Path;

use sprout_auth::AuthHeaderResolver;
use sprout_core::{FetchedPackage, PackageSource, SourceKind};
use sprout_fetch::FetchFromRegistry;

use crate::dir::DirectoryFetcher;
use crate::fetcher::{FetchOptions, Fetcher};
use crate::git::GitFetcher;
use crate::tarball::TarballFetcher;
use crate::FetcherResult;

/// A factory producing the replacement fetcher for one kind, given the
/// complete default registry
pub type FetcherFactory = Box<dyn FnOnce(&FetcherRegistry) -> Arc<dyn Fetcher> + Send>;

/// Caller-supplied override factories, at most one per kind
#[derive(Default)]
pub struct CustomFetchers {
    pub remote_tarball: Option<FetcherFactory>,
    pub local_tarball: Option<FetcherFactory>,
    pub git_hosted_tarball: Option<FetcherFactory>,
    pub git: Option<FetcherFactory>,
    pub directory: Option<FetcherFactory>,
}

/// Options consumed by the default fetchers
#[derive(Debug, Clone, Default)]
pub struct FetcherOptions {
    /// Hosts for which git fetches are shallow
    pub git_shallow_hosts: Vec<String>,
}

/// Immutable mapping from content-source kind to fetcher.
///
/// Holds exactly one fetcher per kind; shared read-only across all fetch
/// operations for the lifetime of the client.
#[derive(Clone)]
pub struct FetcherRegistry {
    remote_tarball: Arc<dyn Fetcher>,
    local_tarball: Arc<dyn Fetcher>,
    git_hosted_tarball: Arc<dyn Fetcher>,
    git: Arc<dyn Fetcher>,
    directory: Arc<dyn Fetcher>,
}

impl FetcherRegistry {
    /// Phase one: build the complete default fetcher set.
    ///
    /// The tarball family shares the transport and credential resolver; the
    /// git fetcher takes the shallow-host list.
    pub fn defaults(
        transport: Arc<FetchFromRegistry>,
        auth: Arc<AuthHeaderResolver>,
        opts: &FetcherOptions,
    ) -> Self {
        Self {
            remote_tarball: Arc::new(TarballFetcher::remote(
                Arc::clone(&transport),
                Arc::clone(&auth),
            )),
            local_tarball: Arc::new(TarballFetcher::local(
                Arc::clone(&transport),
                Arc::clone(&auth),
            )),
            git_hosted_tarball: Arc::new(TarballFetcher::git_hosted(transport, auth)),
            git: Arc::new(GitFetcher::new(opts.git_shallow_hosts.clone())),
            directory: Arc::new(DirectoryFetcher),
        }
    }

    /// Phase two: apply override factories.
    ///
    /// Every factory is invoked with `self`, the untouched default set, and
    /// its return value replaces the entry for its kind in the result. Kinds
    /// without an override keep their default. A factory that panics
    /// propagates to the caller of construction.
    pub fn with_overrides(self, custom: CustomFetchers) -> Self {
        let remote_tarball = custom.remote_tarball.map(|factory| factory(&self));
        let local_tarball = custom.local_tarball.map(|factory| factory(&self));
        let git_hosted_tarball = custom.git_hosted_tarball.map(|factory| factory(&self));
        let git = custom.git.map(|factory| factory(&self));
        let directory = custom.directory.map(|factory| factory(&self));

        Self {
            remote_tarball: remote_tarball.unwrap_or(self.remote_tarball),
            local_tarball: local_tarball.unwrap_or(self.local_tarball),
            git_hosted_tarball: git_hosted_tarball.unwrap_or(self.git_hosted_tarball),
            git: git.unwrap_or(self.git),
            directory: directory.unwrap_or(self.directory),
        }
    }

    /// The fetcher registered for a kind
    pub fn get(&self, kind: SourceKind) -> &Arc<dyn Fetcher> {
        match kind {
            SourceKind::RemoteTarball => &self.remote_tarball,
            SourceKind::LocalTarball => &self.local_tarball,
            SourceKind::GitHostedTarball => &self.git_hosted_tarball,
            SourceKind::Git => &self.git,
            SourceKind::Directory => &self.directory,
        }
    }

    /// Fetch a source with the fetcher registered for its kind
    pub async fn fetch(
        &self,
        source: &PackageSource,
        dest: &Utf8Path,
        opts: &FetchOptions,
    ) -> FetcherResult<FetchedPackage> {
        self.get(source.kind()).fetch(source, dest, opts).await
    }
}

/// Build the final registry: defaults, then overrides
pub fn build_fetchers(
    transport: Arc<FetchFromRegistry>,
    auth: Arc<AuthHeaderResolver>,
    opts: &FetcherOptions,
    custom: CustomFetchers,
) -> FetcherRegistry {
    FetcherRegistry::defaults(transport, auth, opts).with_overrides(custom)
}
