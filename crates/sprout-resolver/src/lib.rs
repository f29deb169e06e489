//! Package resolution for the sprout client.
//!
//! The resolver maps a parsed specifier to a concrete package source: registry
//! specs through packument fetch and version selection, git specs through
//! reference pinning, URL and filesystem specs directly. One resolver is built
//! per client over the shared transport and credential resolver and is
//! immutable afterwards, so concurrent resolve calls need no coordination.

pub mod git;
pub mod range;
pub mod registry;

pub use range::RangeSet;

use std::collections::HashMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use sprout_auth::AuthHeaderResolver;
use sprout_core::{PackageManifest, PackageSource, PackageSpecifier, SproutResult};
use sprout_fetch::FetchFromRegistry;

/// Registry used when the caller configures none
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Caller-facing resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Registry used when no scope or context override applies
    pub default_registry: String,
    /// Per-scope registry overrides, keyed by scope ("@acme")
    pub scope_registries: HashMap<String, String>,
    /// Dist-tag used when a registry spec carries no selector
    pub default_tag: String,
    /// Request full packuments instead of abbreviated documents
    pub full_metadata: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_registry: DEFAULT_REGISTRY.to_string(),
            scope_registries: HashMap::new(),
            default_tag: "latest".to_string(),
            full_metadata: false,
        }
    }
}

/// Per-call resolution context
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// Registry overriding both the scope map and the default
    pub registry: Option<String>,
    /// Base directory for relative filesystem specifiers
    pub project_dir: Option<Utf8PathBuf>,
}

/// How a resolution was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    Registry,
    Git,
    LocalFilesystem,
    Url,
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Stable identifier ("name@version" for registry packages)
    pub id: String,
    /// Manifest of the chosen version, when the resolution strategy has one
    pub manifest: Option<PackageManifest>,
    /// Source to hand to the fetcher registry
    pub source: PackageSource,
    pub resolved_via: ResolvedVia,
}

/// Maps package specifiers to concrete package sources.
///
/// Immutable after construction and safe to call concurrently.
pub struct Resolver {
    pub(crate) transport: Arc<FetchFromRegistry>,
    pub(crate) auth: Arc<AuthHeaderResolver>,
    pub(crate) opts: ResolverOptions,
}

impl Resolver {
    /// Build a resolver over a shared transport and credential resolver
    pub fn new(
        transport: Arc<FetchFromRegistry>,
        auth: Arc<AuthHeaderResolver>,
        opts: ResolverOptions,
    ) -> Self {
        Self {
            transport,
            auth,
            opts,
        }
    }

    /// Resolve a specifier to the source a fetcher can materialize
    pub async fn resolve(
        &self,
        spec: &PackageSpecifier,
        ctx: &ResolveContext,
    ) -> SproutResult<Resolution> {
        match spec {
            PackageSpecifier::Registry { name, selector } => {
                self.resolve_from_registry(name, selector.as_ref(), ctx).await
            }
            PackageSpecifier::Tarball { url } => Ok(Resolution {
                id: url.clone(),
                manifest: None,
                source: PackageSource::RemoteTarball {
                    url: url.clone(),
                    integrity: None,
                },
                resolved_via: ResolvedVia::Url,
            }),
            PackageSpecifier::Git { repo, reference } => {
                let commit = git::pin_reference(repo, reference.as_deref()).await?;
                Ok(Resolution {
                    id: format!("{repo}#{commit}"),
                    manifest: None,
                    source: PackageSource::Git {
                        repo: repo.clone(),
                        commit,
                    },
                    resolved_via: ResolvedVia::Git,
                })
            }
            PackageSpecifier::GitHosted {
                owner,
                repo,
                reference,
            } => {
                let clone_url = git::github_clone_url(owner, repo);
                let commit = git::pin_reference(&clone_url, reference.as_deref()).await?;
                Ok(Resolution {
                    id: format!("github:{owner}/{repo}#{commit}"),
                    manifest: None,
                    source: PackageSource::GitHostedTarball {
                        url: git::codeload_url(owner, repo, &commit),
                        integrity: None,
                    },
                    resolved_via: ResolvedVia::Git,
                })
            }
            PackageSpecifier::Directory { path } => {
                let path = anchor_path(path, ctx);
                Ok(Resolution {
                    id: format!("file:{path}"),
                    manifest: None,
                    source: PackageSource::Directory { path },
                    resolved_via: ResolvedVia::LocalFilesystem,
                })
            }
            PackageSpecifier::LocalTarball { path } => {
                let path = anchor_path(path, ctx);
                Ok(Resolution {
                    id: format!("file:{path}"),
                    manifest: None,
                    source: PackageSource::LocalTarball {
                        path,
                        integrity: None,
                    },
                    resolved_via: ResolvedVia::LocalFilesystem,
                })
            }
        }
    }
}

/// Join a relative filesystem specifier to the context project directory
fn anchor_path(path: &Utf8Path, ctx: &ResolveContext) -> Utf8PathBuf {
    match &ctx.project_dir {
        Some(project_dir) if path.is_relative() => project_dir.join(path),
        _ => path.to_owned(),
    }
}
