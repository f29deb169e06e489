//! The sprout client facade.
//!
//! `create_client` assembles the protocol-specific fetchers and the package
//! resolver into one immutable [`Client`], built once from a single
//! configuration. Exactly one transport and one credential resolver are
//! derived from the options and shared by every fetcher and the resolver, so
//! fetch-time and resolve-time requests always agree on credentials.
//! `create_resolver` exposes resolver construction alone, wired the same way,
//! for callers that resolve without fetching.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sprout_auth::AuthHeaderResolver;
use sprout_core::SproutResult;
use sprout_fetch::{FetchFromRegistry, TransportOptions};
use sprout_fetchers::{build_fetchers, FetcherOptions};

// Re-export what callers need to configure and drive a client
pub use sprout_core::{
    FetchedPackage, PackageManifest, PackageSource, PackageSpecifier, SourceKind, SproutError,
};
pub use sprout_fetch::RetryPolicy;
pub use sprout_fetchers::{CustomFetchers, FetchOptions, Fetcher, FetcherRegistry};
pub use sprout_resolver::{
    Resolution, ResolveContext, ResolvedVia, Resolver, ResolverOptions,
};

/// Configuration consumed once at client construction
#[derive(Default)]
pub struct ClientOptions {
    /// Global auth settings, keyed by registry prefix
    pub auth_config: HashMap<String, String>,
    /// User-level auth settings, override global entries of equal specificity
    pub user_config: Option<HashMap<String, String>>,
    /// Transport retry policy, defaulted when absent
    pub retry: Option<RetryPolicy>,
    /// Per-request timeout, defaulted when absent
    pub timeout: Option<Duration>,
    /// User agent for every outbound request, defaulted when absent
    pub user_agent: Option<String>,
    /// Hosts for which git fetches are shallow
    pub git_shallow_hosts: Vec<String>,
    /// Resolver configuration
    pub resolver: ResolverOptions,
    /// Override factories, applied after the default fetcher set is complete
    pub custom_fetchers: CustomFetchers,
}

/// Immutable aggregate of one fetcher registry and one resolver.
///
/// Constructed once, never mutated; safe to share by reference across
/// concurrent fetch and resolve operations. There is no shutdown lifecycle.
pub struct Client {
    /// One fetcher per content-source kind
    pub fetchers: FetcherRegistry,
    /// Specifier resolver built over the same transport and credentials
    pub resolver: Resolver,
}

/// Build a client from configuration.
///
/// Construction either fully succeeds or returns an error; no partially
/// constructed client is ever exposed.
pub fn create_client(opts: ClientOptions) -> SproutResult<Client> {
    let transport = Arc::new(build_transport(&opts)?);
    let auth = Arc::new(build_credentials(&opts));

    let fetcher_opts = FetcherOptions {
        git_shallow_hosts: opts.git_shallow_hosts.clone(),
    };
    let fetchers = build_fetchers(
        Arc::clone(&transport),
        Arc::clone(&auth),
        &fetcher_opts,
        opts.custom_fetchers,
    );
    let resolver = Resolver::new(transport, auth, opts.resolver);

    Ok(Client { fetchers, resolver })
}

/// Build a resolver alone, wired exactly as `create_client` wires one
pub fn create_resolver(opts: ClientOptions) -> SproutResult<Resolver> {
    let transport = Arc::new(build_transport(&opts)?);
    let auth = Arc::new(build_credentials(&opts));
    Ok(Resolver::new(transport, auth, opts.resolver))
}

fn build_transport(opts: &ClientOptions) -> SproutResult<FetchFromRegistry> {
    FetchFromRegistry::new(TransportOptions {
        retry: opts.retry.clone(),
        timeout: opts.timeout,
        user_agent: opts.user_agent.clone(),
    })
}

fn build_credentials(opts: &ClientOptions) -> AuthHeaderResolver {
    AuthHeaderResolver::new(&opts.auth_config, opts.user_config.as_ref())
}
