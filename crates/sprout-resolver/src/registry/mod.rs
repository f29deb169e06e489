//! Registry-based resolution: packument fetch and version selection.

use base64::{engine::general_purpose, Engine as _};
use semver::Version;

use sprout_core::{
    DistInfo, PackageSource, Packument, RegistrySelector, SproutError, SproutResult,
};

use crate::range::RangeSet;
use crate::{Resolution, ResolveContext, ResolvedVia, Resolver};

/// Accept header for abbreviated packuments
pub(crate) const ABBREVIATED_DOC: &str = "application/vnd.npm.install-v1+json";

impl Resolver {
    /// Resolve a registry specifier: fetch the packument from the registry
    /// responsible for the package, then pick a version per the selector.
    pub(crate) async fn resolve_from_registry(
        &self,
        name: &str,
        selector: Option<&RegistrySelector>,
        ctx: &ResolveContext,
    ) -> SproutResult<Resolution> {
        let registry = self.registry_for(name, ctx);
        let url = packument_url(&registry, name);
        let auth_header = self.auth.resolve(&url);
        let accept = (!self.opts.full_metadata).then_some(ABBREVIATED_DOC);

        tracing::debug!(name, registry, "fetching packument");
        let packument: Packument = match self
            .transport
            .get_json(&url, auth_header.as_deref(), accept)
            .await
        {
            Ok(packument) => packument,
            Err(SproutError::NotFound { .. }) => {
                return Err(SproutError::PackageNotFound {
                    name: name.to_string(),
                })
            }
            Err(other) => return Err(other),
        };

        let version = select_version(name, &packument, selector, &self.opts.default_tag)?;
        let manifest = packument
            .versions
            .get(&version)
            .cloned()
            .ok_or_else(|| SproutError::NoMatchingVersion {
                name: name.to_string(),
                range: version.clone(),
            })?;
        let dist = manifest.dist.as_ref().ok_or_else(|| SproutError::Network {
            message: format!("Registry document for {name}@{version} has no tarball"),
            source: None,
        })?;

        Ok(Resolution {
            id: format!("{name}@{version}"),
            source: PackageSource::RemoteTarball {
                url: dist.tarball.clone(),
                integrity: integrity_of(dist),
            },
            manifest: Some(manifest),
            resolved_via: ResolvedVia::Registry,
        })
    }

    /// Registry responsible for a package: context override, then the scope
    /// map, then the default
    fn registry_for(&self, name: &str, ctx: &ResolveContext) -> String {
        if let Some(registry) = &ctx.registry {
            return registry.clone();
        }
        if name.starts_with('@') {
            if let Some(scope) = name.split('/').next() {
                if let Some(registry) = self.opts.scope_registries.get(scope) {
                    return registry.clone();
                }
            }
        }
        self.opts.default_registry.clone()
    }
}

fn packument_url(registry: &str, name: &str) -> String {
    format!("{}/{}", registry.trim_end_matches('/'), encode_package_name(name))
}

/// Scoped package names keep their `@` but escape the scope separator
fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2f")
    } else {
        name.to_string()
    }
}

fn select_version(
    name: &str,
    packument: &Packument,
    selector: Option<&RegistrySelector>,
    default_tag: &str,
) -> SproutResult<String> {
    let no_match = |range: &str| SproutError::NoMatchingVersion {
        name: name.to_string(),
        range: range.to_string(),
    };

    match selector {
        None => packument
            .tagged_version(default_tag)
            .map(str::to_string)
            .ok_or_else(|| no_match(default_tag)),
        Some(RegistrySelector::Tag(tag)) => packument
            .tagged_version(tag)
            .map(str::to_string)
            .ok_or_else(|| no_match(tag)),
        Some(RegistrySelector::Range(range)) => {
            let range_set: RangeSet = range.parse()?;
            let published = packument
                .versions
                .keys()
                .filter_map(|version| Version::parse(version).ok());
            range_set
                .select_best(published)
                .map(|version| version.to_string())
                .ok_or_else(|| no_match(range))
        }
    }
}

/// Integrity for the dist tarball: the SRI string when published, otherwise
/// the legacy hex shasum rendered as SRI
fn integrity_of(dist: &DistInfo) -> Option<String> {
    if let Some(integrity) = &dist.integrity {
        return Some(integrity.clone());
    }
    let shasum = hex::decode(dist.shasum.as_ref()?).ok()?;
    Some(format!("sha1-{}", general_purpose::STANDARD.encode(shasum)))
}
