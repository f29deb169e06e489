//! Core data types for package resolution and fetching.

mod manifest;
mod source;
mod specifier;

pub use manifest::{DistInfo, PackageManifest, Packument};
pub use source::{FetchedPackage, PackageSource, SourceKind};
pub use specifier::{PackageSpecifier, RegistrySelector};
