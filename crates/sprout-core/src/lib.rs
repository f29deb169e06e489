//! # sprout-core
//!
//! Core types and utilities shared across all sprout crates.
//!
//! This crate provides:
//! - SproutError enum for unified error handling
//! - Registry document types (packuments, manifests, dist info)
//! - PackageSource and SourceKind for the content-source taxonomy
//! - PackageSpecifier parsing for npm-style dependency specifiers

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SproutError, SproutResult};
pub use types::{
    DistInfo, FetchedPackage, PackageManifest, PackageSource, PackageSpecifier, Packument,
    RegistrySelector, SourceKind,
};
