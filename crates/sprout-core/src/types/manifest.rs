//! npm registry document types.
//!
//! Covers the packument (the per-package registry document), the per-version
//! manifest, and the dist section describing the published tarball.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Full package document returned by the registry for one package name
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Packument {
    /// Package name
    pub name: String,
    /// Package description
    #[serde(default)]
    pub description: Option<String>,
    /// Dist-tag to version mapping ("latest", "beta", ...)
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// Manifest per published version
    #[serde(default)]
    pub versions: HashMap<String, PackageManifest>,
    /// Publish timestamps, absent from abbreviated documents
    #[serde(default)]
    pub time: Option<HashMap<String, String>>,
}

/// Manifest for one package version, also the shape of package.json
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Main entry point
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub dependencies: Option<HashMap<String, String>>,
    #[serde(rename = "devDependencies", default)]
    pub dev_dependencies: Option<HashMap<String, String>>,
    #[serde(rename = "peerDependencies", default)]
    pub peer_dependencies: Option<HashMap<String, String>>,
    #[serde(rename = "optionalDependencies", default)]
    pub optional_dependencies: Option<HashMap<String, String>>,
    #[serde(default)]
    pub scripts: Option<HashMap<String, String>>,
    /// Distribution information, absent when read from a local package.json
    #[serde(default)]
    pub dist: Option<DistInfo>,
}

/// Distribution information for a published tarball
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistInfo {
    /// Tarball download URL
    pub tarball: String,
    /// SHA-1 checksum (legacy)
    #[serde(default)]
    pub shasum: Option<String>,
    /// Subresource integrity hash (preferred)
    #[serde(default)]
    pub integrity: Option<String>,
    /// Unpacked size in bytes
    #[serde(rename = "unpackedSize", default)]
    pub unpacked_size: Option<u64>,
    /// File count
    #[serde(rename = "fileCount", default)]
    pub file_count: Option<u32>,
}

impl Packument {
    /// Look up the version a dist-tag points at
    pub fn tagged_version(&self, tag: &str) -> Option<&str> {
        self.dist_tags.get(tag).map(String::as_str)
    }
}
