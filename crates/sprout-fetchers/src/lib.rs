//! Content fetchers for the sprout client.
//!
//! This crate provides one fetcher per content-source kind (the tarball
//! family, git repositories, local directories) and the registry that holds
//! exactly one fetcher per kind. The registry is built in two phases:
//! defaults first, then caller-supplied override factories that each observe
//! the complete default set.

pub mod dir;
pub mod fetcher;
pub mod git;
pub mod registry;
pub mod tarball;

// Re-export main types
pub use dir::DirectoryFetcher;
pub use fetcher::{FetchOptions, Fetcher};
pub use git::GitFetcher;
pub use registry::{build_fetchers, CustomFetchers, FetcherFactory, FetcherOptions, FetcherRegistry};
pub use tarball::TarballFetcher;

use sprout_core::SproutError;

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, SproutError>;
