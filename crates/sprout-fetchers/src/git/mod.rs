//! Git repository fetcher.
//!
//! Fetches a repository at a pinned commit through the `git` binary. Hosts in
//! the shallow list get a depth-1 fetch of the commit; everything else gets a
//! full fetch. The resulting checkout is stripped of its `.git` directory.

use async_trait::async_trait;
use camino::Utf8Path;
use tokio::process::Command;
use url::Url;

use sprout_core::{FetchedPackage, PackageSource, SourceKind, SproutError};

use crate::fetcher::{read_manifest, source_mismatch, FetchOptions, Fetcher};
use crate::FetcherResult;

/// Fetcher for git-repository sources
pub struct GitFetcher {
    /// Hosts for which a shallow (depth-1) fetch is requested
    shallow_hosts: Vec<String>,
}

impl GitFetcher {
    pub fn new(shallow_hosts: Vec<String>) -> Self {
        Self { shallow_hosts }
    }

    fn is_shallow_host(&self, repo: &str) -> bool {
        Url::parse(repo)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .is_some_and(|host| {
                self.shallow_hosts
                    .iter()
                    .any(|shallow| shallow.eq_ignore_ascii_case(&host))
            })
    }
}

#[async_trait]
impl Fetcher for GitFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Git
    }

    async fn fetch(
        &self,
        source: &PackageSource,
        dest: &Utf8Path,
        opts: &FetchOptions,
    ) -> FetcherResult<FetchedPackage> {
        let PackageSource::Git { repo, commit } = source else {
            return Err(source_mismatch(SourceKind::Git, source));
        };

        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| SproutError::io(format!("Failed to create {dest}"), e))?;

        run_git(dest, &["init"]).await?;
        run_git(dest, &["remote", "add", "origin", repo]).await?;
        if self.is_shallow_host(repo) {
            tracing::debug!(repo, commit, "shallow-fetching git repository");
            run_git(dest, &["fetch", "--depth", "1", "origin", commit]).await?;
        } else {
            run_git(dest, &["fetch", "origin"]).await?;
        }
        run_git(dest, &["checkout", commit]).await?;

        // Installed packages do not keep their repository metadata
        tokio::fs::remove_dir_all(dest.join(".git"))
            .await
            .map_err(|e| SproutError::io(format!("Failed to remove {}", dest.join(".git")), e))?;

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

/// Run a git subcommand in `cwd`, surfacing stderr on failure
pub(crate) async fn run_git(cwd: &Utf8Path, args: &[&str]) -> FetcherResult<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| SproutError::io("Failed to spawn git".to_string(), e))?;

    if !output.status.success() {
        return Err(SproutError::Git {
            message: format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_host_matching_is_case_insensitive() {
        let fetcher = GitFetcher::new(vec!["github.com".to_string()]);

        assert!(fetcher.is_shallow_host("https://GitHub.com/user/repo.git"));
        assert!(fetcher.is_shallow_host("ssh://git@github.com/user/repo.git"));
        assert!(!fetcher.is_shallow_host("https://gitlab.com/user/repo.git"));
        assert!(!fetcher.is_shallow_host("not a url"));
    }

    #[tokio::test]
    async fn rejects_source_of_wrong_kind() {
        let fetcher = GitFetcher::new(Vec::new());
        let source = PackageSource::Directory {
            path: camino::Utf8PathBuf::from("/somewhere"),
        };

        let result = fetcher
            .fetch(
                &source,
                Utf8Path::new("/tmp/unused"),
                &FetchOptions::default(),
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            SproutError::SourceMismatch { .. }
        ));
    }
}
