//! Git reference pinning.
//!
//! Git and hosted-git specifiers carry a symbolic reference (branch, tag) or
//! nothing at all; resolution pins that to an exact commit through
//! `git ls-remote` so the fetch step is reproducible. A reference that is
//! already a full commit id is used as-is without touching the network.

use tokio::process::Command;

use sprout_core::{SproutError, SproutResult};

/// A 40-hex-digit reference is already a full commit id
pub(crate) fn is_commit_sha(reference: &str) -> bool {
    reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

/// Pin a reference to the commit it names on the remote.
///
/// Annotated tags list both the tag object and its peeled commit; the peeled
/// commit wins. A missing reference surfaces as a git error.
pub(crate) async fn pin_reference(repo: &str, reference: Option<&str>) -> SproutResult<String> {
    if let Some(reference) = reference {
        if is_commit_sha(reference) {
            return Ok(reference.to_string());
        }
    }

    let target = reference.unwrap_or("HEAD");
    tracing::debug!(repo, target, "pinning git reference");
    let output = Command::new("git")
        .args(["ls-remote", repo, target])
        .output()
        .await
        .map_err(|e| SproutError::io("Failed to spawn git".to_string(), e))?;

    if !output.status.success() {
        return Err(SproutError::Git {
            message: format!(
                "git ls-remote {repo} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut unpeeled = None;
    for line in stdout.lines() {
        let Some((sha, refname)) = line.split_once('\t') else {
            continue;
        };
        if refname.ends_with("^{}") {
            return Ok(sha.to_string());
        }
        if unpeeled.is_none() {
            unpeeled = Some(sha.to_string());
        }
    }

    unpeeled.ok_or_else(|| SproutError::Git {
        message: format!("Reference '{target}' not found in {repo}"),
    })
}

/// Clone URL for a `github:owner/repo` shorthand
pub(crate) fn github_clone_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{owner}/{repo}.git")
}

/// Tarball URL for a pinned github commit
pub(crate) fn codeload_url(owner: &str, repo: &str, commit: &str) -> String {
    format!("https://codeload.github.com/{owner}/{repo}/tar.gz/{commit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn full_shas_are_recognized() {
        assert!(is_commit_sha(COMMIT));
        assert!(!is_commit_sha("main"));
        assert!(!is_commit_sha("0123456")); // abbreviated shas still need ls-remote
        assert!(!is_commit_sha(&format!("{}g", &COMMIT[..39])));
    }

    #[tokio::test]
    async fn full_sha_references_skip_the_network() {
        let commit = pin_reference("https://invalid.example/repo.git", Some(COMMIT))
            .await
            .unwrap();
        assert_eq!(commit, COMMIT);
    }

    #[test]
    fn codeload_urls_are_commit_pinned() {
        assert_eq!(
            codeload_url("user", "repo", COMMIT),
            format!("https://codeload.github.com/user/repo/tar.gz/{COMMIT}")
        );
        assert_eq!(
            github_clone_url("user", "repo"),
            "https://github.com/user/repo.git"
        );
    }
}
