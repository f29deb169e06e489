//! npm-style dependency specifier parsing.
//!
//! A specifier is what a user writes in a dependency field: a registry name
//! with an optional range or dist-tag, a tarball URL, a git URL, a hosted-git
//! shorthand, or a local path.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;

use crate::error::SproutError;

/// Version selector part of a registry specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySelector {
    /// A semver range ("^1.2.0", ">=2 <3", "1.x || 2.x")
    Range(String),
    /// A dist-tag ("latest", "beta")
    Tag(String),
}

/// Parsed package specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSpecifier {
    /// Registry package, optionally constrained ("foo", "foo@^1.0.0", "@scope/foo@beta")
    Registry {
        name: String,
        selector: Option<RegistrySelector>,
    },
    /// Tarball at an HTTP(S) URL
    Tarball { url: String },
    /// Git repository ("git+https://...#ref", "git://...")
    Git {
        repo: String,
        reference: Option<String>,
    },
    /// Hosted-git shorthand ("github:owner/repo#ref")
    GitHosted {
        owner: String,
        repo: String,
        reference: Option<String>,
    },
    /// Local directory ("file:../pkg", "link:./pkg")
    Directory { path: Utf8PathBuf },
    /// Local tarball ("file:./pkg-1.0.0.tgz")
    LocalTarball { path: Utf8PathBuf },
}

impl FromStr for PackageSpecifier {
    type Err = SproutError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(parse_error(spec, "specifier is empty"));
        }

        if let Some(rest) = spec.strip_prefix("github:") {
            return parse_github_shorthand(spec, rest);
        }

        if spec.starts_with("git+") || spec.starts_with("git://") {
            let repo_part = spec.strip_prefix("git+").unwrap_or(spec);
            let (repo, reference) = split_git_reference(repo_part);
            if repo.is_empty() {
                return Err(parse_error(spec, "git URL is empty"));
            }
            return Ok(PackageSpecifier::Git {
                repo: repo.to_string(),
                reference,
            });
        }

        if spec.starts_with("http://") || spec.starts_with("https://") {
            return Ok(PackageSpecifier::Tarball {
                url: spec.to_string(),
            });
        }

        if let Some(rest) = spec
            .strip_prefix("file:")
            .or_else(|| spec.strip_prefix("link:"))
        {
            let raw = rest.strip_prefix("//").unwrap_or(rest);
            if raw.is_empty() {
                return Err(parse_error(spec, "local path is empty"));
            }
            let path = Utf8PathBuf::from(raw);
            return Ok(if is_tarball_path(raw) {
                PackageSpecifier::LocalTarball { path }
            } else {
                PackageSpecifier::Directory { path }
            });
        }

        parse_registry_spec(spec)
    }
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageSpecifier::Registry { name, selector } => match selector {
                Some(RegistrySelector::Range(range)) => write!(f, "{name}@{range}"),
                Some(RegistrySelector::Tag(tag)) => write!(f, "{name}@{tag}"),
                None => f.write_str(name),
            },
            PackageSpecifier::Tarball { url } => f.write_str(url),
            PackageSpecifier::Git { repo, reference } => match reference {
                Some(reference) => write!(f, "git+{repo}#{reference}"),
                None => write!(f, "git+{repo}"),
            },
            PackageSpecifier::GitHosted {
                owner,
                repo,
                reference,
            } => match reference {
                Some(reference) => write!(f, "github:{owner}/{repo}#{reference}"),
                None => write!(f, "github:{owner}/{repo}"),
            },
            PackageSpecifier::Directory { path } => write!(f, "file:{path}"),
            PackageSpecifier::LocalTarball { path } => write!(f, "file:{path}"),
        }
    }
}

fn parse_error(spec: &str, reason: &str) -> SproutError {
    SproutError::SpecParse {
        spec: spec.to_string(),
        reason: reason.to_string(),
    }
}

fn split_git_reference(repo_part: &str) -> (&str, Option<String>) {
    match repo_part.split_once('#') {
        Some((repo, reference)) if !reference.is_empty() => (repo, Some(reference.to_string())),
        Some((repo, _)) => (repo, None),
        None => (repo_part, None),
    }
}

fn parse_github_shorthand(spec: &str, rest: &str) -> Result<PackageSpecifier, SproutError> {
    let (repo_path, reference) = split_git_reference(rest);
    let (owner, repo) = repo_path
        .split_once('/')
        .ok_or_else(|| parse_error(spec, "expected github:owner/repo"))?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(parse_error(spec, "expected github:owner/repo"));
    }
    Ok(PackageSpecifier::GitHosted {
        owner: owner.to_string(),
        repo: repo.to_string(),
        reference,
    })
}

fn parse_registry_spec(spec: &str) -> Result<PackageSpecifier, SproutError> {
    // The leading '@' of a scope is not a name/selector separator
    let at = if let Some(stripped) = spec.strip_prefix('@') {
        stripped.find('@').map(|i| i + 1)
    } else {
        spec.find('@')
    };

    let (name, selector) = match at {
        Some(at) => {
            let selector = &spec[at + 1..];
            if selector.is_empty() {
                return Err(parse_error(spec, "selector after '@' is empty"));
            }
            let selector = if looks_like_range(selector) {
                RegistrySelector::Range(selector.to_string())
            } else {
                RegistrySelector::Tag(selector.to_string())
            };
            (&spec[..at], Some(selector))
        }
        None => (spec, None),
    };

    if !is_valid_name(name) {
        return Err(parse_error(spec, "invalid package name"));
    }

    Ok(PackageSpecifier::Registry {
        name: name.to_string(),
        selector,
    })
}

/// Distinguish a semver range from a dist-tag the way npm does: anything a
/// range parser would accept is a range, the rest are tags
fn looks_like_range(selector: &str) -> bool {
    if selector == "x" || selector == "*" || selector.contains("||") || selector.contains(' ') {
        return true;
    }
    let mut chars = selector.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('^' | '~' | '>' | '<' | '=' | '*') => true,
        Some('v') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Check if this is a valid registry package name
pub(crate) fn is_valid_name(name: &str) -> bool {
    let unscoped = match name.strip_prefix('@') {
        Some(rest) => match rest.split_once('/') {
            Some((scope, unscoped)) if !scope.is_empty() => unscoped,
            _ => return false,
        },
        None => name,
    };
    !unscoped.is_empty()
        && !unscoped.starts_with('.')
        && !unscoped.starts_with('_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/'))
}

fn is_tarball_path(path: &str) -> bool {
    path.ends_with(".tgz") || path.ends_with(".tar.gz") || path.ends_with(".tar")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str) -> PackageSpecifier {
        spec.parse().unwrap()
    }

    #[test]
    fn parses_bare_name() {
        assert_eq!(
            parse("lodash"),
            PackageSpecifier::Registry {
                name: "lodash".to_string(),
                selector: None,
            }
        );
    }

    #[test]
    fn parses_name_with_range() {
        assert_eq!(
            parse("lodash@^4.17.0"),
            PackageSpecifier::Registry {
                name: "lodash".to_string(),
                selector: Some(RegistrySelector::Range("^4.17.0".to_string())),
            }
        );
        assert_eq!(
            parse("lodash@1.x || 2.x"),
            PackageSpecifier::Registry {
                name: "lodash".to_string(),
                selector: Some(RegistrySelector::Range("1.x || 2.x".to_string())),
            }
        );
    }

    #[test]
    fn parses_name_with_tag() {
        assert_eq!(
            parse("lodash@next"),
            PackageSpecifier::Registry {
                name: "lodash".to_string(),
                selector: Some(RegistrySelector::Tag("next".to_string())),
            }
        );
    }

    #[test]
    fn parses_scoped_name() {
        assert_eq!(
            parse("@types/node@>=20"),
            PackageSpecifier::Registry {
                name: "@types/node".to_string(),
                selector: Some(RegistrySelector::Range(">=20".to_string())),
            }
        );
        assert_eq!(
            parse("@types/node"),
            PackageSpecifier::Registry {
                name: "@types/node".to_string(),
                selector: None,
            }
        );
    }

    #[test]
    fn parses_tarball_url() {
        assert_eq!(
            parse("https://registry.example.com/foo/-/foo-1.0.0.tgz"),
            PackageSpecifier::Tarball {
                url: "https://registry.example.com/foo/-/foo-1.0.0.tgz".to_string(),
            }
        );
    }

    #[test]
    fn parses_git_url() {
        assert_eq!(
            parse("git+https://github.com/user/repo.git#v1.0.0"),
            PackageSpecifier::Git {
                repo: "https://github.com/user/repo.git".to_string(),
                reference: Some("v1.0.0".to_string()),
            }
        );
        assert_eq!(
            parse("git://host/repo.git"),
            PackageSpecifier::Git {
                repo: "git://host/repo.git".to_string(),
                reference: None,
            }
        );
    }

    #[test]
    fn parses_github_shorthand() {
        assert_eq!(
            parse("github:user/repo#main"),
            PackageSpecifier::GitHosted {
                owner: "user".to_string(),
                repo: "repo".to_string(),
                reference: Some("main".to_string()),
            }
        );
    }

    #[test]
    fn parses_local_paths() {
        assert_eq!(
            parse("file:../sibling"),
            PackageSpecifier::Directory {
                path: Utf8PathBuf::from("../sibling"),
            }
        );
        assert_eq!(
            parse("link:./pkg"),
            PackageSpecifier::Directory {
                path: Utf8PathBuf::from("./pkg"),
            }
        );
        assert_eq!(
            parse("file:./vendored/pkg-1.0.0.tgz"),
            PackageSpecifier::LocalTarball {
                path: Utf8PathBuf::from("./vendored/pkg-1.0.0.tgz"),
            }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("".parse::<PackageSpecifier>().is_err());
        assert!("lodash@".parse::<PackageSpecifier>().is_err());
        assert!("@scope".parse::<PackageSpecifier>().is_err());
        assert!("github:nope".parse::<PackageSpecifier>().is_err());
        assert!("has spaces".parse::<PackageSpecifier>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for spec in [
            "lodash@^4.17.0",
            "@types/node@latest",
            "github:user/repo#main",
            "git+ssh://git@host/repo.git#abc",
        ] {
            assert_eq!(parse(spec).to_string(), spec);
        }
    }
}
