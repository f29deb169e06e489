//! Registry credential resolution for the sprout client.
//!
//! Auth settings are keyed by registry prefix in npm's nerf-dart form
//! (`//host[:port]/path/`) and map to a complete `Authorization` header
//! value. A request URI resolves to the header of its most specific
//! matching prefix; user-level settings beat global settings for keys of
//! equal specificity. Lookup never fails: a malformed URI or a URI with no
//! matching entry resolves to no header and the request goes out anonymous.

use std::collections::HashMap;

use url::Url;

/// Immutable URI-to-auth-header resolver, derived once from settings
#[derive(Debug, Clone)]
pub struct AuthHeaderResolver {
    /// Global settings, keys normalized to nerf-dart form
    global: HashMap<String, String>,
    /// User-level settings, override global entries of equal specificity
    user: HashMap<String, String>,
}

impl AuthHeaderResolver {
    /// Derive a resolver from global and optional user-level settings.
    ///
    /// Keys may be given in nerf-dart form (`//registry.example.com/`) or as
    /// full URLs; both normalize to the same lookup key. Keys that are
    /// neither are dropped rather than rejected.
    pub fn new(
        all_settings: &HashMap<String, String>,
        user_settings: Option<&HashMap<String, String>>,
    ) -> Self {
        Self {
            global: normalize_settings(all_settings),
            user: user_settings.map(normalize_settings).unwrap_or_default(),
        }
    }

    /// Auth header for a request URI, or `None` for an anonymous request
    pub fn resolve(&self, uri: &str) -> Option<String> {
        for candidate in nerf_dart_candidates(uri)? {
            if let Some(header) = self.user.get(&candidate) {
                return Some(header.clone());
            }
            if let Some(header) = self.global.get(&candidate) {
                return Some(header.clone());
            }
        }
        None
    }
}

fn normalize_settings(settings: &HashMap<String, String>) -> HashMap<String, String> {
    settings
        .iter()
        .filter_map(|(key, header)| Some((normalize_key(key)?, header.clone())))
        .collect()
}

fn normalize_key(key: &str) -> Option<String> {
    if let Some(rest) = key.strip_prefix("//") {
        if rest.is_empty() {
            return None;
        }
        let mut normalized = format!("//{}", rest.trim_end_matches('/'));
        normalized.push('/');
        Some(normalized)
    } else {
        nerf_dart(key)
    }
}

/// Convert a URL to its nerf-dart registry prefix: scheme dropped, host and
/// port kept, path truncated to its directory, trailing slash guaranteed.
///
/// ```
/// assert_eq!(
///     sprout_auth::nerf_dart("https://registry.example.com/prefix/pkg.tgz").as_deref(),
///     Some("//registry.example.com/prefix/")
/// );
/// ```
pub fn nerf_dart(uri: &str) -> Option<String> {
    nerf_dart_candidates(uri)?.into_iter().next()
}

/// All nerf-dart prefixes matching a URI, most specific first
fn nerf_dart_candidates(uri: &str) -> Option<Vec<String>> {
    let url = Url::parse(uri).ok()?;
    let host = url.host_str()?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    // Only directories scope credentials; the final path segment of a
    // non-directory URI is the requested file
    if !url.path().ends_with('/') {
        segments.pop();
    }

    let mut candidates = Vec::with_capacity(segments.len() + 1);
    for depth in (0..=segments.len()).rev() {
        let mut candidate = format!("//{authority}/");
        for segment in &segments[..depth] {
            candidate.push_str(segment);
            candidate.push('/');
        }
        candidates.push(candidate);
    }
    Some(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_exact_host_entry() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("//registry.example.com/", "Bearer abc")]),
            None,
        );

        assert_eq!(
            resolver.resolve("https://registry.example.com/pkg.tgz"),
            Some("Bearer abc".to_string())
        );
        assert_eq!(
            resolver.resolve("https://registry.example.com/"),
            Some("Bearer abc".to_string())
        );
    }

    #[test]
    fn most_specific_prefix_wins() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[
                ("//registry.example.com/", "Bearer global"),
                ("//registry.example.com/scoped/", "Bearer scoped"),
            ]),
            None,
        );

        assert_eq!(
            resolver.resolve("https://registry.example.com/scoped/pkg.tgz"),
            Some("Bearer scoped".to_string())
        );
        assert_eq!(
            resolver.resolve("https://registry.example.com/other/pkg.tgz"),
            Some("Bearer global".to_string())
        );
    }

    #[test]
    fn user_settings_beat_global_for_equal_keys() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("//registry.example.com/", "Bearer global")]),
            Some(&settings(&[("//registry.example.com/", "Bearer user")])),
        );

        assert_eq!(
            resolver.resolve("https://registry.example.com/pkg.tgz"),
            Some("Bearer user".to_string())
        );
    }

    #[test]
    fn no_matching_entry_is_anonymous() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("//registry.example.com/", "Bearer abc")]),
            None,
        );

        assert_eq!(resolver.resolve("https://other.example.com/pkg.tgz"), None);
    }

    #[test]
    fn malformed_uri_is_anonymous() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("//registry.example.com/", "Bearer abc")]),
            None,
        );

        assert_eq!(resolver.resolve("not a uri"), None);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("file:../local"), None);
    }

    #[test]
    fn ports_are_part_of_the_key() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("//registry.example.com:8080/", "Bearer ported")]),
            None,
        );

        assert_eq!(
            resolver.resolve("https://registry.example.com:8080/pkg.tgz"),
            Some("Bearer ported".to_string())
        );
        assert_eq!(resolver.resolve("https://registry.example.com/pkg.tgz"), None);
    }

    #[test]
    fn full_url_keys_normalize() {
        let resolver = AuthHeaderResolver::new(
            &settings(&[("https://registry.example.com/prefix/", "Bearer abc")]),
            None,
        );

        assert_eq!(
            resolver.resolve("https://registry.example.com/prefix/pkg.tgz"),
            Some("Bearer abc".to_string())
        );
    }

    #[test]
    fn nerf_dart_truncates_to_directory() {
        assert_eq!(
            nerf_dart("https://registry.example.com/a/b/pkg.tgz").as_deref(),
            Some("//registry.example.com/a/b/")
        );
        assert_eq!(
            nerf_dart("https://registry.example.com/a/b/").as_deref(),
            Some("//registry.example.com/a/b/")
        );
        assert_eq!(nerf_dart("nope"), None);
    }
}
