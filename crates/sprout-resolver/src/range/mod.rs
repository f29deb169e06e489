//! npm version range handling.
//!
//! npm ranges extend the plain semver grammar with `||`-separated
//! alternatives, space-separated comparators, and hyphen ranges. A `RangeSet`
//! normalizes those forms into one `semver::VersionReq` per alternative at
//! parse time, so matching and selection stay pure lookups.

use std::str::FromStr;

use semver::{Version, VersionReq};

use sprout_core::SproutError;

/// A parsed npm range: one or more `||`-separated alternatives
#[derive(Debug, Clone)]
pub struct RangeSet {
    alternatives: Vec<VersionReq>,
}

impl FromStr for RangeSet {
    type Err = SproutError;

    fn from_str(range: &str) -> Result<Self, Self::Err> {
        let mut alternatives = Vec::new();
        for alternative in range.split("||") {
            let alternative = alternative.trim();
            // npm treats an empty range as "any version"
            let req = if alternative.is_empty() {
                VersionReq::STAR
            } else {
                VersionReq::parse(&normalize_alternative(alternative)).map_err(|e| {
                    SproutError::SpecParse {
                        spec: range.to_string(),
                        reason: e.to_string(),
                    }
                })?
            };
            alternatives.push(req);
        }
        Ok(Self { alternatives })
    }
}

impl RangeSet {
    /// Whether any alternative accepts this version
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Highest version from `versions` accepted by any alternative
    pub fn select_best(&self, versions: impl IntoIterator<Item = Version>) -> Option<Version> {
        versions
            .into_iter()
            .filter(|version| self.matches(version))
            .max()
    }
}

/// Rewrite one npm alternative into the comma-separated comparator list the
/// semver crate parses
fn normalize_alternative(alternative: &str) -> String {
    if let Some((low, high)) = alternative.split_once(" - ") {
        return format!(">={}, <={}", low.trim(), high.trim());
    }

    let mut comparators: Vec<String> = Vec::new();
    let mut pending_operator: Option<&str> = None;
    for token in alternative.split_whitespace() {
        // npm allows a space between an operator and its version
        if matches!(token, ">" | "<" | ">=" | "<=" | "=" | "^" | "~") {
            pending_operator = Some(token);
        } else if let Some(operator) = pending_operator.take() {
            comparators.push(format!("{operator}{token}"));
        } else {
            comparators.push(token.to_string());
        }
    }
    comparators.join(", ")
}
