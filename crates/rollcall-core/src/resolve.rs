//! Fuzzy identity resolution for names typed by hand into different sheets.
//!
//! Each sheet spells people slightly differently: stray punctuation, a
//! dropped letter, an export artifact. Before a name becomes a registry key it
//! is [normalized](normalize_name) and then matched against the canonical
//! names already in the registry.
//!
//! # Scoring
//!
//! The similarity of two names is the indel ratio
//! `2 * LCS(a, b) / (len(a) + len(b))` over characters: `1.0` for identical
//! strings, `0.0` for strings with no character in common.
//!
//! # Decision
//!
//! - ratio `> merge_threshold` (default `0.9`): same person.
//! - ratio in `(advisory_threshold, merge_threshold]` (default
//!   `(0.75, 0.9]`): kept apart, recorded as an [`Advisory`] for review.
//! - otherwise: a new identity.
//!
//! When several candidates clear the merge threshold the highest ratio wins
//! and ties go to the earliest-registered name.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MatchingConfig;

/// Collapse a raw name to its word tokens joined by single spaces.
///
/// Tokens are runs of alphanumeric characters or `_`; everything else
/// (punctuation, tabs, export artifacts) separates tokens.
///
/// ```
/// use rollcall_core::resolve::normalize_name;
///
/// assert_eq!(normalize_name("  O'Brien,  Pat\t"), "O Brien Pat");
/// ```
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Edit-distance based similarity ratio in `[0.0, 1.0]`.
///
/// Two empty strings are identical (`1.0`).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let lcs = lcs_len(&a, &b);
    (2 * lcs) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Single rolling row over `b`.
    let mut row = vec![0_usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// How a raw name was settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The normalized name is already a canonical key (or the registry is empty).
    Exact(String),
    /// Folded into an existing identity by similarity.
    Merged { canonical: String, ratio: f64 },
    /// No candidate was close enough; the normalized name stands on its own.
    New(String),
}

impl Resolution {
    /// The canonical name the caller should key the registry with.
    #[must_use]
    pub fn canonical(&self) -> &str {
        match self {
            Self::Exact(name) | Self::New(name) => name,
            Self::Merged { canonical, .. } => canonical,
        }
    }

    #[must_use]
    pub fn into_canonical(self) -> String {
        match self {
            Self::Exact(name) | Self::New(name) => name,
            Self::Merged { canonical, .. } => canonical,
        }
    }
}

/// A near-miss that was deliberately not merged and needs a human look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    /// The normalized name being resolved.
    pub name: String,
    /// The existing canonical name it resembled.
    pub candidate: String,
    pub ratio: f64,
}

/// Matches raw names against known canonical names.
///
/// The resolver keeps the advisories it raised so the pipeline can report
/// them once the batch is done.
#[derive(Debug, Clone)]
pub struct NameResolver {
    merge_threshold: f64,
    advisory_threshold: f64,
    advisories: Vec<Advisory>,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl NameResolver {
    #[must_use]
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            merge_threshold: config.merge_threshold,
            advisory_threshold: config.advisory_threshold,
            advisories: Vec::new(),
        }
    }

    /// Resolve an already-normalized name against `known`, which must yield
    /// canonical names in registration order.
    pub fn resolve<'a, I>(&mut self, name: &str, known: I) -> Resolution
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(&str, f64)> = None;
        let mut any_known = false;

        for candidate in known {
            any_known = true;
            if candidate == name {
                return Resolution::Exact(name.to_string());
            }
            let ratio = similarity(name, candidate);
            if ratio > self.merge_threshold {
                if best.is_none_or(|(_, r)| ratio > r) {
                    best = Some((candidate, ratio));
                }
            } else if ratio > self.advisory_threshold {
                warn!(
                    name,
                    candidate,
                    ratio,
                    "not merging similar names; review manually"
                );
                self.advisories.push(Advisory {
                    name: name.to_string(),
                    candidate: candidate.to_string(),
                    ratio,
                });
            }
        }

        if !any_known {
            return Resolution::Exact(name.to_string());
        }

        match best {
            Some((canonical, ratio)) => {
                info!(
                    name,
                    canonical,
                    ratio,
                    "merged name into existing identity; does this look right?"
                );
                Resolution::Merged {
                    canonical: canonical.to_string(),
                    ratio,
                }
            }
            None => Resolution::New(name.to_string()),
        }
    }

    /// Advisories raised so far, in the order they were found.
    #[must_use]
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Take the advisories, leaving the resolver's list empty.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_strips_punctuation_and_collapses_space() {
        assert_eq!(normalize_name("John  Smith"), "John Smith");
        assert_eq!(normalize_name("\"John Smith\"*"), "John Smith");
        assert_eq!(normalize_name("J. R. Smith-Jones"), "J R Smith Jones");
        assert_eq!(normalize_name("snake_case 42"), "snake_case 42");
        assert_eq!(normalize_name(" ,;. "), "");
    }

    #[test]
    fn similarity_bounds() {
        assert!(approx(similarity("abc", "abc"), 1.0));
        assert!(approx(similarity("", ""), 1.0));
        assert!(approx(similarity("abc", "xyz"), 0.0));
        assert!(approx(similarity("abc", ""), 0.0));
        // LCS("John Smith", "Jon Smith") = 9 -> 18 / 19
        assert!(approx(similarity("John Smith", "Jon Smith"), 18.0 / 19.0));
    }

    #[test]
    fn empty_registry_returns_name_unchanged() {
        let mut resolver = NameResolver::default();
        let res = resolver.resolve("Ann Lee", std::iter::empty());
        assert_eq!(res, Resolution::Exact("Ann Lee".into()));
    }

    #[test]
    fn exact_match_short_circuits() {
        let mut resolver = NameResolver::default();
        let known = ["Ann Lee", "Bo Chen"];
        let res = resolver.resolve("Bo Chen", known);
        assert_eq!(res, Resolution::Exact("Bo Chen".into()));
        assert!(resolver.advisories().is_empty());
    }

    #[test]
    fn close_spelling_merges() {
        let mut resolver = NameResolver::default();
        let res = resolver.resolve("Jon Smith", ["John Smith"]);
        assert_eq!(res.canonical(), "John Smith");
        assert!(matches!(res, Resolution::Merged { .. }));
    }

    #[test]
    fn advisory_band_does_not_merge() {
        // "Ann Lee" vs "Ann Leeds": LCS 7 -> 14 / 16 = 0.875
        let mut resolver = NameResolver::default();
        let res = resolver.resolve("Ann Lee", ["Ann Leeds"]);
        assert_eq!(res, Resolution::New("Ann Lee".into()));
        assert_eq!(resolver.advisories().len(), 1);
        assert_eq!(resolver.advisories()[0].candidate, "Ann Leeds");
        assert!(approx(resolver.advisories()[0].ratio, 0.875));
    }

    #[test]
    fn unrelated_name_is_new() {
        let mut resolver = NameResolver::default();
        let res = resolver.resolve("Zed Quill", ["Ann Lee"]);
        assert_eq!(res, Resolution::New("Zed Quill".into()));
        assert!(resolver.advisories().is_empty());
    }

    #[test]
    fn highest_ratio_wins_over_first_found() {
        // "Katherine Mills" vs "Katherine Mill" -> 28 / 29 ~ 0.966
        // "Katherine Mills" vs "Katherine Mils" -> 28 / 29 ~ 0.966 (tie)
        // "Katherine Mills" vs "Katherine Millz" -> 28 / 30 ~ 0.933
        let mut resolver = NameResolver::default();
        let res = resolver.resolve(
            "Katherine Mills",
            ["Katherine Millz", "Katherine Mill", "Katherine Mils"],
        );
        assert_eq!(res.canonical(), "Katherine Mill");
    }

    #[test]
    fn take_advisories_drains() {
        let mut resolver = NameResolver::default();
        resolver.resolve("Ann Lee", ["Ann Leeds"]);
        assert_eq!(resolver.take_advisories().len(), 1);
        assert!(resolver.advisories().is_empty());
    }
}
