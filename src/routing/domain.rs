//! Domain patterns and host matching.
//!
//! # Responsibilities
//! - Parse exact hostnames and wildcard masks (`*.example.com`)
//! - Match a normalized request host against a pattern
//! - Rank two patterns by specificity
//!
//! # Design Decisions
//! - Matching is case-insensitive (patterns and hosts are lowercased)
//! - Patterns are compiled once into a label vector, no regex per request
//! - A leading `*` matches one or more labels, any other `*` exactly one
//! - `*` alone matches every non-empty host and is the least specific pattern

use std::fmt;
use std::str::FromStr;

use crate::routing::error::RouteError;
use crate::routing::matcher::{Rank, Specificity};

/// The match-everything pattern.
pub const ANY_DOMAIN: &str = "*";

const MAX_PATTERN_LEN: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Label {
    Wildcard,
    Literal(String),
}

impl Label {
    fn accepts(&self, host_label: &str) -> bool {
        match self {
            Label::Wildcard => !host_label.is_empty(),
            Label::Literal(literal) => literal == host_label,
        }
    }
}

/// A compiled domain pattern: either an exact hostname or a wildcard mask.
#[derive(Debug, Clone)]
pub struct DomainPattern {
    raw: String,
    labels: Vec<Label>,
}

impl DomainPattern {
    /// Parse and compile a pattern.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let raw = pattern.trim().to_ascii_lowercase();
        let invalid = |reason| RouteError::InvalidDomainPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if raw.len() > MAX_PATTERN_LEN {
            return Err(invalid("pattern is too long"));
        }

        let mut labels = Vec::new();
        for label in raw.split('.') {
            if label.is_empty() {
                return Err(invalid("empty label"));
            }
            if label == "*" {
                labels.push(Label::Wildcard);
                continue;
            }
            if label.contains('*') {
                return Err(invalid("wildcard must span a whole label"));
            }
            if !label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            {
                return Err(invalid("invalid character in label"));
            }
            labels.push(Label::Literal(label.to_string()));
        }

        Ok(Self { raw, labels })
    }

    /// The match-everything pattern `*`.
    pub fn any() -> Self {
        Self {
            raw: ANY_DOMAIN.to_string(),
            labels: vec![Label::Wildcard],
        }
    }

    /// Normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern contains at least one wildcard label.
    pub fn is_mask(&self) -> bool {
        self.labels.contains(&Label::Wildcard)
    }

    /// Match a host already passed through [`normalize_host`].
    pub fn matches(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let host_labels: Vec<&str> = host.split('.').collect();
        match self.labels.split_first() {
            Some((Label::Wildcard, rest)) => {
                if host_labels.len() < self.labels.len() {
                    return false;
                }
                let tail = &host_labels[host_labels.len() - rest.len()..];
                rest.iter().zip(tail).all(|(label, h)| label.accepts(h))
            }
            _ => {
                host_labels.len() == self.labels.len()
                    && self
                        .labels
                        .iter()
                        .zip(&host_labels)
                        .all(|(label, h)| label.accepts(h))
            }
        }
    }
}

impl Rank for DomainPattern {
    /// `a` is more specific than `b` when `b`, used as a mask, matches the
    /// literal text of `a` but not the other way round.
    fn rank(&self, other: &Self) -> Specificity {
        Specificity::from_coverage(self.matches(&other.raw), other.matches(&self.raw))
    }
}

impl PartialEq for DomainPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for DomainPattern {}

impl FromStr for DomainPattern {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize a `Host` value for matching.
///
/// Lowercases, strips a port suffix and a single trailing dot. Bracketed
/// IPv6 literals keep their brackets.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => host,
        }
    };

    without_port
        .strip_suffix('.')
        .unwrap_or(without_port)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> DomainPattern {
        DomainPattern::parse(s).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let p = pattern("Example.COM");
        assert_eq!(p.as_str(), "example.com");
        assert!(!p.is_mask());
        assert!(p.matches("example.com"));
        assert!(!p.matches("www.example.com"));
        assert!(!p.matches("example.org"));
        assert!(!p.matches(""));
    }

    #[test]
    fn test_leading_wildcard_spans_labels() {
        let p = pattern("*.bar");
        assert!(p.is_mask());
        assert!(p.matches("foo.bar"));
        assert!(p.matches("a.b.bar"));
        assert!(!p.matches("bar"));
        assert!(!p.matches("foo.baz"));
    }

    #[test]
    fn test_inner_wildcard_is_single_label() {
        let p = pattern("api.*.example.com");
        assert!(p.matches("api.eu.example.com"));
        assert!(!p.matches("api.eu.west.example.com"));
        assert!(!p.matches("api.example.com"));

        let multi = pattern("*.*.bar");
        assert!(multi.matches("a.b.bar"));
        assert!(multi.matches("x.a.b.bar"));
        assert!(!multi.matches("b.bar"));
    }

    #[test]
    fn test_any_matches_everything_but_empty() {
        let any = DomainPattern::any();
        assert_eq!(any, pattern("*"));
        assert!(any.matches("localhost"));
        assert!(any.matches("deep.sub.domain.example"));
        assert!(!any.matches(""));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["", "foo..bar", "f*o.bar", "foo.bar:8080", "foo bar", ".bar"] {
            let err = DomainPattern::parse(bad).unwrap_err();
            assert!(
                matches!(err, RouteError::InvalidDomainPattern { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rank_exact_beats_mask() {
        assert_eq!(pattern("foo.bar").rank(&pattern("*.bar")), Specificity::MoreSpecific);
        assert_eq!(pattern("*.bar").rank(&pattern("foo.bar")), Specificity::LessSpecific);
        assert_eq!(pattern("foo.bar").rank(&pattern("*")), Specificity::MoreSpecific);
        assert_eq!(pattern("*.bar").rank(&pattern("*")), Specificity::MoreSpecific);
    }

    #[test]
    fn test_rank_fewer_wildcards_wins() {
        assert_eq!(pattern("*.foo.bar").rank(&pattern("*.bar")), Specificity::MoreSpecific);
        assert_eq!(pattern("*.*.bar").rank(&pattern("*.bar")), Specificity::MoreSpecific);
    }

    #[test]
    fn test_rank_equal_and_incomparable() {
        assert_eq!(pattern("foo.bar").rank(&pattern("FOO.bar")), Specificity::Equal);
        assert_eq!(pattern("*").rank(&pattern("*")), Specificity::Equal);
        assert_eq!(pattern("foo.bar").rank(&pattern("baz.bar")), Specificity::Incomparable);
        assert_eq!(
            pattern("a.*.bar").rank(&pattern("*.x.bar")),
            Specificity::Incomparable
        );
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Example.com:8080"), "example.com");
        assert_eq!(normalize_host("example.com."), "example.com");
        assert_eq!(normalize_host("[::1]:443"), "[::1]");
        assert_eq!(normalize_host("localhost"), "localhost");
        assert_eq!(normalize_host(""), "");
    }
}
