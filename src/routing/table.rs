//! Route storage and resolution.
//!
//! # Responsibilities
//! - Store `(domain pattern, method, path) -> handler` entries
//! - Enforce uniqueness of `(domain pattern, method)` per path
//! - Resolve the single best entry for an incoming request
//! - Publish mutations atomically to concurrent readers
//!
//! # Design Decisions
//! - Paths are compared by exact string equality
//! - Priority is lexicographic: domain specificity, then method specificity,
//!   then insertion order (earliest wins)
//! - `RouteTable` is copy-on-write: readers load an `Arc` snapshot without
//!   locking, writers clone, mutate and swap under a mutex
//! - A failed mutation publishes nothing

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use axum::http::Method;
use serde::Serialize;

use crate::observability::metrics;
use crate::routing::domain::{normalize_host, DomainPattern, ANY_DOMAIN};
use crate::routing::error::RouteError;
use crate::routing::matcher::{Rank, Specificity};
use crate::routing::method::{MethodFilter, STANDARD_METHODS};

/// Flags for [`RouteTable::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Replace an existing entry with the same domain, method and path.
    /// When false such an insert fails with `DuplicateEntry`.
    pub overwrite: bool,

    /// When adding a concrete-method entry, keep an existing any-method
    /// entry for the same domain and path next to it. When false the
    /// any-method entry is removed.
    pub preserve_any: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            preserve_any: true,
        }
    }
}

/// A single routing entry.
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    domain: DomainPattern,
    method: MethodFilter,
    path: String,
    handler: H,
    seq: u64,
}

impl<H> RouteEntry<H> {
    pub fn domain(&self) -> &DomainPattern {
        &self.domain
    }

    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    fn is_keyed(&self, domain: &str, method: &MethodFilter) -> bool {
        self.domain.as_str() == domain && &self.method == method
    }

    /// Lexicographic priority: domain first, method second.
    fn outranks(&self, other: &Self) -> bool {
        match self.domain.rank(&other.domain) {
            Specificity::MoreSpecific => true,
            Specificity::LessSpecific => false,
            _ => self.method.rank(&other.method) == Specificity::MoreSpecific,
        }
    }
}

/// Handler-free description of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub domain: String,
    pub method: String,
    pub path: String,
}

/// Outcome of resolving a request against the table.
#[derive(Debug, Clone)]
pub enum Resolution<H> {
    /// The highest-priority entry.
    Found(RouteEntry<H>),
    /// Path and domain matched but no entry accepts the method.
    MethodNotAllowed { allowed: Vec<Method> },
    /// Nothing matched the path and domain.
    NotFound,
}

/// Plain route storage. Mutated directly inside [`RouteTable::update`].
#[derive(Debug, Clone)]
pub struct RouteSet<H> {
    paths: HashMap<String, Vec<RouteEntry<H>>>,
    next_seq: u64,
}

impl<H> Default for RouteSet<H> {
    fn default() -> Self {
        Self {
            paths: HashMap::new(),
            next_seq: 0,
        }
    }
}

fn normalize_pattern(domain: &str) -> String {
    domain.trim().to_ascii_lowercase()
}

impl<H: Clone> RouteSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. See [`AddOptions`] for overwrite behavior.
    pub fn add(
        &mut self,
        method: impl Into<MethodFilter>,
        path: &str,
        handler: H,
        domain: &str,
        options: AddOptions,
    ) -> Result<(), RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        let domain = DomainPattern::parse(domain)?;
        let method = method.into();

        let entries = self.paths.entry(path.to_string()).or_default();
        let existing = entries
            .iter()
            .any(|e| e.is_keyed(domain.as_str(), &method));
        if existing && !options.overwrite {
            return Err(RouteError::DuplicateEntry {
                domain: domain.to_string(),
                method: method.to_string(),
                path: path.to_string(),
            });
        }

        // Applies to overwrites as well as fresh inserts
        if !method.is_any() && !options.preserve_any {
            entries.retain(|e| !e.is_keyed(domain.as_str(), &MethodFilter::Any));
        }

        if existing {
            if let Some(entry) = entries
                .iter_mut()
                .find(|e| e.is_keyed(domain.as_str(), &method))
            {
                entry.handler = handler;
            }
            return Ok(());
        }

        entries.push(RouteEntry {
            domain,
            method,
            path: path.to_string(),
            handler,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Remove the entry with exactly this method, path and domain pattern.
    pub fn remove(&mut self, method: impl Into<MethodFilter>, path: &str, domain: &str) -> bool {
        let method = method.into();
        let domain = normalize_pattern(domain);

        let Some(entries) = self.paths.get_mut(path) else {
            return false;
        };
        let Some(index) = entries.iter().position(|e| e.is_keyed(&domain, &method)) else {
            return false;
        };

        entries.remove(index);
        if entries.is_empty() {
            self.paths.remove(path);
        }
        true
    }

    /// Remove every entry whose pattern text equals `pattern`.
    /// Returns the number of removed entries.
    pub fn remove_domain(&mut self, pattern: &str) -> usize {
        let pattern = normalize_pattern(pattern);
        let mut removed = 0;

        self.paths.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| e.domain.as_str() != pattern);
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Exact-pattern lookup used by the management API.
    pub fn get_with_method(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> Option<(MethodFilter, H)> {
        let method = method.into();
        let domain = normalize_pattern(domain);
        let entries = self.paths.get(path)?;

        entries
            .iter()
            .find(|e| e.is_keyed(&domain, &method))
            .or_else(|| {
                match_any
                    .then(|| entries.iter().find(|e| e.is_keyed(&domain, &MethodFilter::Any)))
                    .flatten()
            })
            .map(|e| (e.method.clone(), e.handler.clone()))
    }

    pub fn get(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> Option<H> {
        self.get_with_method(method, path, domain, match_any)
            .map(|(_, handler)| handler)
    }

    /// True if an entry exists for this method (or, with `match_any`, an
    /// any-method entry), path and exact domain pattern.
    pub fn contains(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> bool {
        self.get_with_method(method, path, domain, match_any).is_some()
    }

    pub fn contains_domain(&self, pattern: &str) -> bool {
        let pattern = normalize_pattern(pattern);
        self.entries().any(|e| e.domain.as_str() == pattern)
    }

    /// Resolve a request. `host` is normalized here.
    pub fn resolve(&self, host: &str, method: &Method, path: &str) -> Resolution<H> {
        let host = normalize_host(host);
        let Some(entries) = self.paths.get(path) else {
            return Resolution::NotFound;
        };

        let domain_matched: Vec<&RouteEntry<H>> =
            entries.iter().filter(|e| e.domain.matches(&host)).collect();
        if domain_matched.is_empty() {
            return Resolution::NotFound;
        }

        let candidates: Vec<&RouteEntry<H>> = domain_matched
            .iter()
            .copied()
            .filter(|e| e.method.accepts(method))
            .collect();

        // First entry, in insertion order, that nothing else outranks.
        let best = candidates
            .iter()
            .find(|c| !candidates.iter().any(|other| other.outranks(c)))
            .or_else(|| candidates.first());

        match best {
            Some(entry) => Resolution::Found((*entry).clone()),
            None => Resolution::MethodNotAllowed {
                allowed: allowed_methods(&domain_matched),
            },
        }
    }

    /// Handler of the best entry, if any.
    pub fn lookup(&self, host: &str, method: &Method, path: &str) -> Option<H> {
        match self.resolve(host, method, path) {
            Resolution::Found(entry) => Some(entry.handler),
            _ => None,
        }
    }

    /// All entries in insertion order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut entries: Vec<&RouteEntry<H>> = self.entries().collect();
        entries.sort_by_key(|e| e.seq);
        entries
            .into_iter()
            .map(|e| RouteInfo {
                domain: e.domain.to_string(),
                method: e.method.to_string(),
                path: e.path.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = &RouteEntry<H>> {
        self.paths.values().flatten()
    }
}

fn allowed_methods<H>(entries: &[&RouteEntry<H>]) -> Vec<Method> {
    if entries.iter().any(|e| e.method.is_any()) {
        return STANDARD_METHODS.to_vec();
    }

    let mut allowed: Vec<Method> = Vec::new();
    for entry in entries {
        if let MethodFilter::Exact(m) = &entry.method {
            if !allowed.contains(m) {
                allowed.push(m.clone());
            }
        }
    }
    allowed
}

macro_rules! method_shortcuts {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            #[doc = concat!("Add a `", stringify!($method), "` route on domain `*` with default options.")]
            pub fn $name(&self, path: &str, handler: H) -> Result<(), RouteError> {
                self.add($method, path, handler, ANY_DOMAIN, AddOptions::default())
            }
        )*
    };
}

/// Live, concurrently readable route table.
pub struct RouteTable<H> {
    current: ArcSwap<RouteSet<H>>,
    writer: Mutex<()>,
}

impl<H: Clone> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> RouteTable<H> {
    pub fn new() -> Self {
        Self::from_set(RouteSet::new())
    }

    pub fn from_set(set: RouteSet<H>) -> Self {
        Self {
            current: ArcSwap::from_pointee(set),
            writer: Mutex::new(()),
        }
    }

    /// The current state. Later mutations do not affect the returned value.
    pub fn snapshot(&self) -> Arc<RouteSet<H>> {
        self.current.load_full()
    }

    /// Apply `f` to a copy of the table and publish it if `f` succeeds.
    pub fn try_update<R, E>(
        &self,
        f: impl FnOnce(&mut RouteSet<H>) -> Result<R, E>,
    ) -> Result<R, E> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load_full();
        let mut next = (*current).clone();

        let out = f(&mut next)?;
        metrics::record_route_count(next.len());
        self.current.store(Arc::new(next));
        Ok(out)
    }

    /// Apply several mutations as one atomic change.
    pub fn update<R>(&self, f: impl FnOnce(&mut RouteSet<H>) -> R) -> R {
        match self.try_update(|set| Ok::<R, Infallible>(f(set))) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    pub fn add(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        handler: H,
        domain: &str,
        options: AddOptions,
    ) -> Result<(), RouteError> {
        let method = method.into();
        let result = self.try_update(|set| set.add(method.clone(), path, handler, domain, options));

        match &result {
            Ok(()) => {
                metrics::record_route_mutation("add");
                tracing::debug!(%method, path, domain, "Route added");
            }
            Err(e) => tracing::debug!(%method, path, domain, error = %e, "Route rejected"),
        }
        result
    }

    method_shortcuts! {
        add_get => Method::GET,
        add_post => Method::POST,
        add_put => Method::PUT,
        add_patch => Method::PATCH,
        add_delete => Method::DELETE,
        add_head => Method::HEAD,
        add_options => Method::OPTIONS,
        add_connect => Method::CONNECT,
        add_trace => Method::TRACE,
        add_any => MethodFilter::Any,
    }

    pub fn remove(&self, method: impl Into<MethodFilter>, path: &str, domain: &str) -> bool {
        let method = method.into();
        let removed: Result<bool, bool> = self.try_update(|set| {
            if set.remove(method.clone(), path, domain) {
                Ok(true)
            } else {
                Err(false)
            }
        });

        let removed = removed.unwrap_or_else(|e| e);
        if removed {
            metrics::record_route_mutation("remove");
            tracing::debug!(%method, path, domain, "Route removed");
        }
        removed
    }

    pub fn remove_domain(&self, pattern: &str) -> usize {
        let removed = self.try_update(|set| match set.remove_domain(pattern) {
            0 => Err(0),
            n => Ok(n),
        });

        let removed = removed.unwrap_or_else(|e| e);
        if removed > 0 {
            metrics::record_route_mutation("remove_domain");
            tracing::debug!(pattern, removed, "Domain routes removed");
        }
        removed
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.update(|set| {
            let n = set.len();
            set.clear();
            n
        });
        metrics::record_route_mutation("clear");
        tracing::debug!(removed, "Route table cleared");
        removed
    }

    pub fn contains(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> bool {
        self.current.load().contains(method, path, domain, match_any)
    }

    pub fn contains_domain(&self, pattern: &str) -> bool {
        self.current.load().contains_domain(pattern)
    }

    pub fn get(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> Option<H> {
        self.current.load().get(method, path, domain, match_any)
    }

    pub fn get_with_method(
        &self,
        method: impl Into<MethodFilter>,
        path: &str,
        domain: &str,
        match_any: bool,
    ) -> Option<(MethodFilter, H)> {
        self.current
            .load()
            .get_with_method(method, path, domain, match_any)
    }

    pub fn resolve(&self, host: &str, method: &Method, path: &str) -> Resolution<H> {
        self.current.load().resolve(host, method, path)
    }

    pub fn lookup(&self, host: &str, method: &Method, path: &str) -> Option<H> {
        self.current.load().lookup(host, method, path)
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.current.load().routes()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_OVERWRITE: AddOptions = AddOptions {
        overwrite: false,
        preserve_any: true,
    };
    const DROP_ANY: AddOptions = AddOptions {
        overwrite: true,
        preserve_any: false,
    };

    fn table() -> RouteTable<&'static str> {
        RouteTable::new()
    }

    #[test]
    fn test_exact_domain_beats_mask() {
        let t = table();
        t.add(Method::GET, "/p", "mask", "*.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "exact", "foo.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "any", "*", AddOptions::default()).unwrap();

        assert_eq!(t.lookup("foo.bar", &Method::GET, "/p"), Some("exact"));
        assert_eq!(t.lookup("baz.bar", &Method::GET, "/p"), Some("mask"));
        assert_eq!(t.lookup("other.org", &Method::GET, "/p"), Some("any"));
    }

    #[test]
    fn test_any_method_handler_serves_every_method() {
        let t = table();
        t.add_any("/p", "any").unwrap();
        assert_eq!(t.lookup("example.com", &Method::GET, "/p"), Some("any"));
        assert_eq!(t.lookup("example.com", &Method::DELETE, "/p"), Some("any"));
    }

    #[test]
    fn test_concrete_method_beats_any_on_same_domain() {
        let t = table();
        t.add_any("/p", "any").unwrap();
        t.add_get("/p", "get").unwrap();

        assert_eq!(t.lookup("d", &Method::GET, "/p"), Some("get"));
        // Default options leave the any-method entry in place
        assert_eq!(t.lookup("d", &Method::POST, "/p"), Some("any"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_concrete_method_without_preserve_any_removes_any() {
        let t = table();
        t.add(MethodFilter::Any, "/p", "any", "d.com", AddOptions::default()).unwrap();
        t.add(MethodFilter::Any, "/p", "other", "x.com", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "get", "d.com", DROP_ANY).unwrap();

        assert_eq!(t.lookup("d.com", &Method::GET, "/p"), Some("get"));
        assert!(!t.contains(MethodFilter::Any, "/p", "d.com", false));
        assert!(matches!(
            t.resolve("d.com", &Method::POST, "/p"),
            Resolution::MethodNotAllowed { .. }
        ));
        // Only the same domain is affected
        assert!(t.contains(MethodFilter::Any, "/p", "x.com", false));
    }

    #[test]
    fn test_overwrite_without_preserve_any_removes_any() {
        let t = table();
        t.add(MethodFilter::Any, "/p", "any", "d.com", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "get-v1", "d.com", AddOptions::default()).unwrap();
        assert!(t.contains(MethodFilter::Any, "/p", "d.com", false));

        t.add(Method::GET, "/p", "get-v2", "d.com", DROP_ANY).unwrap();

        assert_eq!(t.lookup("d.com", &Method::GET, "/p"), Some("get-v2"));
        assert!(!t.contains(MethodFilter::Any, "/p", "d.com", false));
        assert!(matches!(
            t.resolve("d.com", &Method::POST, "/p"),
            Resolution::MethodNotAllowed { .. }
        ));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_domain_specificity_before_method_specificity() {
        let t = table();
        t.add(MethodFilter::Any, "/p", "exact-any", "foo.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "mask-get", "*.bar", AddOptions::default()).unwrap();

        assert_eq!(t.lookup("foo.bar", &Method::GET, "/p"), Some("exact-any"));
    }

    #[test]
    fn test_non_matching_methods_are_excluded_before_ranking() {
        let t = table();
        t.add(Method::POST, "/p", "exact-post", "foo.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "mask-get", "*.bar", AddOptions::default()).unwrap();

        assert_eq!(t.lookup("foo.bar", &Method::GET, "/p"), Some("mask-get"));
        assert_eq!(t.lookup("foo.bar", &Method::POST, "/p"), Some("exact-post"));
    }

    #[test]
    fn test_incomparable_domains_tie_break_on_insertion_order() {
        let t = table();
        t.add(Method::GET, "/p", "first", "a.*.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/p", "second", "*.x.bar", AddOptions::default()).unwrap();
        assert_eq!(t.lookup("a.x.bar", &Method::GET, "/p"), Some("first"));

        // Overwrite keeps the original position
        t.add(Method::GET, "/p", "first-v2", "a.*.bar", AddOptions::default()).unwrap();
        assert_eq!(t.lookup("a.x.bar", &Method::GET, "/p"), Some("first-v2"));
    }

    #[test]
    fn test_duplicate_without_overwrite_fails_and_keeps_table() {
        let t = table();
        t.add(Method::GET, "/p", "v1", "*", NO_OVERWRITE).unwrap();
        let before = t.snapshot();

        let err = t.add(Method::GET, "/p", "v2", "*", NO_OVERWRITE).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateEntry { .. }));
        assert_eq!(t.lookup("d", &Method::GET, "/p"), Some("v1"));
        assert!(Arc::ptr_eq(&before, &t.snapshot()));
    }

    #[test]
    fn test_overwrite_replaces_handler() {
        let t = table();
        t.add_get("/p", "v1").unwrap();
        t.add_get("/p", "v2").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(Method::GET, "/p", "*", false), Some("v2"));
    }

    #[test]
    fn test_method_shortcuts_register_on_any_domain() {
        let t = table();
        t.add_connect("/tunnel", "connect").unwrap();
        t.add_trace("/tunnel", "trace").unwrap();

        assert_eq!(t.lookup("example.com", &Method::CONNECT, "/tunnel"), Some("connect"));
        assert_eq!(t.lookup("example.com", &Method::TRACE, "/tunnel"), Some("trace"));
        assert!(t.contains(Method::TRACE, "/tunnel", "*", false));
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let t = table();
        assert_eq!(t.add_get("", "h"), Err(RouteError::EmptyPath));
        assert!(matches!(
            t.add(Method::GET, "/p", "h", "f*o.bar", AddOptions::default()),
            Err(RouteError::InvalidDomainPattern { .. })
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn test_remove() {
        let t = table();
        t.add_get("/p", "get").unwrap();
        t.add_any("/p", "any").unwrap();

        assert!(t.remove(Method::GET, "/p", "*"));
        assert!(!t.remove(Method::GET, "/p", "*"));
        assert!(!t.remove(Method::GET, "/missing", "*"));
        assert_eq!(t.lookup("d", &Method::GET, "/p"), Some("any"));

        assert!(t.remove(MethodFilter::Any, "/p", "*"));
        assert!(t.is_empty());
    }

    #[test]
    fn test_remove_domain_is_textual() {
        let t = table();
        t.add(Method::GET, "/a", "mask-a", "*.bar", AddOptions::default()).unwrap();
        t.add(Method::POST, "/b", "mask-b", "*.bar", AddOptions::default()).unwrap();
        t.add(Method::GET, "/a", "exact", "foo.bar", AddOptions::default()).unwrap();

        assert_eq!(t.remove_domain("*.bar"), 2);
        assert_eq!(t.remove_domain("*.bar"), 0);
        assert!(!t.contains_domain("*.bar"));
        assert!(t.contains_domain("FOO.bar"));
        assert_eq!(t.lookup("foo.bar", &Method::GET, "/a"), Some("exact"));
    }

    #[test]
    fn test_contains_match_any() {
        let t = table();
        t.add(MethodFilter::Any, "/p", "any", "d.com", AddOptions::default()).unwrap();

        assert!(!t.contains(Method::GET, "/p", "d.com", false));
        assert!(t.contains(Method::GET, "/p", "d.com", true));
        assert!(!t.contains(Method::GET, "/p", "other.com", true));
        assert_eq!(
            t.get_with_method(Method::GET, "/p", "d.com", true),
            Some((MethodFilter::Any, "any"))
        );
    }

    #[test]
    fn test_resolve_outcomes() {
        let t = table();
        t.add(Method::GET, "/p", "get", "foo.bar", AddOptions::default()).unwrap();
        t.add(Method::PUT, "/p", "put", "foo.bar", AddOptions::default()).unwrap();

        match t.resolve("FOO.bar:8080", &Method::GET, "/p") {
            Resolution::Found(entry) => {
                assert_eq!(*entry.handler(), "get");
                assert_eq!(entry.domain().as_str(), "foo.bar");
                assert_eq!(entry.path(), "/p");
            }
            other => panic!("expected match, got {other:?}"),
        }

        match t.resolve("foo.bar", &Method::POST, "/p") {
            Resolution::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::PUT]);
            }
            other => panic!("expected 405, got {other:?}"),
        }

        assert!(matches!(t.resolve("baz.bar", &Method::GET, "/p"), Resolution::NotFound));
        assert!(matches!(t.resolve("foo.bar", &Method::GET, "/q"), Resolution::NotFound));
        assert!(matches!(t.resolve("", &Method::GET, "/p"), Resolution::NotFound));
    }

    #[test]
    fn test_routes_listing_in_insertion_order() {
        let t = table();
        t.add_post("/b", "b").unwrap();
        t.add(Method::GET, "/a", "a", "*.example.com", AddOptions::default()).unwrap();
        t.add_any("/b", "any").unwrap();

        let listed = t.routes();
        let summary: Vec<(&str, &str, &str)> = listed
            .iter()
            .map(|r| (r.domain.as_str(), r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("*", "POST", "/b"),
                ("*.example.com", "GET", "/a"),
                ("*", "*", "/b"),
            ]
        );
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let t = table();
        t.add_get("/p", "v1").unwrap();
        let snapshot = t.snapshot();

        t.add_get("/p", "v2").unwrap();
        t.clear();

        assert_eq!(snapshot.lookup("d", &Method::GET, "/p"), Some("v1"));
        assert!(t.lookup("d", &Method::GET, "/p").is_none());
    }

    #[test]
    fn test_try_update_is_all_or_nothing() {
        let t = table();
        t.add_get("/keep", "keep").unwrap();

        let result = t.try_update(|set| {
            set.add(Method::GET, "/new", "new", "*", AddOptions::default())?;
            set.add(Method::GET, "/keep", "dup", "*", NO_OVERWRITE)
        });

        assert!(result.is_err());
        assert!(!t.contains(Method::GET, "/new", "*", false));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let t: Arc<RouteTable<usize>> = Arc::new(RouteTable::new());
        t.add(Method::GET, "/p", 0, "*", AddOptions::default()).unwrap();

        let writers: Vec<_> = (1..=4)
            .map(|i| {
                let t = t.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        t.add(Method::GET, "/p", i * 1000 + n, "*", AddOptions::default())
                            .unwrap();
                        t.add(Method::GET, &format!("/w{i}/{n}"), n, "*", AddOptions::default())
                            .unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            assert!(t.lookup("d", &Method::GET, "/p").is_some());
        }
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(t.len(), 401);
    }

    #[test]
    fn test_clear_reports_removed_entries_atomically() {
        let t: Arc<RouteTable<usize>> = Arc::new(RouteTable::new());
        let writer = {
            let t = t.clone();
            std::thread::spawn(move || {
                for n in 0..500 {
                    t.add(Method::GET, &format!("/r{n}"), n, "*", AddOptions::default())
                        .unwrap();
                }
            })
        };

        let mut cleared = 0;
        for _ in 0..50 {
            cleared += t.clear();
        }
        writer.join().unwrap();
        cleared += t.clear();

        assert_eq!(cleared, 500);
        assert!(t.is_empty());
    }
}
