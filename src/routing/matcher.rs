//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive)
//! - Compile the protected route set once at startup
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Query string never participates in matching
//! - No regex to guarantee O(n) matching; `/x(.*)` patterns are reduced to prefixes

use axum::http::request::Parts;

/// Suffix accepted on configured patterns meaning "followed by anything".
const ANY_SUFFIX: &str = "(.*)";

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Parts) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    ///
    /// A trailing `(.*)` is stripped, so `/dashboard(.*)` and `/dashboard`
    /// compile to the same matcher.
    pub fn new(pattern: impl Into<String>) -> Self {
        let mut prefix = pattern.into();
        if let Some(stripped) = prefix.strip_suffix(ANY_SUFFIX) {
            prefix = stripped.to_string();
        }
        Self { prefix }
    }

    /// The literal prefix, without any `(.*)` suffix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `path` starts with the prefix.
    pub fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Parts) -> bool {
        self.matches_path(req.uri.path())
    }
}

/// The immutable set of routes that require a resolved identity.
#[derive(Debug, Clone, Default)]
pub struct ProtectedRoutes {
    matchers: Vec<PathPrefixMatcher>,
}

impl ProtectedRoutes {
    /// Compile route patterns into prefix matchers.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matchers: patterns.into_iter().map(PathPrefixMatcher::new).collect(),
        }
    }

    /// Returns true if `path` starts with any protected prefix.
    pub fn is_protected(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches_path(path))
    }

    /// Compiled prefixes, in configuration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(PathPrefixMatcher::prefix)
    }
}

impl Matcher for ProtectedRoutes {
    fn matches(&self, req: &Parts) -> bool {
        // Any-of semantics
        self.is_protected(req.uri.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    fn stock() -> ProtectedRoutes {
        ProtectedRoutes::new(["/dashboard(.*)", "/account(.*)", "/transaction(.*)"])
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");
        assert!(matcher.matches(&parts("http://example.com/api/v1")));
        assert!(!matcher.matches(&parts("http://example.com/images")));
    }

    #[test]
    fn test_any_suffix_is_stripped() {
        assert_eq!(PathPrefixMatcher::new("/dashboard(.*)").prefix(), "/dashboard");
        assert_eq!(PathPrefixMatcher::new("/dashboard").prefix(), "/dashboard");
    }

    #[test]
    fn test_protected_prefixes() {
        let routes = stock();
        assert!(routes.is_protected("/dashboard"));
        assert!(routes.is_protected("/dashboard/1"));
        assert!(routes.is_protected("/account/profile"));
        assert!(routes.is_protected("/transaction/new"));
        // Prefix-only: no segment boundary is required.
        assert!(routes.is_protected("/accounts"));
    }

    #[test]
    fn test_unprotected_paths() {
        let routes = stock();
        assert!(!routes.is_protected("/login"));
        assert!(!routes.is_protected("/"));
        assert!(!routes.is_protected("/api/anything"));
        assert!(!routes.is_protected("/Dashboard"));
        assert!(!routes.is_protected("/my/dashboard"));
    }

    #[test]
    fn test_query_string_ignored() {
        let routes = stock();
        assert!(routes.matches(&parts("/dashboard?tab=1")));
        assert!(!routes.matches(&parts("/login?next=/dashboard")));
    }

    #[test]
    fn test_matching_is_stable() {
        let routes = stock();
        for _ in 0..3 {
            assert!(routes.is_protected("/transaction/42"));
        }
    }
}
