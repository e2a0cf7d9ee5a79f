//! Inclusion filter deciding which requests reach the gatekeeper.
//!
//! # Rules (evaluated in order)
//! 1. Path starts with an always-gated prefix (`/api`, `/trpc`) → gated
//! 2. Path starts with an internal asset prefix (`/_next`) → skipped
//! 3. Last path segment has a static-file extension and the URL has no
//!    query string → skipped
//! 4. Everything else → gated

use axum::http::Uri;

use crate::config::FilterConfig;

#[derive(Debug, Clone)]
pub struct InclusionFilter {
    always_prefixes: Vec<String>,
    internal_prefixes: Vec<String>,
    static_extensions: Vec<String>,
}

impl InclusionFilter {
    /// Build the filter; extensions are lower-cased and stripped of a leading dot.
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            always_prefixes: config.always_prefixes.clone(),
            internal_prefixes: config.internal_prefixes.clone(),
            static_extensions: config
                .static_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Returns true if the gatekeeper must run for this URI.
    pub fn includes(&self, uri: &Uri) -> bool {
        let path = uri.path();

        if self.always_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        if self.internal_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return false;
        }
        if uri.query().is_some() {
            return true;
        }
        !self.is_static(path)
    }

    fn is_static(&self, path: &str) -> bool {
        let segment = path.rsplit('/').next().unwrap_or(path);
        match segment.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.static_extensions.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }
}

impl Default for InclusionFilter {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}
