//! Client-side half of the structure state: which origins have been
//! observed to host a Synpatico agent. The endpoint-to-structure and shape
//! caches are already exactly what `synpatico_core::Engine` owns, so the
//! client reuses `Engine` rather than inventing a parallel cache — both
//! peers' caches are identical by construction, so there is no reason for
//! the client to model them differently than the agent does.

use std::collections::HashMap;
use std::sync::RwLock;

use reqwest::{Method, Url};

/// Tracks, per origin, whether it has ever sent `X-Synpatico-Agent`. Single-
/// writer/many-reader via `RwLock`, matching `Engine`'s own caches.
#[derive(Default)]
pub struct OriginCapabilities(RwLock<HashMap<String, bool>>);

impl OriginCapabilities {
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    pub fn is_capable(&self, origin: &str) -> bool {
        self.0
            .read()
            .expect("origin capability lock poisoned")
            .get(origin)
            .copied()
            .unwrap_or(false)
    }

    pub fn mark_capable(&self, origin: &str) {
        self.0
            .write()
            .expect("origin capability lock poisoned")
            .insert(origin.to_string(), true);
    }

    pub fn clear(&self) {
        self.0.write().expect("origin capability lock poisoned").clear();
    }
}

/// The origin component of a URL (scheme + host + explicit/default port),
/// used as the capability-tracking key.
pub fn origin_of(url: &Url) -> String {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    }
}

/// Request-identity key for the endpoint-to-structure cache. Built from
/// origin, method, and path — deliberately excluding the query string,
/// since varying query parameters on an otherwise-identical listing
/// endpoint is exactly the repeated-shape case this protocol optimizes, and
/// the same path on two different origins is not the same endpoint at all.
pub fn endpoint_key(method: &Method, url: &Url) -> String {
    format!("{method} {}{}", origin_of(url), url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_origin_is_not_capable_by_default() {
        let origins = OriginCapabilities::new();
        assert!(!origins.is_capable("https://api.example.com"));
    }

    #[test]
    fn marking_capable_is_observable() {
        let origins = OriginCapabilities::new();
        origins.mark_capable("https://api.example.com");
        assert!(origins.is_capable("https://api.example.com"));
    }

    #[test]
    fn origin_of_includes_explicit_port_only() {
        let with_port = Url::parse("http://localhost:8080/users").unwrap();
        assert_eq!(origin_of(&with_port), "http://localhost:8080");

        let without_port = Url::parse("https://api.example.com/users").unwrap();
        assert_eq!(origin_of(&without_port), "https://api.example.com");
    }

    #[test]
    fn endpoint_key_ignores_query_string() {
        let a = Url::parse("https://api.example.com/users?page=1").unwrap();
        let b = Url::parse("https://api.example.com/users?page=2").unwrap();
        assert_eq!(
            endpoint_key(&Method::GET, &a),
            endpoint_key(&Method::GET, &b)
        );
    }

    #[test]
    fn endpoint_key_distinguishes_origins_with_the_same_path() {
        let a = Url::parse("https://api.example.com/users").unwrap();
        let b = Url::parse("https://other.example.com/users").unwrap();
        assert_ne!(
            endpoint_key(&Method::GET, &a),
            endpoint_key(&Method::GET, &b)
        );
    }
}
