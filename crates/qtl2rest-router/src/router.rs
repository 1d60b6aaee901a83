//! Route table.

use std::collections::HashMap;

use http::Method;
use thiserror::Error;

/// Returned when a `(method, path)` pair is registered twice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("route already registered: {method} {path}")]
pub struct DuplicateRouteError {
    /// HTTP method of the rejected route.
    pub method: Method,
    /// Path of the rejected route.
    pub path: String,
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route<H> {
    method: Method,
    path: String,
    handler: H,
}

impl<H> Route<H> {
    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Exact path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Handler registered for this route.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Exact-match route table.
///
/// Routes keep their registration order for listing. Lookup is a single hash
/// lookup on `(method, path)`.
#[derive(Debug, Clone)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
    index: HashMap<(Method, String), usize>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<H> Router<H> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `(method, path)`.
    pub fn register(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> Result<(), DuplicateRouteError> {
        let path = path.into();
        let key = (method.clone(), path.clone());

        if self.index.contains_key(&key) {
            return Err(DuplicateRouteError { method, path });
        }

        self.index.insert(key, self.routes.len());
        self.routes.push(Route {
            method,
            path,
            handler,
        });
        Ok(())
    }

    /// Finds the handler for an exact `(method, path)` match.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&H> {
        self.route(method, path).map(Route::handler)
    }

    /// Finds the route for an exact `(method, path)` match.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<&Route<H>> {
        // Keyed on owned values; the allocation is per lookup.
        let key = (method.clone(), path.to_string());
        self.index.get(&key).map(|&i| &self.routes[i])
    }

    /// Returns `true` if `(method, path)` is registered.
    #[must_use]
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.route(method, path).is_some()
    }

    /// Iterates over routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        let mut router = Router::new();
        router.register(Method::GET, "/datasets", "datasets").unwrap();
        router.register(Method::GET, "/lodscan", "lodscan").unwrap();
        router
    }

    #[test]
    fn test_exact_match() {
        let router = router();
        assert_eq!(router.lookup(&Method::GET, "/lodscan"), Some(&"lodscan"));
        assert_eq!(router.lookup(&Method::GET, "/datasets"), Some(&"datasets"));
    }

    #[test]
    fn test_no_prefix_or_trailing_slash_match() {
        let router = router();
        assert!(router.lookup(&Method::GET, "/lodscan/").is_none());
        assert!(router.lookup(&Method::GET, "/lod").is_none());
        assert!(router.lookup(&Method::GET, "/LODSCAN").is_none());
        assert!(router.lookup(&Method::GET, "/").is_none());
    }

    #[test]
    fn test_method_must_match() {
        let router = router();
        assert!(router.lookup(&Method::POST, "/lodscan").is_none());
        assert!(router.lookup(&Method::HEAD, "/lodscan").is_none());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut router = router();
        let err = router
            .register(Method::GET, "/lodscan", "other")
            .unwrap_err();

        assert_eq!(err.method, Method::GET);
        assert_eq!(err.path, "/lodscan");
        assert_eq!(err.to_string(), "route already registered: GET /lodscan");
        // The original registration is untouched.
        assert_eq!(router.lookup(&Method::GET, "/lodscan"), Some(&"lodscan"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_same_path_different_method_allowed() {
        let mut router = router();
        router.register(Method::POST, "/lodscan", "post").unwrap();
        assert_eq!(router.lookup(&Method::POST, "/lodscan"), Some(&"post"));
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_routes_in_registration_order() {
        let router = router();
        let paths: Vec<_> = router.routes().map(Route::path).collect();
        assert_eq!(paths, vec!["/datasets", "/lodscan"]);
        assert!(router.contains(&Method::GET, "/datasets"));
        assert!(!router.is_empty());
    }
}
