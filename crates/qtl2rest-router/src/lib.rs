//! # qtl2rest Router
//!
//! Route table mapping an exact `(method, path)` pair to a handler.
//!
//! Paths are fixed strings: there are no parameters, wildcards or prefix
//! matches. Each pair may be registered once; a second registration fails
//! with [`DuplicateRouteError`].
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use qtl2rest_router::Router;
//!
//! let mut router = Router::new();
//! router.register(Method::GET, "/markers", "markers").unwrap();
//! router.register(Method::GET, "/lodscan", "lodscan").unwrap();
//!
//! assert_eq!(router.lookup(&Method::GET, "/markers"), Some(&"markers"));
//! assert!(router.lookup(&Method::GET, "/markers/1").is_none());
//! assert!(router.register(Method::GET, "/markers", "again").is_err());
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod router;

pub use router::{DuplicateRouteError, Route, Router};
