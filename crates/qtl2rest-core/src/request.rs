//! Inbound request representation.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};

use crate::{Completion, QueryParams};

/// A parsed inbound request.
///
/// Built once by the transport and read-only for everything downstream.
///
/// # Example
///
/// ```
/// use http::Method;
/// use qtl2rest_core::Request;
///
/// let request = Request::get("/markers?chrom=2");
/// assert_eq!(request.method(), &Method::GET);
/// assert_eq!(request.path(), "/markers");
/// assert_eq!(request.query().get("chrom"), Some("2"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: QueryParams,
    headers: HeaderMap,
    completion: Completion,
}

impl Request {
    /// Creates a request with no query parameters or headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            headers: HeaderMap::new(),
            completion: Completion::new(),
        }
    }

    /// Creates a `GET` request from a path with an optional `?query` suffix.
    #[must_use]
    pub fn get(path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        Self::new(Method::GET, path).with_query(QueryParams::parse(query))
    }

    /// Creates a request from transport-level parts.
    #[must_use]
    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            query: QueryParams::parse(uri.query()),
            headers,
            completion: Completion::new(),
        }
    }

    /// Replaces the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    ///
    /// Only the first field line is returned; see [`header_list`](Self::header_list).
    #[must_use]
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns every field line of a list-valued header joined with `", "`.
    ///
    /// Lines that are not valid UTF-8 are skipped. `None` if no line remains.
    #[must_use]
    pub fn header_list(&self, name: impl http::header::AsHeaderName) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// The answered/abandoned state shared by every clone of this request.
    #[must_use]
    pub fn completion(&self) -> &Completion {
        &self.completion
    }
}
