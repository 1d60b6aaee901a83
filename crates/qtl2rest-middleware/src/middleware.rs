//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait. A middleware contributes an
//! optional pre-hook, run before the handler, and an optional post-hook, run
//! after it. Both default to no-ops.

use std::fmt;

use qtl2rest_core::{Request, Response, ResponseError};
use thiserror::Error;

/// Whether the pipeline continues after a pre-hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next pre-hook (or the handler).
    Continue,
    /// The pre-hook wrote a terminal response; stop descending.
    Halt,
}

/// Failure reported by a hook or a handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Creates a hook error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ResponseError> for HookError {
    fn from(err: ResponseError) -> Self {
        Self::new(err.to_string())
    }
}

/// Result returned by handlers run inside the pipeline.
pub type HandlerResult = Result<(), HookError>;

/// The middleware trait.
///
/// # Invariants
///
/// - `id` is unique within a pipeline
/// - `post` runs if and only if `pre` returned [`Flow::Continue`]
/// - hooks run synchronously, one request at a time per worker
pub trait Middleware: Send + Sync + 'static {
    /// Unique identifier of this middleware.
    fn id(&self) -> &str;

    /// Runs before the handler.
    fn pre(&self, _request: &Request, _response: &mut Response) -> Result<Flow, HookError> {
        Ok(Flow::Continue)
    }

    /// Runs after the handler, in reverse registration order.
    fn post(&self, _request: &Request, _response: &mut Response) -> Result<(), HookError> {
        Ok(())
    }
}

type PreHook = Box<dyn Fn(&Request, &mut Response) -> Result<Flow, HookError> + Send + Sync>;
type PostHook = Box<dyn Fn(&Request, &mut Response) -> Result<(), HookError> + Send + Sync>;

/// A middleware assembled from closures.
///
/// # Example
///
/// ```
/// use qtl2rest_middleware::{Flow, HookMiddleware};
///
/// let audit = HookMiddleware::new("audit")
///     .pre(|req, _res| {
///         println!("-> {}", req.path());
///         Ok(Flow::Continue)
///     })
///     .post(|req, res| {
///         println!("<- {} {}", req.path(), res.status());
///         Ok(())
///     });
/// ```
pub struct HookMiddleware {
    id: String,
    pre: Option<PreHook>,
    post: Option<PostHook>,
}

impl HookMiddleware {
    /// Creates a middleware with no hooks.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pre: None,
            post: None,
        }
    }

    /// Sets the pre-hook.
    #[must_use]
    pub fn pre<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> Result<Flow, HookError> + Send + Sync + 'static,
    {
        self.pre = Some(Box::new(hook));
        self
    }

    /// Sets the post-hook.
    #[must_use]
    pub fn post<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.post = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for HookMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMiddleware")
            .field("id", &self.id)
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

impl Middleware for HookMiddleware {
    fn id(&self) -> &str {
        &self.id
    }

    fn pre(&self, request: &Request, response: &mut Response) -> Result<Flow, HookError> {
        match &self.pre {
            Some(hook) => hook(request, response),
            None => Ok(Flow::Continue),
        }
    }

    fn post(&self, request: &Request, response: &mut Response) -> Result<(), HookError> {
        match &self.post {
            Some(hook) => hook(request, response),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_default_hooks_are_no_ops() {
        struct Plain;
        impl Middleware for Plain {
            fn id(&self) -> &str {
                "plain"
            }
        }

        let request = Request::get("/");
        let mut response = Response::new();
        assert_eq!(Plain.pre(&request, &mut response), Ok(Flow::Continue));
        assert_eq!(Plain.post(&request, &mut response), Ok(()));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_hook_middleware_runs_closures() {
        let mw = HookMiddleware::new("teapot")
            .pre(|_req, res| {
                res.set_status(StatusCode::IM_A_TEAPOT);
                Ok(Flow::Halt)
            })
            .post(|_req, _res| Err(HookError::new("post failed")));

        let request = Request::get("/");
        let mut response = Response::new();

        assert_eq!(mw.id(), "teapot");
        assert_eq!(Middleware::pre(&mw, &request, &mut response), Ok(Flow::Halt));
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            Middleware::post(&mw, &request, &mut response).unwrap_err().message(),
            "post failed"
        );
    }

    #[test]
    fn test_hook_middleware_without_hooks() {
        let mw = HookMiddleware::new("empty");
        let request = Request::get("/");
        let mut response = Response::new();
        assert_eq!(Middleware::pre(&mw, &request, &mut response), Ok(Flow::Continue));
        assert!(Middleware::post(&mw, &request, &mut response).is_ok());
        assert!(format!("{mw:?}").contains("empty"));
    }

    #[test]
    fn test_response_error_converts() {
        let err: HookError = ResponseError::AlreadyEncoded.into();
        assert_eq!(err.message(), "response body is already encoded");
    }
}
