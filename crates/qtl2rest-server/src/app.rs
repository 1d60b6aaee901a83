//! Route table plus middleware pipeline.
//!
//! [`Application::dispatch`] is the synchronous core of request handling:
//! look the route up, run its handler inside the pipeline, and report any
//! pipeline fault through the request logger. A request with no matching
//! route gets a 404 without entering the pipeline. Faults of a request the
//! transport already abandoned are traced but not logged.

use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use qtl2rest_core::{Request, Response};
use qtl2rest_middleware::{HandlerResult, Pipeline};
use qtl2rest_router::{DuplicateRouteError, Router};
use qtl2rest_telemetry::RequestLogger;

/// A route handler.
pub type Handler = Arc<dyn Fn(&Request, &mut Response) -> HandlerResult + Send + Sync>;

/// The assembled application: routes, pipeline and logger.
///
/// Immutable once built; share it behind an `Arc`.
pub struct Application {
    router: Router<Handler>,
    pipeline: Pipeline,
    logger: RequestLogger,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .router
            .routes()
            .map(|route| format!("{} {}", route.method(), route.path()))
            .collect();
        f.debug_struct("Application")
            .field("routes", &routes)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl Application {
    /// Creates an application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Handles one request to completion.
    pub fn dispatch(&self, request: &Request) -> Response {
        let Some(handler) = self.router.lookup(request.method(), request.path()) else {
            tracing::debug!(method = %request.method(), path = request.path(), "no route");
            return not_found(request.path());
        };

        let outcome = self
            .pipeline
            .execute(request, |req: &Request, res: &mut Response| handler(req, res));

        if !outcome.is_clean() {
            if request.completion().is_abandoned() {
                for fault in outcome.faults() {
                    tracing::debug!(path = request.path(), "fault after timeout: {}", fault);
                }
            } else {
                request.completion().claim();
                let params = request.query().to_query_string();
                for fault in outcome.faults() {
                    self.logger
                        .failure(request.path(), &params, &fault.to_string());
                }
            }
        }

        outcome.into_response()
    }

    /// Passes a response built outside the pipeline through every
    /// post-hook.
    ///
    /// Used for envelopes the transport writes itself; the request is
    /// assumed to be logged already, so faults are only traced.
    pub fn finish(&self, request: &Request, response: Response) -> Response {
        let outcome = self.pipeline.finish(request, response);
        for fault in outcome.faults() {
            tracing::error!(path = request.path(), "finishing response: {}", fault);
        }
        outcome.into_response()
    }

    /// Whether a route is registered for `(method, path)`.
    #[must_use]
    pub fn has_route(&self, method: &Method, path: &str) -> bool {
        self.router.contains(method, path)
    }

    /// Registered `(method, path)` pairs, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.router
            .routes()
            .map(|route| (route.method(), route.path()))
    }

    /// The middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The request logger.
    #[must_use]
    pub fn logger(&self) -> &RequestLogger {
        &self.logger
    }
}

/// Builder for [`Application`].
///
/// ```
/// use qtl2rest_server::Application;
///
/// let app = Application::builder()
///     .get("/ping", |_req, res| {
///         res.set_body("pong")?;
///         Ok(())
///     })
///     .unwrap()
///     .build();
///
/// let response = app.dispatch(&qtl2rest_core::Request::get("/ping"));
/// assert_eq!(response.body().as_ref(), b"pong");
/// ```
pub struct AppBuilder {
    router: Router<Handler>,
    pipeline: Pipeline,
    logger: RequestLogger,
}

impl fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .router
            .routes()
            .map(|route| format!("{} {}", route.method(), route.path()))
            .collect();
        f.debug_struct("AppBuilder")
            .field("routes", &routes)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Creates a builder with no routes and an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            pipeline: Pipeline::default(),
            logger: RequestLogger::new(),
        }
    }

    /// Sets the middleware pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets the request logger.
    #[must_use]
    pub fn logger(mut self, logger: RequestLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Registers a handler for `(method, path)`.
    pub fn route<F>(mut self, method: Method, path: &str, handler: F) -> Result<Self, DuplicateRouteError>
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.register(method, path, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers a `GET` handler.
    pub fn get<F>(self, path: &str, handler: F) -> Result<Self, DuplicateRouteError>
    where
        F: Fn(&Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Builds the application.
    #[must_use]
    pub fn build(self) -> Application {
        Application {
            router: self.router,
            pipeline: self.pipeline,
            logger: self.logger,
        }
    }
}

/// The response for an unknown `(method, path)`.
#[must_use]
pub fn not_found(path: &str) -> Response {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });
    Response::json(StatusCode::NOT_FOUND, &body).unwrap_or_else(|_| {
        let mut response = Response::new();
        response.set_status(StatusCode::NOT_FOUND);
        response
    })
}
