//! HTTP server.
//!
//! A hyper HTTP/1.1 accept loop over Tokio. Each connection is served on its
//! own task; each request is handed to [`Application::dispatch`] on the
//! blocking pool, so one worker carries one request to completion while the
//! accept loop stays responsive.
//!
//! When the request timeout elapses first, the request is marked abandoned:
//! the worker keeps running but no longer logs, and the timeout envelope is
//! passed through the pipeline's post-hooks before it is sent.
//!
//! # Example
//!
//! ```rust,ignore
//! use qtl2rest_server::{Application, Server};
//!
//! let server = Server::builder(app)
//!     .request_timeout(Some(Duration::from_secs(60)))
//!     .build();
//! server.run("0.0.0.0:8001".parse()?).await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use qtl2rest_core::{Envelope, Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinError;

use crate::app::Application;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Envelope `error` text when a request exceeds the configured timeout.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Envelope `error` text when the worker running a request dies.
pub const WORKER_FAILURE_MESSAGE: &str = "Unable to process request";

/// Type alias for the HTTP response.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// The qtl2rest HTTP server.
pub struct Server {
    app: Arc<Application>,
    request_timeout: Option<Duration>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server builder for `app`.
    #[must_use]
    pub fn builder(app: Application) -> ServerBuilder {
        ServerBuilder::new(app)
    }

    /// The application being served.
    #[must_use]
    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// Binds `addr` and serves until SIGTERM or SIGINT.
    pub async fn run(self, addr: SocketAddr) -> Result<(), ServerError> {
        self.run_with_shutdown(addr, ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds `addr` and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(
        self,
        addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits for open connections to drain.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", local_addr);

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.serve_connection(stream, shutdown).await {
                                    tracing::debug!("Connection error from {}: {}", remote_addr, e);
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let shutdown_timeout = server.shutdown_timeout;
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                // Finish the in-flight request, then close.
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle(&self, req: http::Request<Incoming>) -> HttpResponse {
        let (parts, _body) = req.into_parts();
        let request = Request::from_parts(parts.method, &parts.uri, parts.headers);
        into_http(self.dispatch(request).await)
    }

    /// Runs `request` through the application on the blocking pool,
    /// applying the request timeout.
    pub async fn dispatch(&self, request: Request) -> Response {
        let started = Instant::now();
        let app = Arc::clone(&self.app);
        let worker_request = request.clone();
        let mut task = tokio::task::spawn_blocking(move || app.dispatch(&worker_request));

        let joined = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) if request.completion().abandon() => {
                    return self.timed_out(&request, limit, started);
                }
                // The worker answered while the timer fired.
                Err(_) => task.await,
            },
            None => task.await,
        };

        joined.unwrap_or_else(|e| self.worker_failed(&request, &e, started))
    }

    fn timed_out(&self, request: &Request, limit: Duration, started: Instant) -> Response {
        tracing::warn!(path = request.path(), "request timed out after {:?}", limit);
        let details = format!("no response within {} ms", limit.as_millis());
        self.app
            .logger()
            .failure(request.path(), &request.query().to_query_string(), &details);
        let response = failure_response(request, TIMEOUT_MESSAGE, details, started);
        self.app.finish(request, response)
    }

    fn worker_failed(&self, request: &Request, error: &JoinError, started: Instant) -> Response {
        tracing::error!(path = request.path(), "request worker failed: {}", error);
        let details = error.to_string();
        if request.completion().claim() {
            self.app
                .logger()
                .failure(request.path(), &request.query().to_query_string(), &details);
        }
        let response = failure_response(request, WORKER_FAILURE_MESSAGE, details, started);
        self.app.finish(request, response)
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    app: Application,
    request_timeout: Option<Duration>,
    shutdown_timeout: Duration,
}

impl ServerBuilder {
    /// Creates a builder with no request timeout and a 30 second shutdown
    /// timeout.
    #[must_use]
    pub fn new(app: Application) -> Self {
        Self {
            app,
            request_timeout: None,
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            app: Arc::new(self.app),
            request_timeout: self.request_timeout,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

fn failure_response(
    request: &Request,
    error: &str,
    details: String,
    started: Instant,
) -> Response {
    let envelope = Envelope::failure(
        request.path(),
        request.query(),
        error,
        details,
        started.elapsed(),
    );
    Response::json(StatusCode::BAD_REQUEST, &envelope).unwrap_or_else(|_| {
        let mut response = Response::new();
        response.set_status(StatusCode::BAD_REQUEST);
        response
    })
}

/// Converts a pipeline response into a hyper response.
#[must_use]
pub fn into_http(response: Response) -> HttpResponse {
    let (status, headers, body) = response.into_parts();
    let mut http_response = http::Response::new(Full::new(body));
    *http_response.status_mut() = status;
    *http_response.headers_mut() = headers;
    http_response
}
