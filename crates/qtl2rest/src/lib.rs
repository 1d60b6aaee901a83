//! # qtl2rest
//!
//! **Read-only HTTP API over a QTL genetic-analysis store**
//!
//! Every endpoint is a `GET` with named query parameters and answers with the
//! same JSON envelope:
//!
//! ```json
//! {"path": "/markers", "parameters": {"chrom": "2"}, "result": [...], "time": 0.003}
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Router ─(no match)→ 404
//!             ↓
//!   gzip.pre → ... → Handler (params → backend → envelope → one log line)
//!                        ↓
//! Response ← gzip.post ← ...
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use qtl2rest::prelude::*;
//!
//! let config = Qtl2RestConfig::default();
//! let backend = MemoryBackend::new().with_id("rs123");
//! let app = qtl2rest::build_app(Arc::new(backend), &config).unwrap();
//!
//! let response = app.dispatch(&Request::get("/idexists?id=rs123"));
//! assert_eq!(response.status(), 200);
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use thiserror::Error;

pub use qtl2rest_api as api;
pub use qtl2rest_config as config;
pub use qtl2rest_core as core;
pub use qtl2rest_extract as extract;
pub use qtl2rest_middleware as middleware;
pub use qtl2rest_router as router;
pub use qtl2rest_server as server;
pub use qtl2rest_telemetry as telemetry;

use qtl2rest_api::{register_routes, MemoryBackend, Qtl2Backend, SnapshotError};
use qtl2rest_config::Qtl2RestConfig;
use qtl2rest_middleware::stages::{CompressionLevel, CompressionMiddleware};
use qtl2rest_middleware::{Pipeline, PipelineBuildError};
use qtl2rest_router::DuplicateRouteError;
use qtl2rest_server::Application;
use qtl2rest_telemetry::RequestLogger;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error assembling the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// A route was registered twice.
    #[error(transparent)]
    Route(#[from] DuplicateRouteError),

    /// The middleware pipeline is invalid.
    #[error(transparent)]
    Pipeline(#[from] PipelineBuildError),
}

/// Builds the application for `config`: the gzip stage when enabled, then
/// every API route.
pub fn build_app(
    backend: Arc<dyn Qtl2Backend>,
    config: &Qtl2RestConfig,
) -> Result<Application, AppError> {
    build_app_with_logger(backend, config, RequestLogger::new())
}

/// Like [`build_app`], with an explicit request logger.
pub fn build_app_with_logger(
    backend: Arc<dyn Qtl2Backend>,
    config: &Qtl2RestConfig,
    logger: RequestLogger,
) -> Result<Application, AppError> {
    let mut pipeline = Pipeline::builder();
    if config.compression.enabled {
        pipeline = pipeline.stage(
            CompressionMiddleware::new()
                .with_level(CompressionLevel::Custom(config.compression.level)),
        );
    }

    let builder = Application::builder()
        .pipeline(pipeline.build()?)
        .logger(logger.clone());
    let app = register_routes(builder, backend, &logger)?.build();

    tracing::debug!(
        compression = config.compression.enabled,
        stages = ?app.pipeline().stage_ids(),
        "application assembled"
    );
    Ok(app)
}

/// Loads the configured snapshot, or an empty registry when none is set.
pub fn load_backend(config: &Qtl2RestConfig) -> Result<MemoryBackend, SnapshotError> {
    match &config.data.snapshot_path {
        Some(path) => MemoryBackend::from_json_file(path),
        None => {
            tracing::warn!("no data.snapshot_path configured, serving an empty registry");
            Ok(MemoryBackend::new())
        }
    }
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use qtl2rest::prelude::*;
/// ```
pub mod prelude {
    pub use qtl2rest_api::{Dataset, DatasetHandle, Marker, MemoryBackend, Qtl2Backend};
    pub use qtl2rest_config::{ConfigLoader, Qtl2RestConfig};
    pub use qtl2rest_core::{ApiError, ApiResult, Envelope, QueryParams, Request, Response, Table};
    pub use qtl2rest_extract::ParamReader;
    pub use qtl2rest_server::{Application, Server, ShutdownSignal};
    pub use qtl2rest_telemetry::{init_logging, LogConfig, RequestLogger};
}
