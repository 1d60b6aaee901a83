//! # qtl2rest API
//!
//! The genetic-analysis endpoints of qtl2rest.
//!
//! - [`Qtl2Backend`] - the collaborator that resolves datasets and runs analyses
//! - [`MemoryBackend`] - a read-only registry loaded from a JSON snapshot
//! - [`respond`] - the endpoint template shared by every route
//! - [`register_routes`] / [`ROUTES`] - the `GET` route catalogue
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qtl2rest_api::{register_routes, MemoryBackend};
//! use qtl2rest_core::Request;
//! use qtl2rest_server::Application;
//! use qtl2rest_telemetry::RequestLogger;
//!
//! let backend = MemoryBackend::new().with_id("rs123");
//! let logger = RequestLogger::new();
//! let app = register_routes(Application::builder().logger(logger.clone()), Arc::new(backend), &logger)
//!     .unwrap()
//!     .build();
//!
//! let response = app.dispatch(&Request::get("/idexists?id=rs123"));
//! let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
//! assert_eq!(body["result"], true);
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-api/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod backend;
mod dataset;
mod endpoint;
mod error;
mod memory;
mod routes;

pub use backend::{
    CorrelationParams, CorrelationPlotParams, FounderParams, MediateParams, Qtl2Backend,
    RankingParams, SampleScanParams, ScanParams, SnpAssocParams,
};
pub use dataset::{CovarInfo, Dataset, DatasetHandle, Marker};
pub use endpoint::{respond, to_json};
pub use error::SnapshotError;
pub use memory::MemoryBackend;
pub use routes::{
    register_routes, ApiRoute, DEFAULT_MAX_ITEMS, DEFAULT_MAX_VALUE, DEFAULT_WINDOW_SIZE, ROUTES,
};
