//! # qtl2rest Middleware
//!
//! Middleware pipeline for qtl2rest request dispatch.
//!
//! A middleware is a pair of optional hooks identified by a unique id. For a
//! pipeline `[M1, M2, .., Mn]` a request runs:
//!
//! ```text
//! M1.pre → M2.pre → … → Mn.pre → handler → Mn.post → … → M2.post → M1.post
//! ```
//!
//! The pipeline is an interpreter over that list rather than a chain of nested
//! closures. It records how many pre-hooks completed and unwinds exactly
//! those post-hooks, in reverse, on every path:
//!
//! - a pre-hook returning [`Flow::Halt`] stops the descent; the handler does
//!   not run
//! - a failing or panicking pre-hook, handler or post-hook is converted into a
//!   400 error envelope and unwinding continues
//!
//! ## Example
//!
//! ```
//! use qtl2rest_core::Request;
//! use qtl2rest_middleware::{HookMiddleware, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .stage(HookMiddleware::new("tag").post(|_req, res| {
//!         res.headers_mut().insert("x-tag", http::HeaderValue::from_static("1"));
//!         Ok(())
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let outcome = pipeline.execute(&Request::get("/datasets"), |_req, res| {
//!     res.set_body("{}").map_err(Into::into)
//! });
//!
//! assert!(outcome.is_clean());
//! assert_eq!(outcome.response().headers()["x-tag"], "1");
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use middleware::{Flow, HandlerResult, HookError, HookMiddleware, Middleware};
pub use pipeline::{
    Pipeline, PipelineBuildError, PipelineBuilder, PipelineFault, PipelineOutcome, Stage,
};
