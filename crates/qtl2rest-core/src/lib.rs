//! # qtl2rest Core
//!
//! Core types shared by every qtl2rest crate.
//!
//! - [`Request`] / [`Response`] - the per-request values the pipeline operates on
//! - [`Completion`] - whether the handler or the transport answered a request
//! - [`QueryParams`] - ordered query-parameter mapping (last value wins)
//! - [`Envelope`] - the uniform `{path, parameters, result|error, time}` payload
//! - [`Table`] - named-column results that can be shaped as records or `{columns, data}`
//! - [`ApiError`] - the flat error taxonomy; every kind maps to HTTP 400

#![doc(html_root_url = "https://docs.rs/qtl2rest-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod completion;
mod envelope;
mod error;
mod query;
mod request;
mod response;
mod table;

pub use completion::Completion;
pub use envelope::{Envelope, Outcome};
pub use error::{ApiError, ApiResult, ErrorKind, ResponseError};
pub use query::QueryParams;
pub use request::Request;
pub use response::Response;
pub use table::{Table, TableError};
