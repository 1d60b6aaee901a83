//! # qtl2rest Extract
//!
//! Typed extraction of query parameters for endpoint handlers.
//!
//! Query values arrive as strings. This crate turns them into typed values with
//! a small, closed set of rules:
//!
//! | Function | Absent | Present |
//! |----------|--------|---------|
//! | [`to_boolean`] | `false` | `true` iff the uppercased text is one of `T`, `TRUE`, `YES`, `Y`, `1` |
//! | [`coalesce`] | default | value unchanged |
//! | [`coalesce_int`] | default | parsed integer, or a validation error when malformed |
//!
//! [`ParamReader`] composes these per parameter name and produces
//! [`ApiError`](qtl2rest_core::ApiError)s with the parameter name attached.
//!
//! ## Example
//!
//! ```rust
//! use qtl2rest_core::QueryParams;
//! use qtl2rest_extract::ParamReader;
//!
//! let query = QueryParams::parse(Some("dataset=ds1&id=Pzp&expand=yes&cores=4"));
//! let params = ParamReader::new(&query);
//!
//! assert_eq!(params.required("dataset").unwrap(), "ds1");
//! assert!(params.flag("expand"));
//! assert_eq!(params.int_or("cores", 0).unwrap(), 4);
//! assert_eq!(params.required("chrom").unwrap_err().to_string(), "chrom is required");
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coerce;
mod reader;

pub use coerce::{coalesce, coalesce_float, coalesce_int, to_boolean, Truthy};
pub use reader::ParamReader;
