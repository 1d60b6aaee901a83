//! Gzip compression middleware.
//!
//! The post-hook gzip-encodes the response body when the client asks for it
//! and marks the response pre-encoded. Register it first so it is the
//! outermost layer and sees the fully materialized JSON body.
//!
//! ## Matching rule
//!
//! All `Accept-Encoding` field lines are joined, then split on `,`. For each entry the coding (text before
//! any `;`) is trimmed and compared ASCII case-insensitively with `gzip` or
//! `x-gzip`. An entry whose `q` parameter is `0` does not count. Any other
//! value, including `identity` or an absent header, leaves the response
//! untouched.
//!
//! ## Example
//!
//! ```
//! use qtl2rest_middleware::stages::{CompressionLevel, CompressionMiddleware};
//! use qtl2rest_middleware::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(CompressionMiddleware::new().with_level(CompressionLevel::Best))
//!     .build()
//!     .unwrap();
//! assert_eq!(pipeline.stage_ids(), vec!["gzip"]);
//! ```

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;
use http::{header, HeaderValue};
use qtl2rest_core::{Request, Response};
use thiserror::Error;

use crate::middleware::{HookError, Middleware};

const GZIP: &str = "gzip";

/// Compression level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Fastest compression (lowest ratio).
    Fast,
    /// Default balance of speed and ratio.
    #[default]
    Default,
    /// Best compression ratio (slowest).
    Best,
    /// Custom level, clamped to 0-9.
    Custom(u32),
}

impl CompressionLevel {
    fn to_gzip_level(self) -> GzCompression {
        match self {
            Self::Fast => GzCompression::fast(),
            Self::Default => GzCompression::default(),
            Self::Best => GzCompression::best(),
            Self::Custom(level) => GzCompression::new(level.min(9)),
        }
    }
}

/// Error type for compression operations.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// I/O error while encoding.
    #[error("compression I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CompressionError> for HookError {
    fn from(err: CompressionError) -> Self {
        Self::new(err.to_string())
    }
}

/// Gzip compression middleware.
///
/// # Headers
///
/// - Reads: `Accept-Encoding` from the request
/// - Writes: `Content-Encoding: gzip` and `Vary: Accept-Encoding`
/// - Removes: `Content-Length` (the transport recomputes it)
#[derive(Debug, Clone, Default)]
pub struct CompressionMiddleware {
    level: CompressionLevel,
}

impl CompressionMiddleware {
    /// Creates a compression middleware with the default level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level.
    #[must_use]
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Returns `true` if the `Accept-Encoding` value requests gzip.
    #[must_use]
    pub fn accepts_gzip(header_value: &str) -> bool {
        header_value.split(',').any(|entry| {
            let mut parts = entry.split(';');
            let coding = parts.next().unwrap_or_default().trim();
            if !(coding.eq_ignore_ascii_case(GZIP) || coding.eq_ignore_ascii_case("x-gzip")) {
                return false;
            }

            let quality = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            quality > 0.0
        })
    }

    /// Gzip-encodes `data`.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level.to_gzip_level());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

impl Middleware for CompressionMiddleware {
    fn id(&self) -> &str {
        GZIP
    }

    fn post(&self, request: &Request, response: &mut Response) -> Result<(), HookError> {
        if response.is_encoded() {
            return Ok(());
        }

        let wants_gzip = request
            .header_list(header::ACCEPT_ENCODING)
            .is_some_and(|value| Self::accepts_gzip(&value));
        if !wants_gzip {
            return Ok(());
        }

        let compressed = self.compress(response.body())?;
        tracing::trace!(
            original = response.body().len(),
            compressed = compressed.len(),
            "gzip-encoded response body"
        );

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP));
        headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        headers.remove(header::CONTENT_LENGTH);
        response.set_encoded_body(compressed);

        Ok(())
    }
}
