//! Built-in middleware stages.

#[cfg(feature = "compression")]
pub mod compression;

#[cfg(feature = "compression")]
pub use compression::{CompressionError, CompressionLevel, CompressionMiddleware};
