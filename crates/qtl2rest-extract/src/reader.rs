//! Per-request parameter reader.

use qtl2rest_core::{ApiError, QueryParams};

use crate::coerce::{coalesce, coalesce_float, coalesce_int, to_boolean};

/// Typed, named access to a request's query parameters.
///
/// A parameter supplied with an empty value (`?chrom=`) reads as absent.
#[derive(Debug, Clone, Copy)]
pub struct ParamReader<'a> {
    query: &'a QueryParams,
}

impl<'a> ParamReader<'a> {
    /// Wraps a query mapping.
    #[must_use]
    pub fn new(query: &'a QueryParams) -> Self {
        Self { query }
    }

    /// Returns the underlying mapping.
    #[must_use]
    pub fn query(&self) -> &'a QueryParams {
        self.query
    }

    /// Returns the raw value, treating an empty value as absent.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&'a str> {
        self.query.get(name).filter(|v| !v.is_empty())
    }

    /// Returns the value or a missing-parameter error (`"<name> is required"`).
    pub fn required(&self, name: &str) -> Result<&'a str, ApiError> {
        self.optional(name).ok_or_else(|| ApiError::missing(name))
    }

    /// Returns the value or `default`.
    #[must_use]
    pub fn string_or(&self, name: &str, default: &'a str) -> &'a str {
        coalesce(self.optional(name), default)
    }

    /// Interprets the parameter as a flag; absent is `false`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        to_boolean(self.optional(name))
    }

    /// Interprets the parameter as a flag with an explicit default for absence.
    #[must_use]
    pub fn flag_or(&self, name: &str, default: bool) -> bool {
        self.optional(name).map_or(default, to_boolean)
    }

    /// Parses an integer, using `default` when absent.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, ApiError> {
        coalesce_int(name, self.optional(name), default)
    }

    /// Parses a required integer.
    pub fn required_int(&self, name: &str) -> Result<i64, ApiError> {
        let raw = self.required(name)?;
        coalesce_int(name, Some(raw), 0)
    }

    /// Parses a non-negative integer, using `default` when absent.
    pub fn count_or(&self, name: &str, default: usize) -> Result<usize, ApiError> {
        let Some(raw) = self.optional(name) else {
            return Ok(default);
        };
        let value = coalesce_int(name, Some(raw), 0)?;
        usize::try_from(value).map_err(|_| ApiError::validation(name, "must not be negative"))
    }

    /// Parses a number, using `default` when absent.
    pub fn float_or(&self, name: &str, default: f64) -> Result<f64, ApiError> {
        coalesce_float(name, self.optional(name), default)
    }
}
