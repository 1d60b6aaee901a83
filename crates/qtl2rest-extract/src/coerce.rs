//! Coercion primitives.

use qtl2rest_core::ApiError;

const TRUTHY: [&str; 5] = ["T", "TRUE", "YES", "Y", "1"];

/// Values that can be interpreted as a boolean flag.
///
/// Numbers are true iff equal to 1. Text is true iff its uppercase form is in
/// the closed set `T`, `TRUE`, `YES`, `Y`, `1`. Absent values are false.
pub trait Truthy {
    /// Interprets the value as a flag.
    fn is_truthy(&self) -> bool;
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        let upper = self.to_uppercase();
        TRUTHY.contains(&upper.as_str())
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        self.as_str().is_truthy()
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self == 1
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        // NaN compares unequal, so it is false.
        (*self - 1.0).abs() < f64::EPSILON
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

/// Interprets a value as a boolean flag. Total: never fails.
///
/// # Example
///
/// ```
/// use qtl2rest_extract::to_boolean;
///
/// assert!(to_boolean("Yes"));
/// assert!(to_boolean(1_i64));
/// assert!(!to_boolean("on"));
/// assert!(!to_boolean(None::<&str>));
/// ```
pub fn to_boolean<T: Truthy>(value: T) -> bool {
    value.is_truthy()
}

/// Returns `default` when `value` is absent, otherwise the value unchanged.
pub fn coalesce<T>(value: Option<T>, default: T) -> T {
    value.unwrap_or(default)
}

/// Parses an integer parameter, falling back to `default` only when absent.
///
/// A present but malformed value is a validation error naming `name`.
///
/// # Example
///
/// ```
/// use qtl2rest_extract::coalesce_int;
///
/// assert_eq!(coalesce_int("window_size", None, 500_000).unwrap(), 500_000);
/// assert_eq!(coalesce_int("window_size", Some("250000"), 500_000).unwrap(), 250_000);
/// assert!(coalesce_int("window_size", Some("wide"), 500_000).is_err());
/// ```
pub fn coalesce_int(name: &str, value: Option<&str>, default: i64) -> Result<i64, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::validation(name, "must be an integer")),
    }
}

/// Parses a floating-point parameter, falling back to `default` only when
/// absent.
pub fn coalesce_float(name: &str, value: Option<&str>, default: f64) -> Result<f64, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => Err(ApiError::validation(name, "must be a number")),
        },
    }
}
