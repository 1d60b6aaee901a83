//! The uniform response envelope.
//!
//! Every endpoint answers with
//!
//! ```json
//! {"path": "/lodscan", "parameters": {"dataset": "ds1"}, "result": ..., "time": 0.42}
//! ```
//!
//! or, on failure,
//!
//! ```json
//! {"path": "/lodscan", "parameters": {...}, "error": "...", "details": "...", "time": 0.01}
//! ```
//!
//! Exactly one of `result` and `error` is present. Results are serialized
//! as-is: a scalar stays a scalar and a collection stays an array, whatever
//! its length.

use std::time::Duration;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::QueryParams;

/// Success or failure payload of an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    /// The request failed.
    Failure {
        /// Human-readable message.
        error: String,
        /// Underlying cause.
        details: String,
    },
    /// The request succeeded.
    Success {
        /// The endpoint's result.
        result: Value,
    },
}

/// Uniform JSON wrapper returned by every endpoint.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use qtl2rest_core::{Envelope, QueryParams};
///
/// let params = QueryParams::parse(Some("id=rs123"));
/// let envelope = Envelope::success("/idexists", &params, true.into(), Duration::from_millis(3));
///
/// let json = serde_json::to_value(&envelope).unwrap();
/// assert_eq!(json["result"], true);
/// assert!(json.get("error").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Request path.
    pub path: String,
    /// Echo of the request's query parameters.
    pub parameters: QueryParams,
    /// Result or error.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Elapsed wall-clock seconds.
    pub time: f64,
}

impl Envelope {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(
        path: impl Into<String>,
        parameters: &QueryParams,
        result: Value,
        elapsed: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            parameters: parameters.clone(),
            outcome: Outcome::Success { result },
            time: elapsed.as_secs_f64(),
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn failure(
        path: impl Into<String>,
        parameters: &QueryParams,
        error: impl Into<String>,
        details: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            parameters: parameters.clone(),
            outcome: Outcome::Failure {
                error: error.into(),
                details: details.into(),
            },
            time: elapsed.as_secs_f64(),
        }
    }

    /// Returns `true` for a success envelope.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Returns the result, if this is a success envelope.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success { result } => Some(result),
            Outcome::Failure { .. } => None,
        }
    }

    /// Returns the error message, if this is an error envelope.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { error, .. } => Some(error),
            Outcome::Success { .. } => None,
        }
    }

    /// Returns the error details, if this is an error envelope.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { details, .. } => Some(details),
            Outcome::Success { .. } => None,
        }
    }

    /// HTTP status for this envelope: 200 on success, 400 otherwise.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params() -> QueryParams {
        QueryParams::from_pairs([("dataset", "ds1"), ("id", "x")])
    }

    #[test]
    fn test_success_shape() {
        let envelope = Envelope::success("/lodscan", &params(), json!([1, 2]), Duration::ZERO);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["path"], "/lodscan");
        assert_eq!(json["parameters"], json!({"dataset": "ds1", "id": "x"}));
        assert_eq!(json["result"], json!([1, 2]));
        assert!(json.get("error").is_none());
        assert!(json.get("details").is_none());
        assert_eq!(json["time"], 0.0);
    }

    #[test]
    fn test_failure_shape() {
        let envelope = Envelope::failure(
            "/lodscan",
            &params(),
            "Unable to perform LOD scan",
            "dataset 'x' not found",
            Duration::from_millis(5),
        );
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["error"], "Unable to perform LOD scan");
        assert_eq!(json["details"], "dataset 'x' not found");
        assert!(json.get("result").is_none());
        assert_eq!(envelope.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scalar_result_is_not_wrapped() {
        let envelope = Envelope::success("/idexists", &params(), json!(true), Duration::ZERO);
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(text.contains(r#""result":true"#));
    }

    #[test]
    fn test_single_element_collection_stays_array() {
        let envelope = Envelope::success(
            "/markers",
            &params(),
            json!([{"marker_id": "1_100"}]),
            Duration::ZERO,
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["result"].is_array());
        assert_eq!(json["result"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_null_result_round_trips_as_success() {
        let envelope = Envelope::success("/expression", &params(), Value::Null, Duration::ZERO);
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.result(), Some(&Value::Null));
    }

    #[test]
    fn test_failure_round_trip() {
        let envelope = Envelope::failure("/idexists", &params(), "id is required", "id is required", Duration::ZERO);
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, envelope);
        assert!(parsed.result().is_none());
        assert_eq!(parsed.error(), Some("id is required"));
    }

    proptest! {
        #[test]
        fn prop_round_trip_keeps_exactly_one_outcome(
            success in any::<bool>(),
            message in ".*",
            value in any::<i64>(),
            millis in 0u64..100_000,
        ) {
            let elapsed = Duration::from_millis(millis);
            let envelope = if success {
                Envelope::success("/p", &params(), json!(value), elapsed)
            } else {
                Envelope::failure("/p", &params(), message.clone(), message, elapsed)
            };

            let text = serde_json::to_string(&envelope).unwrap();
            let parsed: Envelope = serde_json::from_str(&text).unwrap();

            prop_assert_eq!(parsed.is_success(), success);
            prop_assert_eq!(parsed.result().is_some(), success);
            prop_assert_eq!(parsed.error().is_some(), !success);
            prop_assert!(parsed.time >= 0.0);
        }
    }
}
