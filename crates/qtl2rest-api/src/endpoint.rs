//! The shared endpoint template.
//!
//! Every route body is a closure from typed parameters to a JSON result.
//! [`respond`] wraps it: time the computation, build the envelope, write it
//! to the response and emit exactly one log line. A request the transport
//! already abandoned is not logged again.

use std::time::Instant;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use qtl2rest_core::{ApiError, ApiResult, Envelope, Request, Response};
use qtl2rest_extract::ParamReader;
use qtl2rest_middleware::HandlerResult;
use qtl2rest_telemetry::RequestLogger;

/// Runs `compute` for `request` and writes the envelope into `response`.
///
/// Parameter errors surface their own message as the envelope `error`; any
/// other failure uses `failure_message` and carries the cause in `details`.
/// The success line records the elapsed seconds, the failure line the
/// request parameters and the cause.
pub fn respond<F>(
    request: &Request,
    response: &mut Response,
    logger: &RequestLogger,
    failure_message: &str,
    compute: F,
) -> HandlerResult
where
    F: FnOnce(&ParamReader<'_>) -> ApiResult<Value>,
{
    let started = Instant::now();
    let params = ParamReader::new(request.query());
    let outcome = compute(&params);
    let elapsed = started.elapsed();

    match outcome {
        Ok(result) => {
            let envelope = Envelope::success(request.path(), request.query(), result, elapsed);
            response.set_json(StatusCode::OK, &envelope)?;
            if request.completion().claim() {
                logger.success(request.path(), elapsed.as_secs_f64());
            }
        }
        Err(err) => {
            let cause = err.to_string();
            let error = if err.is_parameter_error() {
                cause.clone()
            } else {
                failure_message.to_string()
            };
            let envelope =
                Envelope::failure(request.path(), request.query(), error, cause.as_str(), elapsed);
            response.set_json(envelope.status_code(), &envelope)?;
            if request.completion().claim() {
                logger.failure(request.path(), &request.query().to_query_string(), &cause);
            }
        }
    }
    Ok(())
}

/// Serializes a collaborator result.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::domain(e.to_string()))
}
