//! Outbound response representation.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;

use crate::ResponseError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A response under construction.
///
/// Created empty (status 200) per request, written by the handler and the
/// middleware post-hooks, then consumed once by the transport.
///
/// Once a body has been content-encoded (see [`Response::set_encoded_body`])
/// it can no longer be replaced through [`Response::set_body`] or
/// [`Response::set_json`].
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    encoded: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            encoded: false,
        }
    }
}

impl Response {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a JSON response.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, ResponseError> {
        let mut response = Self::new();
        response.set_json(status, value)?;
        Ok(response)
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` once the body has been content-encoded.
    #[must_use]
    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> Result<(), ResponseError> {
        if self.encoded {
            return Err(ResponseError::AlreadyEncoded);
        }
        self.body = body.into();
        Ok(())
    }

    /// Serializes `value` as the JSON body and sets the status.
    pub fn set_json<T: Serialize>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), ResponseError> {
        let body = serde_json::to_vec(value)?;
        self.set_body(body)?;
        self.status = status;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Ok(())
    }

    /// Replaces the body with already-encoded bytes and marks the response
    /// pre-encoded.
    pub fn set_encoded_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.encoded = true;
    }

    /// Splits the response into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
