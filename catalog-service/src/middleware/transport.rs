//! Error envelopes for rejections raised by the transport layers
//!
//! The tower-http body limit answers 413 with a plain-text body and the
//! timeout layer answers 408 with an empty one. Both are rewritten here so
//! that every error leaves the service as JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::handlers::{ApiError, ApiOperation};

/// `map_response` hook turning bare 408/413 responses into error envelopes
pub async fn envelope_transport_errors(response: Response) -> Response {
    if is_json(&response) {
        return response;
    }

    match response.status() {
        StatusCode::REQUEST_TIMEOUT => ApiError::request_timeout().into_response(),
        StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::payload_too_large(ApiOperation::Route, "length limit exceeded")
                .into_response()
        }
        _ => response,
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}
