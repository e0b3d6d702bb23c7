//! Request tracking middleware
//!
//! Every request gets an ID (kept if the client sent one) which is echoed
//! on the response. Credentials are marked sensitive so they never show up
//! in trace output.

use axum::http::{header, HeaderName};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::config::MiddlewareConfig;

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub const SENSITIVE_HEADERS: [HeaderName; 5] = [
    header::AUTHORIZATION,
    header::COOKIE,
    header::SET_COOKIE,
    HeaderName::from_static("x-api-key"),
    HeaderName::from_static("x-auth-token"),
];

/// Configured request ID header, `x-request-id` when the name is invalid
pub fn request_id_header(config: &MiddlewareConfig) -> HeaderName {
    HeaderName::from_bytes(config.request_id_header.as_bytes()).unwrap_or_else(|_| {
        tracing::warn!(
            header = %config.request_id_header,
            "Invalid request ID header name, using x-request-id"
        );
        X_REQUEST_ID
    })
}

pub fn request_id_layer(header: HeaderName) -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(header, MakeRequestUuid)
}

pub fn request_id_propagation_layer(header: HeaderName) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header)
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS)
}
