//! HTTP middleware
//!
//! - [`request_tracking`]: request ID generation/propagation and sensitive header masking
//! - [`panic`]: converts handler panics into the JSON error envelope
//! - [`transport`]: converts body-limit and timeout rejections into the JSON error envelope

pub mod panic;
pub mod request_tracking;
pub mod transport;

pub use panic::{catch_panic_layer, panic_response};
pub use request_tracking::{
    request_id_header, request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    SENSITIVE_HEADERS,
};
pub use transport::envelope_transport_errors;
