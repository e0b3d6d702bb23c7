//! Success envelopes for REST handlers
//!
//! Three shapes leave a handler on success:
//!
//! - [`Envelope`]: `{status, code, message, data}`, optionally with the
//!   rate-limit `headers` echo
//! - [`PaginatedEnvelope`]: `{status, code, message, count, next, previous, results}`
//! - [`NoContent`]: bare 204
//!
//! ```rust
//! use catalog_service::handlers::{Envelope, ProductsData};
//!
//! let envelope = Envelope::ok("Products retrieved successfully", ProductsData::default());
//! assert_eq!(envelope.code, 200);
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::rate_limit::RateLimitInfo;
use crate::pagination::Page;

const SUCCESS: &str = "success";

/// `data` payload for a single product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductData {
    pub product: Value,
}

/// `data`/`results` payload for a list of products
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductsData {
    pub products: Vec<Value>,
}

/// Success envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<RateLimitInfo>,
}

impl<T> Envelope<T> {
    pub fn new(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: SUCCESS,
            code: code.as_u16(),
            message: message.into(),
            data,
            headers: None,
        }
    }

    /// 200 envelope
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }

    /// Attach the rate-limit echo
    #[must_use]
    pub fn with_headers(mut self, headers: RateLimitInfo) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Success envelope for one page of a paginated list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedEnvelope {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    /// Size of the whole collection
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: ProductsData,
}

impl PaginatedEnvelope {
    pub fn new(message: impl Into<String>, page: Page<Value>) -> Self {
        Self {
            status: SUCCESS,
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            count: page.count,
            next: page.links.next,
            previous: page.links.previous,
            results: ProductsData {
                products: page.items,
            },
        }
    }
}

impl IntoResponse for PaginatedEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Result of the list operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListOutcome {
    Paginated(PaginatedEnvelope),
    Plain(Envelope<ProductsData>),
}

impl ListOutcome {
    /// Products carried by either shape
    pub fn products(&self) -> &[Value] {
        match self {
            Self::Paginated(page) => &page.results.products,
            Self::Plain(envelope) => &envelope.data.products,
        }
    }
}

impl IntoResponse for ListOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Paginated(page) => page.into_response(),
            Self::Plain(envelope) => envelope.into_response(),
        }
    }
}

/// 201 Created with an optional `Location` header
#[derive(Debug)]
pub struct Created<T> {
    pub data: T,
    pub location: Option<String>,
}

impl<T> Created<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.data)).into_response();

        if let Some(location) = self.location {
            if let Ok(header_value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, header_value);
            }
        }

        response
    }
}

/// 204 with no body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
