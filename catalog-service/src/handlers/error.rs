//! API error types for handler operations
//!
//! Every failure a handler can produce is an [`ApiError`]. Its
//! `IntoResponse` impl renders the error envelope and sets the HTTP status
//! to the same value as the envelope's `code`.
//!
//! ```json
//! {"status": "error", "code": 404, "message": "Product not found",
//!  "errors": {"details": "No product was found with the given ID."}}
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pagination::PageError;
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use crate::serializer::{InputError, ValidationErrors, SKU_TAKEN};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    /// Request that matched no route
    Route,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Retrieve => write!(f, "retrieve"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Route => write!(f, "route"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Lookup by id found nothing
    NotFound,
    /// A field constraint was violated on write
    ValidationFailed,
    /// The request itself is unusable (bad JSON, bad page)
    BadRequest,
    /// The route exists but not for this method
    MethodNotAllowed,
    /// The body exceeds the configured size limit
    PayloadTooLarge,
    /// The request did not complete within the configured timeout
    RequestTimeout,
    /// Anything unanticipated
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::MethodNotAllowed => write!(f, "method_not_allowed"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::RequestTimeout => write!(f, "request_timeout"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Payload of the `errors` member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// `{"details": "..."}`
    Details { details: String },
    /// `{"field": ["message", ...], ...}`
    Fields(ValidationErrors),
}

impl ErrorDetails {
    pub fn details(text: impl Into<String>) -> Self {
        Self::Details {
            details: text.into(),
        }
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Category text shown as the envelope `message`
    pub message: String,
    pub errors: ErrorDetails,
}

impl ApiError {
    pub fn new(
        operation: ApiOperation,
        kind: ApiErrorKind,
        message: impl Into<String>,
        errors: ErrorDetails,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            errors,
        }
    }

    /// No product with the requested id
    pub fn not_found(operation: ApiOperation) -> Self {
        Self::new(
            operation,
            ApiErrorKind::NotFound,
            "Product not found",
            ErrorDetails::details("No product was found with the given ID."),
        )
    }

    /// No route matches the request
    pub fn route_not_found(path: &str) -> Self {
        Self::new(
            ApiOperation::Route,
            ApiErrorKind::NotFound,
            "Not found",
            ErrorDetails::details(format!("No resource is served at {path}.")),
        )
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            ApiOperation::Route,
            ApiErrorKind::MethodNotAllowed,
            "Method not allowed",
            ErrorDetails::details(format!("Method \"{method}\" not allowed.")),
        )
    }

    pub fn validation_failed(operation: ApiOperation, errors: ValidationErrors) -> Self {
        Self::new(
            operation,
            ApiErrorKind::ValidationFailed,
            "Invalid input",
            ErrorDetails::Fields(errors),
        )
    }

    pub fn invalid_page() -> Self {
        Self::new(
            ApiOperation::List,
            ApiErrorKind::BadRequest,
            "Invalid page",
            ErrorDetails::details("Invalid page."),
        )
    }

    pub fn payload_too_large(operation: ApiOperation, detail: impl Into<String>) -> Self {
        Self::new(
            operation,
            ApiErrorKind::PayloadTooLarge,
            "Payload too large",
            ErrorDetails::details(detail),
        )
    }

    pub fn request_timeout() -> Self {
        Self::new(
            ApiOperation::Route,
            ApiErrorKind::RequestTimeout,
            "Request timeout",
            ErrorDetails::details("The request took too long to complete."),
        )
    }

    /// Body is not parseable JSON
    pub fn malformed(operation: ApiOperation, detail: impl Into<String>) -> Self {
        Self::new(
            operation,
            ApiErrorKind::BadRequest,
            "Malformed request",
            ErrorDetails::details(detail),
        )
    }

    /// Unanticipated failure; `diagnostic` is surfaced verbatim
    pub fn internal(operation: ApiOperation, diagnostic: impl Into<String>) -> Self {
        Self::new(
            operation,
            ApiErrorKind::InternalError,
            "Internal Server Error",
            ErrorDetails::details(diagnostic),
        )
    }

    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Map a body parsing failure
    pub fn from_input(operation: ApiOperation, err: InputError) -> Self {
        match err {
            InputError::Malformed(detail) => Self::malformed(operation, detail),
            InputError::Invalid(errors) => Self::validation_failed(operation, errors),
        }
    }

    /// Status code as sent on the wire
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let ErrorDetails::Details { ref details } = self.errors {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Error envelope body
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    pub errors: ErrorDetails,
}

impl From<ApiError> for ErrorEnvelope {
    fn from(err: ApiError) -> Self {
        Self {
            status: "error",
            code: err.kind.status_code().as_u16(),
            message: err.message,
            errors: err.errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                status = status.as_u16(),
                "{}", self
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                status = status.as_u16(),
                "{}", self
            );
        }

        (status, Json(ErrorEnvelope::from(self))).into_response()
    }
}

fn repository_operation_to_api_operation(op: RepositoryOperation) -> ApiOperation {
    match op {
        RepositoryOperation::FindById => ApiOperation::Retrieve,
        RepositoryOperation::FindAll | RepositoryOperation::Count => ApiOperation::List,
        RepositoryOperation::Create => ApiOperation::Create,
        RepositoryOperation::Update => ApiOperation::Update,
        RepositoryOperation::Delete => ApiOperation::Delete,
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = repository_operation_to_api_operation(err.operation);

        match err.kind {
            RepositoryErrorKind::NotFound => Self::not_found(operation),
            RepositoryErrorKind::UniqueViolation => {
                let field = err.field.unwrap_or_else(|| "sku".to_string());
                let message = if field == "sku" {
                    SKU_TAKEN.to_string()
                } else {
                    format!("product with this {field} already exists.")
                };
                Self::validation_failed(operation, ValidationErrors::single(field, message))
            }
            RepositoryErrorKind::ConstraintViolation
            | RepositoryErrorKind::ConnectionFailed
            | RepositoryErrorKind::Timeout
            | RepositoryErrorKind::DatabaseError
            | RepositoryErrorKind::Other => Self::internal(operation, err.to_string()),
        }
    }
}

impl From<PageError> for ApiError {
    fn from(_: PageError) -> Self {
        Self::invalid_page()
    }
}
