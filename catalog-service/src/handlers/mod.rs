//! Request handling for the product resource
//!
//! - [`CollectionHandler`]: the list/retrieve/create/update/delete contract
//! - [`ProductController`]: its implementation over an injected repository
//! - [`ApiError`]: error taxonomy, rendered as the error envelope
//! - [`Envelope`], [`PaginatedEnvelope`], [`ListOutcome`]: success envelopes
//! - [`RateLimitInfo`]: the rate-limit echo attached to retrievals

mod error;
mod products;
mod query;
mod rate_limit;
mod response;
mod traits;

pub use error::{ApiError, ApiErrorKind, ApiOperation, ErrorDetails, ErrorEnvelope};
pub use products::{
    ProductController, CREATE_MESSAGE, LIST_MESSAGE, RETRIEVE_MESSAGE, UPDATE_MESSAGE,
};
pub use query::ListQuery;
pub use rate_limit::{RateLimitInfo, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
pub use response::{
    Created, Envelope, ListOutcome, NoContent, PaginatedEnvelope, ProductData, ProductsData,
};
pub use traits::CollectionHandler;
