//! Handler trait for the product collection
//!
//! Uses RPITIT (Return Position Impl Trait In Traits). Every operation is
//! written out in full by the implementor; each returns either its success
//! envelope or an [`ApiError`] that renders the error envelope.

use std::future::Future;

use axum::http::HeaderMap;

use super::error::ApiError;
use super::query::ListQuery;
use super::response::{Created, Envelope, ListOutcome, NoContent, ProductData};
use crate::serializer::UpdateMode;

/// The five REST operations on `/products`
///
/// Ids arrive as raw path segments; an id that is not a valid identifier
/// is treated like one that does not exist. Bodies arrive as raw bytes so
/// that malformed JSON is reported in the error envelope too.
pub trait CollectionHandler: Send + Sync {
    fn list(
        &self,
        query: ListQuery,
    ) -> impl Future<Output = Result<ListOutcome, ApiError>> + Send;

    /// Single product plus the rate-limit echo read from `headers`
    fn retrieve(
        &self,
        id: &str,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<Envelope<ProductData>, ApiError>> + Send;

    fn create(
        &self,
        body: &[u8],
    ) -> impl Future<Output = Result<Created<Envelope<ProductData>>, ApiError>> + Send;

    fn update(
        &self,
        id: &str,
        body: &[u8],
        mode: UpdateMode,
    ) -> impl Future<Output = Result<Envelope<ProductData>, ApiError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<NoContent, ApiError>> + Send;
}
