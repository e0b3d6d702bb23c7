//! Product resource controller

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use super::error::{ApiError, ApiOperation};
use super::query::ListQuery;
use super::rate_limit::RateLimitInfo;
use super::response::{
    Created, Envelope, ListOutcome, NoContent, PaginatedEnvelope, ProductData, ProductsData,
};
use super::traits::CollectionHandler;
use crate::config::{Config, RateLimitConfig};
use crate::pagination::{Page, PaginationPolicy, COLLECTION_PATH};
use crate::repository::{ProductRepository, RepositoryError};
use crate::serializer::{self, UpdateMode};

pub const LIST_MESSAGE: &str = "Products retrieved successfully";
pub const RETRIEVE_MESSAGE: &str = "Product details retrieved successfully.";
pub const CREATE_MESSAGE: &str = "Product created successfully.";
pub const UPDATE_MESSAGE: &str = "Product updated successfully.";

/// Orchestrates one product operation per call over an injected repository
pub struct ProductController<R> {
    repository: Arc<R>,
    pagination: Option<PaginationPolicy>,
    rate_limits: RateLimitConfig,
}

impl<R> Clone for ProductController<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            pagination: self.pagination.clone(),
            rate_limits: self.rate_limits.clone(),
        }
    }
}

impl<R: ProductRepository> ProductController<R> {
    pub fn new(repository: R, config: &Config) -> Self {
        Self {
            repository: Arc::new(repository),
            pagination: config
                .pagination
                .enabled
                .then(|| PaginationPolicy::from_config(&config.pagination)),
            rate_limits: config.rate_limit.clone(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn pagination(&self) -> Option<&PaginationPolicy> {
        self.pagination.as_ref()
    }
}

/// Path ids that are not UUIDs cannot name a product
fn parse_id(id: &str, operation: ApiOperation) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found(operation))
}

fn storage(operation: ApiOperation) -> impl Fn(RepositoryError) -> ApiError {
    move |err| ApiError::from(err).with_operation(operation)
}

fn product_location(id: &Uuid) -> String {
    format!("{COLLECTION_PATH}{id}/")
}

impl<R: ProductRepository> CollectionHandler for ProductController<R> {
    #[tracing::instrument(skip(self), fields(operation = "list"))]
    async fn list(&self, query: ListQuery) -> Result<ListOutcome, ApiError> {
        let op = ApiOperation::List;

        let Some(policy) = self.pagination.as_ref() else {
            let products = self.repository.find_all().await.map_err(storage(op))?;
            tracing::debug!(count = products.len(), "Listing all products");
            return Ok(ListOutcome::Plain(Envelope::ok(
                LIST_MESSAGE,
                ProductsData {
                    products: serializer::serialize_many(&products),
                },
            )));
        };

        let target = policy.target(&query)?;
        let (products, count) = self
            .repository
            .find_page(move |count| target.resolve(count).window())
            .await
            .map_err(storage(op))?;
        let request = target.resolve(count);

        tracing::debug!(
            page = request.page,
            per_page = request.size,
            count,
            returned = products.len(),
            "Listing product page"
        );

        let page = Page {
            items: serializer::serialize_many(&products),
            count,
            links: policy.links(&request, count),
        };
        Ok(ListOutcome::Paginated(PaginatedEnvelope::new(LIST_MESSAGE, page)))
    }

    #[tracing::instrument(skip(self, headers), fields(operation = "retrieve"))]
    async fn retrieve(
        &self,
        id: &str,
        headers: &HeaderMap,
    ) -> Result<Envelope<ProductData>, ApiError> {
        let op = ApiOperation::Retrieve;
        let id = parse_id(id, op)?;
        let product = self
            .repository
            .find_by_id(&id)
            .await
            .map_err(storage(op))?
            .ok_or_else(|| ApiError::not_found(op))?;

        Ok(Envelope::ok(
            RETRIEVE_MESSAGE,
            ProductData {
                product: serializer::serialize(&product),
            },
        )
        .with_headers(RateLimitInfo::from_headers(headers, &self.rate_limits)))
    }

    #[tracing::instrument(skip(self, body), fields(operation = "create"))]
    async fn create(&self, body: &[u8]) -> Result<Created<Envelope<ProductData>>, ApiError> {
        let op = ApiOperation::Create;
        let data = serializer::parse_body(body).map_err(|e| ApiError::from_input(op, e))?;
        let input =
            serializer::deserialize_new(&data).map_err(|e| ApiError::validation_failed(op, e))?;
        let product = self.repository.create(input).await.map_err(storage(op))?;

        tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");

        let location = product_location(&product.id);
        let envelope = Envelope::new(
            StatusCode::CREATED,
            CREATE_MESSAGE,
            ProductData {
                product: serializer::serialize(&product),
            },
        );
        Ok(Created::new(envelope).with_location(location))
    }

    #[tracing::instrument(skip(self, body), fields(operation = "update"))]
    async fn update(
        &self,
        id: &str,
        body: &[u8],
        mode: UpdateMode,
    ) -> Result<Envelope<ProductData>, ApiError> {
        let op = ApiOperation::Update;
        let id = parse_id(id, op)?;
        if self
            .repository
            .find_by_id(&id)
            .await
            .map_err(storage(op))?
            .is_none()
        {
            return Err(ApiError::not_found(op));
        }

        let data = serializer::parse_body(body).map_err(|e| ApiError::from_input(op, e))?;
        let changes = serializer::deserialize_changes(&data, mode)
            .map_err(|e| ApiError::validation_failed(op, e))?;
        let product = self
            .repository
            .update(&id, changes)
            .await
            .map_err(storage(op))?;

        tracing::info!(product_id = %product.id, "Product updated");

        Ok(Envelope::ok(
            UPDATE_MESSAGE,
            ProductData {
                product: serializer::serialize(&product),
            },
        ))
    }

    #[tracing::instrument(skip(self), fields(operation = "delete"))]
    async fn delete(&self, id: &str) -> Result<NoContent, ApiError> {
        let op = ApiOperation::Delete;
        let id = parse_id(id, op)?;
        if !self.repository.delete(&id).await.map_err(storage(op))? {
            return Err(ApiError::not_found(op));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(NoContent)
    }
}
