//! In-process product store
//!
//! Records live in a vector in creation order behind a `tokio::sync::RwLock`.
//! The SKU uniqueness check and the write happen under the same write
//! guard, so two concurrent creates with one SKU cannot both succeed.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::Pagination;
use super::traits::{Repository, RepositoryResult};
use crate::models::{NewProduct, Product, ProductChanges};

#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sku_taken(products: &[Product], sku: &str, except: Option<Uuid>) -> bool {
        products
            .iter()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

impl Repository<Uuid, Product, NewProduct, ProductChanges> for InMemoryProductRepository {
    async fn find_by_id(&self, id: &Uuid) -> RepositoryResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == *id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn find_page<F>(&self, select: F) -> RepositoryResult<(Vec<Product>, u64)>
    where
        F: FnOnce(u64) -> Pagination + Send,
    {
        let products = self.products.read().await;
        let count = products.len() as u64;
        let (start, end) = select(count).bounds(products.len());
        Ok((products[start..end].to_vec(), count))
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    async fn create(&self, data: NewProduct) -> RepositoryResult<Product> {
        let mut products = self.products.write().await;
        if Self::sku_taken(&products, &data.sku, None) {
            return Err(RepositoryError::unique_violation("sku", &data.sku));
        }
        let product = Product::create(data, Utc::now());
        products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: &Uuid, data: ProductChanges) -> RepositoryResult<Product> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| RepositoryError::not_found(RepositoryOperation::Update, id.to_string()))?;
        if let Some(ref sku) = data.sku {
            if Self::sku_taken(&products, sku, Some(*id)) {
                return Err(RepositoryError::unique_violation("sku", sku)
                    .with_operation(RepositoryOperation::Update));
            }
        }
        let product = &mut products[index];
        product.apply(data, Utc::now());
        Ok(product.clone())
    }

    async fn delete(&self, id: &Uuid) -> RepositoryResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != *id);
        Ok(products.len() < before)
    }
}
