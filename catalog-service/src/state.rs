//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::handlers::ProductController;
use crate::repository::ProductRepository;

/// State shared by every request handler
///
/// Generic over the storage so the same router serves the in-memory store
/// and PostgreSQL.
pub struct AppState<R> {
    config: Arc<Config>,
    products: ProductController<R>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            products: self.products.clone(),
        }
    }
}

impl<R: ProductRepository> AppState<R> {
    pub fn new(config: Config, repository: R) -> Self {
        let products = ProductController::new(repository, &config);
        Self {
            config: Arc::new(config),
            products,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn products(&self) -> &ProductController<R> {
        &self.products
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryProductRepository, Repository};

    #[tokio::test]
    async fn test_clones_share_storage() {
        let state = AppState::new(Config::default(), InMemoryProductRepository::new());
        let clone = state.clone();
        assert_eq!(clone.config().service.port, 8080);
        assert!(std::ptr::eq(
            state.products().repository(),
            clone.products().repository()
        ));
        assert_eq!(clone.products().repository().count().await.unwrap(), 0);
    }
}
