//! # catalog-service
//!
//! Product catalog REST service. Products are created, listed, retrieved,
//! updated and deleted over HTTP; every response is wrapped in a uniform JSON
//! envelope and listings are page-number paginated.
//!
//! ## Layout
//!
//! - [`models`]: the product entity, its price and stock status
//! - [`serializer`]: request validation and the product wire shape
//! - [`repository`]: storage seam with in-memory and PostgreSQL adapters
//! - [`handlers`]: the controller and the response/error envelopes
//! - [`pagination`]: page-number pagination policy and links
//! - [`routes`], [`server`], [`middleware`]: HTTP wiring
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), InMemoryProductRepository::new());
//!
//!     Server::new(config).serve(router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod serializer;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, MiddlewareConfig, PaginationConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{
        ApiError, ApiErrorKind, CollectionHandler, Envelope, ListOutcome, ListQuery,
        ProductController,
    };
    pub use crate::health::{health, readiness};
    pub use crate::models::{NewProduct, Price, Product, ProductChanges, StockStatus};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::pagination::PaginationPolicy;
    pub use crate::repository::{
        InMemoryProductRepository, Pagination, ProductRepository, Repository, RepositoryError,
    };
    #[cfg(feature = "database")]
    pub use crate::repository::PgProductRepository;
    pub use crate::routes::router;
    pub use crate::serializer::UpdateMode;
    pub use crate::server::Server;
    pub use crate::state::AppState;
}
