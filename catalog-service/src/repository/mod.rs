//! Product storage
//!
//! [`Repository`] is the storage seam injected into the controller.
//! [`InMemoryProductRepository`] backs tests and database-less runs;
//! with the `database` feature, [`PgProductRepository`] stores products in
//! PostgreSQL.

mod error;
mod memory;
mod pagination;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::InMemoryProductRepository;
pub use pagination::Pagination;
#[cfg(feature = "database")]
pub use postgres::PgProductRepository;
pub use traits::{ProductRepository, Repository, RepositoryResult};
