//! Repository trait definitions
//!
//! Uses RPITIT (Return Position Impl Trait In Traits) so implementations
//! can be plain `async fn`s without boxing.

use std::future::Future;

use uuid::Uuid;

use super::error::RepositoryError;
use super::pagination::Pagination;
use crate::models::{NewProduct, Product, ProductChanges};

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// CRUD access to a keyed collection
///
/// Records come back in a stable order (creation time, then a tie-breaker)
/// so that consecutive windows never overlap or skip.
pub trait Repository<Id, Entity, Create, Update>: Send + Sync {
    fn find_by_id(&self, id: &Id) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    fn find_all(&self) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    /// One window of records together with the size of the whole collection
    ///
    /// `select` receives the collection size and picks the window. Both
    /// values come from the same snapshot, so a concurrent write cannot make
    /// the count disagree with the records returned.
    fn find_page<F>(
        &self,
        select: F,
    ) -> impl Future<Output = RepositoryResult<(Vec<Entity>, u64)>> + Send
    where
        F: FnOnce(u64) -> Pagination + Send;

    fn count(&self) -> impl Future<Output = RepositoryResult<u64>> + Send;

    fn create(&self, data: Create) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Apply `data` to the record with `id`
    ///
    /// Fails with [`RepositoryErrorKind::NotFound`](super::RepositoryErrorKind::NotFound)
    /// when there is no such record.
    fn update(
        &self,
        id: &Id,
        data: Update,
    ) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Remove the record; `false` if it did not exist
    fn delete(&self, id: &Id) -> impl Future<Output = RepositoryResult<bool>> + Send;
}

/// Storage handle for products
pub trait ProductRepository:
    Repository<Uuid, Product, NewProduct, ProductChanges> + 'static
{
}

impl<T> ProductRepository for T where
    T: Repository<Uuid, Product, NewProduct, ProductChanges> + 'static
{
}
