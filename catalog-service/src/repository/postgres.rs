//! PostgreSQL product store
//!
//! Rows are read with runtime-checked queries and mapped by hand so the
//! crate builds without a live database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::Pagination;
use super::traits::{Repository, RepositoryResult};
use crate::models::{NewProduct, Price, Product, ProductChanges, StockStatus};

const COLUMNS: &str =
    "id, name, category, price, stock_status, sku, description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(row: &PgRow, operation: RepositoryOperation) -> RepositoryResult<Product> {
    let get_err = |e: sqlx::Error| RepositoryError::from_sqlx(operation, e);

    let amount: Decimal = row.try_get("price").map_err(get_err)?;
    let price = Price::new(amount).ok_or_else(|| {
        RepositoryError::database_error(operation, format!("stored price out of range: {amount}"))
    })?;
    let status: String = row.try_get("stock_status").map_err(get_err)?;
    let stock_status = status
        .parse::<StockStatus>()
        .map_err(|e| RepositoryError::database_error(operation, e))?;

    Ok(Product {
        id: row.try_get("id").map_err(get_err)?,
        name: row.try_get("name").map_err(get_err)?,
        category: row.try_get("category").map_err(get_err)?,
        price,
        stock_status,
        sku: row.try_get("sku").map_err(get_err)?,
        description: row.try_get("description").map_err(get_err)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(get_err)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(get_err)?,
    })
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Repository<Uuid, Product, NewProduct, ProductChanges> for PgProductRepository {
    async fn find_by_id(&self, id: &Uuid) -> RepositoryResult<Option<Product>> {
        let op = RepositoryOperation::FindById;
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e))?;
        row.as_ref().map(|r| map_row(r, op)).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let op = RepositoryOperation::FindAll;
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(op, e))?;
        rows.iter().map(|r| map_row(r, op)).collect()
    }

    /// Count and window are read in one `REPEATABLE READ` transaction so they
    /// share a snapshot.
    async fn find_page<F>(&self, select: F) -> RepositoryResult<(Vec<Product>, u64)>
    where
        F: FnOnce(u64) -> Pagination + Send,
    {
        let op = RepositoryOperation::FindAll;
        let db_err = |e| RepositoryError::from_sqlx(op, e);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
        let count = u64::try_from(count).unwrap_or(0);
        let window = select(count);

        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM products ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(to_i64(window.limit))
        .bind(to_i64(window.offset))
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let products = rows
            .iter()
            .map(|r| map_row(r, op))
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok((products, count))
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Count, e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn create(&self, data: NewProduct) -> RepositoryResult<Product> {
        let op = RepositoryOperation::Create;
        let product = Product::create(data, Utc::now());
        sqlx::query(&format!(
            "INSERT INTO products ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.stock_status.as_str())
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(op, e))?;
        Ok(product)
    }

    async fn update(&self, id: &Uuid, data: ProductChanges) -> RepositoryResult<Product> {
        let op = RepositoryOperation::Update;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e))?;

        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(op, e))?
        .ok_or_else(|| RepositoryError::not_found(op, id.to_string()))?;

        let mut product = map_row(&row, op)?;
        product.apply(data, Utc::now());

        sqlx::query(
            "UPDATE products SET name = $2, category = $3, price = $4, stock_status = $5, \
             sku = $6, description = $7, updated_at = $8 WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.stock_status.as_str())
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(op, e))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::from_sqlx(op, e))?;
        Ok(product)
    }

    async fn delete(&self, id: &Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Delete, e))?;
        Ok(result.rows_affected() > 0)
    }
}
