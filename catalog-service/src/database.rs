//! PostgreSQL connection pool and schema setup

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::DatabaseConfig,
    error::{Error, Result},
};

const CREATE_PRODUCTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    category VARCHAR(255) NOT NULL,
    price NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
    stock_status VARCHAR(50) NOT NULL CHECK (stock_status IN ('in_stock', 'out_of_stock')),
    sku VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT products_sku_key UNIQUE (sku),
    CHECK (updated_at >= created_at)
)"#;

const CREATE_ORDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS products_created_at_id_idx ON products (created_at, id)";

/// Connect with exponential backoff, then create the schema if configured
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = create_pool_with_retries(config, config.max_retries).await?;
    if config.run_migrations {
        migrate(&pool).await?;
    }
    Ok(pool)
}

async fn create_pool_with_retries(config: &DatabaseConfig, max_retries: u32) -> Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                tracing::info!(
                    attempts = attempt + 1,
                    max_connections = config.max_connections,
                    min_connections = config.min_connections,
                    "Database connection pool created"
                );
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to connect to database at '{}' ({}): {}",
                sanitize_connection_url(&config.url),
                categorize_db_error(&e),
                e
            ))
        })
}

/// Create the products table and its ordering index
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_PRODUCTS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_ORDER_INDEX).execute(pool).await?;
    tracing::info!("Products schema is up to date");
    Ok(())
}

/// Hide the password in a connection URL
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.rfind('@'), url.find("://")) {
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some(colon_pos) = credentials.find(':') {
            return format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &credentials[..colon_pos],
                &url[at_pos..]
            );
        }
    }
    url.to_string()
}

fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error as E;
    match err {
        E::Configuration(_) => "configuration error",
        E::Database(_) => "database rejected the connection",
        E::Io(_) => "network I/O error",
        E::Tls(_) => "TLS error",
        E::PoolTimedOut => "connection pool timeout",
        E::PoolClosed => "connection pool closed",
        _ => "connection error",
    }
}
