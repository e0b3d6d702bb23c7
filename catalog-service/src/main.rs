use anyhow::Context;
use axum::Router;

use catalog_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config).context("failed to initialize tracing")?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "configuration loaded"
    );

    let app = build_app(&config).await?;
    let result = Server::new(config).serve(app).await;

    shutdown_tracing();
    result.context("server error")
}

#[cfg(feature = "database")]
async fn build_app(config: &Config) -> anyhow::Result<Router> {
    if let Some(database) = &config.database {
        let pool = catalog_service::database::create_pool(database)
            .await
            .context("failed to connect to the database")?;
        tracing::info!("using PostgreSQL product storage");
        return Ok(router(AppState::new(
            config.clone(),
            PgProductRepository::new(pool),
        )));
    }

    Ok(in_memory(config))
}

#[cfg(not(feature = "database"))]
async fn build_app(config: &Config) -> anyhow::Result<Router> {
    if config.database.is_some() {
        tracing::warn!("database configured but the `database` feature is disabled");
    }
    Ok(in_memory(config))
}

fn in_memory(config: &Config) -> Router {
    tracing::info!("using in-memory product storage");
    router(AppState::new(config.clone(), InMemoryProductRepository::new()))
}
