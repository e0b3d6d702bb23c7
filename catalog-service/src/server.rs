//! HTTP server with graceful shutdown

use axum::{middleware::map_response, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    middleware::{
        catch_panic_layer, envelope_transport_errors, request_id_header, request_id_layer,
        request_id_propagation_layer, sensitive_headers_layer,
    },
};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wrap the router in the configured middleware stack
    ///
    /// The last layer added is the outermost. From the outside in: CORS,
    /// compression, request ID set then propagated, sensitive header masking,
    /// tracing, transport error envelopes, timeout, body limit, and panic
    /// recovery closest to the handlers.
    pub fn apply_middleware(&self, app: Router) -> Router {
        let middleware = &self.config.middleware;
        let request_id = request_id_header(middleware);

        let app = if middleware.catch_panic {
            app.layer(catch_panic_layer())
        } else {
            app
        };

        let app = app
            .layer(RequestBodyLimitLayer::new(middleware.body_limit_bytes()))
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.service.timeout(),
            ))
            .layer(map_response(envelope_transport_errors))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(sensitive_headers_layer())
            .layer(request_id_propagation_layer(request_id.clone()))
            .layer(request_id_layer(request_id));

        let app = if middleware.compression {
            app.layer(CompressionLayer::new())
        } else {
            app
        };

        match self.build_cors_layer() {
            Some(cors) => app.layer(cors),
            None => app,
        }
    }

    /// Run the server with the given router
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = self.apply_middleware(app);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        let enabled = |on: bool| if on { "enabled" } else { "disabled" };

        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: {}", enabled(middleware.catch_panic));
        tracing::info!(
            "  - Request ID tracking: enabled ({})",
            request_id_header(middleware)
        );
        tracing::info!("  - Sensitive header masking: enabled");
        tracing::info!("  - Request body limit: {} MB", middleware.body_limit_mb);
        tracing::info!("  - Compression: {}", enabled(middleware.compression));
        tracing::info!("  - CORS mode: {}", middleware.cors_mode);
        tracing::info!(
            "  - Request timeout: {} seconds",
            self.config.service.timeout_secs
        );
        tracing::info!(
            "  - Pagination: {}",
            enabled(self.config.pagination.enabled)
        );
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// CORS layer for the configured mode, `None` when disabled
    fn build_cors_layer(&self) -> Option<CorsLayer> {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                Some(CorsLayer::permissive())
            }
            "restrictive" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                Some(CorsLayer::new())
            }
            "disabled" => {
                tracing::debug!("CORS disabled");
                None
            }
            other => {
                tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
                Some(CorsLayer::permissive())
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryProductRepository;
    use crate::routes::router;
    use crate::state::AppState;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        routing::get,
    };
    use serde_json::{json, Value};
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::format::FmtSpan;

    /// Trace output sink shared with the test
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn products_app(config: &Config) -> Router {
        router(AppState::new(
            config.clone(),
            InMemoryProductRepository::new(),
        ))
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_echoed() {
        let config = Config::default();
        let app = Server::new(config.clone()).apply_middleware(products_app(&config));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_custom_request_id_header() {
        let mut config = Config::default();
        config.middleware.request_id_header = "x-correlation-id".to_string();
        let app = Server::new(config.clone()).apply_middleware(products_app(&config));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-correlation-id"));
    }

    #[tokio::test]
    async fn test_panic_becomes_error_envelope() {
        let config = Config::default();
        async fn boom() -> &'static str {
            panic!("kaboom")
        }
        let app: Router = Router::new().route("/boom", get(boom));
        let app = Server::new(config).apply_middleware(app);

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 0;
        let app = Server::new(config.clone()).apply_middleware(products_app(&config));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, "2")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], 413);
        assert_eq!(body["message"], "Payload too large");
    }

    #[tokio::test]
    async fn test_body_within_configured_limit_is_accepted() {
        let config = Config::default();
        let app = Server::new(config.clone()).apply_middleware(products_app(&config));
        let payload = json!({
            "name": "Manual",
            "category": "Books",
            "price": "19.99",
            "stock_status": "in_stock",
            "sku": "BOOK-1",
            "description": "p".repeat(3 * 1024 * 1024),
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_envelope() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "late"
        }
        let mut config = Config::default();
        config.service.timeout_secs = 1;
        let app: Router = Router::new().route("/slow", get(slow));
        let app = Server::new(config).apply_middleware(app);

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["code"], 408);
        assert_eq!(body["message"], "Request timeout");
    }

    #[tokio::test]
    async fn test_credentials_are_masked_in_trace_output() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_span_events(FmtSpan::NEW)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = Config::default();
        let app = Server::new(config.clone()).apply_middleware(products_app(&config));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::AUTHORIZATION, "Bearer TOPSECRET")
                    .header(header::COOKIE, "session=TOPSECRET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let output = captured.text();
        assert!(output.contains("uri=/health"), "no request span in: {output}");
        assert!(!output.contains("TOPSECRET"), "credentials leaked: {output}");
    }

    #[test]
    fn test_cors_modes() {
        let mut config = Config::default();
        assert!(Server::new(config.clone()).build_cors_layer().is_some());

        config.middleware.cors_mode = "disabled".to_string();
        assert!(Server::new(config.clone()).build_cors_layer().is_none());

        config.middleware.cors_mode = "bogus".to_string();
        let server = Server::new(config);
        assert!(server.build_cors_layer().is_some());
        assert_eq!(server.config().middleware.cors_mode, "bogus");
    }
}
