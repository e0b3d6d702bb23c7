//! HTTP routes
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | GET | `/api/v1/products/` | list |
//! | POST | `/api/v1/products/` | create |
//! | GET | `/api/v1/products/{id}/` | retrieve |
//! | PUT | `/api/v1/products/{id}/` | full update |
//! | PATCH | `/api/v1/products/{id}/` | partial update |
//! | DELETE | `/api/v1/products/{id}/` | delete |
//!
//! Each path is also served without the trailing slash. Unknown paths and
//! unsupported methods answer with the error envelope. Bodies are buffered up
//! to `middleware.body_limit_mb`.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{
        rejection::BytesRejection, rejection::QueryRejection, DefaultBodyLimit, Path, Query,
        State,
    },
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{get, MethodRouter},
    Router,
};

use crate::handlers::{
    ApiError, ApiOperation, CollectionHandler, Created, Envelope, ListOutcome, ListQuery,
    NoContent, ProductData,
};
use crate::health::{health, readiness};
use crate::repository::ProductRepository;
use crate::serializer::UpdateMode;
use crate::state::AppState;

/// Prefix all resource routes are nested under
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router
pub fn router<R: ProductRepository>(state: AppState<R>) -> Router {
    let body_limit = state.config().middleware.body_limit_bytes();
    let collection = || -> MethodRouter<AppState<R>> {
        get(list::<R>)
            .post(create::<R>)
            .fallback(method_not_allowed)
    };
    let member = || -> MethodRouter<AppState<R>> {
        get(retrieve::<R>)
            .put(replace::<R>)
            .patch(modify::<R>)
            .delete(destroy::<R>)
            .fallback(method_not_allowed)
    };

    let products = Router::new()
        .route("/products", collection())
        .route("/products/", collection())
        .route("/products/{id}", member())
        .route("/products/{id}/", member());

    Router::new()
        .nest(API_PREFIX, products)
        .route("/health", get(health::<R>))
        .route("/ready", get(readiness::<R>))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn read_body(operation: ApiOperation, body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(operation, rejection.body_text())
        } else {
            ApiError::malformed(operation, rejection.body_text())
        }
    })
}

async fn list<R: ProductRepository>(
    State(state): State<AppState<R>>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<ListOutcome, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::malformed(ApiOperation::List, rejection.body_text()))?;
    let query = state
        .products()
        .pagination()
        .map(|policy| policy.read_query(&params))
        .unwrap_or_else(ListQuery::new);
    state.products().list(query).await
}

async fn retrieve<R: ProductRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Envelope<ProductData>, ApiError> {
    state.products().retrieve(&id, &headers).await
}

async fn create<R: ProductRepository>(
    State(state): State<AppState<R>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Created<Envelope<ProductData>>, ApiError> {
    let body = read_body(ApiOperation::Create, body)?;
    state.products().create(&body).await
}

async fn replace<R: ProductRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Envelope<ProductData>, ApiError> {
    let body = read_body(ApiOperation::Update, body)?;
    state.products().update(&id, &body, UpdateMode::Full).await
}

async fn modify<R: ProductRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Envelope<ProductData>, ApiError> {
    let body = read_body(ApiOperation::Update, body)?;
    state.products().update(&id, &body, UpdateMode::Partial).await
}

async fn destroy<R: ProductRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state.products().delete(&id).await
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repository::InMemoryProductRepository;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        router(AppState::new(
            Config::default(),
            InMemoryProductRepository::new(),
        ))
    }

    fn product_json(sku: &str) -> Value {
        json!({
            "name": format!("Widget {sku}"),
            "category": "Widgets",
            "price": 12.5,
            "stock_status": "in_stock",
            "sku": sku,
            "description": "A widget",
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, sku: &str) -> String {
        let response = send(app, "POST", "/api/v1/products/", Some(product_json(sku))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["product"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_retrieve() {
        let app = app();
        let response = send(&app, "POST", "/api/v1/products/", Some(product_json("W-1"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["code"], 201);
        let product = &body["data"]["product"];
        assert_eq!(product["price"], "12.50");
        assert_eq!(product["created_at"], product["updated_at"]);

        let response = send(&app, "GET", &location, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Product details retrieved successfully.");
        assert_eq!(body["data"]["product"]["sku"], "W-1");
        assert_eq!(body["headers"]["X-RateLimit-Limit"], "100");
        assert_eq!(body["headers"]["X-RateLimit-Remaining"], "99");
        assert_eq!(body["headers"]["X-RateLimit-Reset"], "1668144600");
    }

    #[tokio::test]
    async fn test_retrieve_echoes_throttle_headers() {
        let app = app();
        let id = create(&app, "W-2").await;
        let request = Request::builder()
            .uri(format!("/api/v1/products/{id}"))
            .header("X-RateLimit-Remaining", "3")
            .body(Body::empty())
            .unwrap();
        let body = json_body(app.oneshot(request).await.unwrap()).await;
        assert_eq!(body["headers"]["X-RateLimit-Remaining"], "3");
        assert_eq!(body["headers"]["X-RateLimit-Limit"], "100");
    }

    #[tokio::test]
    async fn test_unknown_id_is_404_envelope() {
        let app = app();
        for id in [Uuid::new_v4().to_string(), "42".to_string()] {
            let response = send(&app, "GET", &format!("/api/v1/products/{id}/"), None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = json_body(response).await;
            assert_eq!(body["status"], "error");
            assert_eq!(body["code"], 404);
            assert_eq!(body["message"], "Product not found");
            assert_eq!(body["errors"]["details"], "No product was found with the given ID.");
        }
    }

    #[tokio::test]
    async fn test_duplicate_sku_over_http() {
        let app = app();
        create(&app, "DUP").await;
        let response = send(&app, "POST", "/api/v1/products/", Some(product_json("DUP"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "Invalid input");
        assert_eq!(body["errors"]["sku"][0], "product with this sku already exists.");
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = app();
        let response = send(
            &app,
            "POST",
            "/api/v1/products",
            Some(json!({"name": "Widget", "price": "-3", "stock_status": "sold"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["price"][0], "Ensure this value is greater than or equal to 0.");
        assert_eq!(body["errors"]["stock_status"][0], "\"sold\" is not a valid choice.");
        assert_eq!(body["errors"]["sku"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_malformed_json_is_envelope() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/products/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Malformed request");
    }

    #[tokio::test]
    async fn test_body_over_configured_limit_is_413_envelope() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 0;
        let app = router(AppState::new(config, InMemoryProductRepository::new()));

        let response = send(&app, "POST", "/api/v1/products/", Some(product_json("BIG"))).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], 413);
        assert_eq!(body["message"], "Payload too large");
    }

    #[tokio::test]
    async fn test_body_larger_than_axum_default_is_accepted() {
        let app = app();
        let mut product = product_json("LONG");
        product["description"] = json!("d".repeat(3 * 1024 * 1024));

        let response = send(&app, "POST", "/api/v1/products/", Some(product)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_put_and_patch() {
        let app = app();
        let id = create(&app, "UP-1").await;
        let uri = format!("/api/v1/products/{id}/");

        let response = send(&app, "PATCH", &uri, Some(json!({"price": "20"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Product updated successfully.");
        assert_eq!(body["data"]["product"]["price"], "20.00");
        assert_eq!(body["data"]["product"]["name"], "Widget UP-1");

        let response = send(&app, "PUT", &uri, Some(json!({"price": "21"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut full = product_json("UP-2");
        full["id"] = json!(Uuid::new_v4().to_string());
        let response = send(&app, "PUT", &uri, Some(full)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["product"]["sku"], "UP-2");
        assert_eq!(body["data"]["product"]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_update_unknown_is_404() {
        let app = app();
        let uri = format!("/api/v1/products/{}/", Uuid::new_v4());
        let response = send(&app, "PATCH", &uri, Some(json!({"name": "x"}))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let app = app();
        let id = create(&app, "DEL").await;
        let uri = format!("/api/v1/products/{id}/");

        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], 404);
    }

    #[tokio::test]
    async fn test_paginated_listing_walk() {
        let app = app();
        let mut created = Vec::new();
        for i in 0..12 {
            created.push(create(&app, &format!("PG-{i:02}")).await);
        }

        let mut seen = Vec::new();
        let mut next = Some("/api/v1/products/?per_page=5".to_string());
        let mut pages = 0;
        while let Some(uri) = next {
            let response = send(&app, "GET", &uri, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body["count"], 12);
            assert_eq!(body["message"], "Products retrieved successfully");
            pages += 1;
            for product in body["results"]["products"].as_array().unwrap() {
                seen.push(product["id"].as_str().unwrap().to_string());
            }
            next = body["next"].as_str().map(str::to_string);
        }
        assert_eq!(pages, 3);
        assert_eq!(seen, created);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 12);
    }

    #[tokio::test]
    async fn test_listing_bad_and_out_of_range_pages() {
        let app = app();
        create(&app, "ONE").await;

        for page in ["0", "-1", "abc"] {
            let response = send(&app, "GET", &format!("/api/v1/products/?page={page}"), None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "page={page}");
            let body = json_body(response).await;
            assert_eq!(body["message"], "Invalid page");
        }

        let response = send(&app, "GET", "/api/v1/products/?page=5", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["results"]["products"], json!([]));
        assert_eq!(body["next"], Value::Null);
        assert_eq!(body["previous"], "/api/v1/products/?page=1");
    }

    #[tokio::test]
    async fn test_unpaginated_listing() {
        let mut config = Config::default();
        config.pagination.enabled = false;
        let app = router(AppState::new(config, InMemoryProductRepository::new()));
        for i in 0..3 {
            create(&app, &format!("NP-{i}")).await;
        }
        let body = json_body(send(&app, "GET", "/api/v1/products/?page=abc", None).await).await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["products"].as_array().unwrap().len(), 3);
        assert!(body.get("count").is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let app = app();
        let response = send(&app, "GET", "/api/v2/things", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Not found");

        let response = send(&app, "DELETE", "/api/v1/products/", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = json_body(response).await;
        assert_eq!(body["code"], 405);
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = app();
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }
}
