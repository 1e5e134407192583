//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::state::AppState;
use crate::{admission, api};

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin, "Invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}

/// Build the application router. Every `/api` route sits behind admission.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    let products = Router::new()
        .route("/api/products/enrich", post(api::enrich_product))
        .route("/api/products/{id}", get(api::get_product))
        .route("/api/products/{id}/status", get(api::get_status))
        .route("/api/products/{id}/reprocess", post(api::reprocess_product))
        .route_layer(from_fn_with_state(state.clone(), admission::admit_request));

    Router::new()
        .route("/health", get(api::health))
        .merge(products)
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use seoforge_admission::{AdmissionController, ManualClock};
    use seoforge_core::config::RateLimitConfig;
    use seoforge_enrich::{EnrichmentOrchestrator, InMemoryProductStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(limits: RateLimitConfig) -> Router {
        let clock = Arc::new(ManualClock::new(1_700_000_400));
        let state = Arc::new(AppState {
            orchestrator: EnrichmentOrchestrator::builder(Arc::new(InMemoryProductStore::new())).build(),
            admission: AdmissionController::with_clock(&limits, clock),
            client_headers: limits.client_headers.clone(),
        });
        build_router(state, "*")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app(RateLimitConfig::default()).oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn enrich_then_fetch_record_and_status() {
        let app = app(RateLimitConfig::default());
        let response = app
            .clone()
            .oneshot(post_json("/api/products/enrich", json!({ "name": "Generic Drill" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let outcome = body_json(response).await;
        assert_eq!(outcome["status"], "completed");
        let id = outcome["record"]["id"].as_str().unwrap().to_string();

        let record = app.clone().oneshot(get_req(&format!("/api/products/{id}"))).await.unwrap();
        assert_eq!(record.status(), StatusCode::OK);
        assert_eq!(body_json(record).await["name"], "Generic Drill");

        let status = app.oneshot(get_req(&format!("/api/products/{id}/status"))).await.unwrap();
        let status = body_json(status).await;
        assert_eq!(status["status"], "completed");
        assert!(status["completion_percentage"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let response = app(RateLimitConfig::default())
            .oneshot(post_json("/api/products/enrich", json!({ "brand": "Bosch" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("name or model_number"));
    }

    #[tokio::test]
    async fn unknown_product_is_404() {
        let uri = format!("/api/products/{}", uuid::Uuid::new_v4());
        let response = app(RateLimitConfig::default()).oneshot(get_req(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let reprocess = format!("/api/products/{}/reprocess", uuid::Uuid::new_v4());
        let response = app(RateLimitConfig::default())
            .oneshot(post_json(&reprocess, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reprocess_of_completed_record_needs_force() {
        let app = app(RateLimitConfig::default());
        let created = app
            .clone()
            .oneshot(post_json("/api/products/enrich", json!({ "model_number": "GSP180" })))
            .await
            .unwrap();
        let id = body_json(created).await["record"]["id"].as_str().unwrap().to_string();

        let skipped = app
            .clone()
            .oneshot(post_json(&format!("/api/products/{id}/reprocess"), json!({})))
            .await
            .unwrap();
        assert!(body_json(skipped).await["metadata"]["skipped_reason"].is_string());

        let forced = app
            .oneshot(post_json(&format!("/api/products/{id}/reprocess?force=true"), json!({})))
            .await
            .unwrap();
        let forced = body_json(forced).await;
        assert!(forced["metadata"].get("skipped_reason").is_none());
        assert_eq!(forced["metadata"]["stages"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn excess_requests_get_429_with_retry_after() {
        let app = app(RateLimitConfig::flat(2, 100));
        let uri = format!("/api/products/{}", uuid::Uuid::new_v4());
        for _ in 0..2 {
            let response = app.clone().oneshot(get_req(&uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let limited = app.clone().oneshot(get_req(&uri)).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry: u64 = limited.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((1..=60).contains(&retry));
        assert_eq!(body_json(limited).await["retry_after_seconds"], retry);

        // health sits outside admission
        let health = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn clients_resolved_from_proxy_headers() {
        let app = app(RateLimitConfig::flat(1, 100));
        let uri = format!("/api/products/{}", uuid::Uuid::new_v4());
        let from = |ip: &str| {
            Request::builder()
                .uri(uri.as_str())
                .header("x-forwarded-for", format!("{ip}, 10.0.0.1"))
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(app.clone().oneshot(from("203.0.113.7")).await.unwrap().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            app.clone().oneshot(from("203.0.113.7")).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(app.oneshot(from("198.51.100.2")).await.unwrap().status(), StatusCode::NOT_FOUND);
    }
}
