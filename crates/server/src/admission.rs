//! Admission middleware for `/api` routes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use seoforge_admission::resolve_client_key;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject the request with 429 when any applicable limit is exhausted.
pub async fn admit_request(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let client = {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let headers = request.headers();
        resolve_client_key(
            &state.client_headers,
            |name| headers.get(name).and_then(|v| v.to_str().ok()),
            remote.as_deref(),
        )
    };

    match state
        .admission
        .try_admit(&client, request.method().as_str(), request.uri().path())
    {
        Ok(()) => next.run(request).await,
        Err(limited) => ApiError::from(limited).into_response(),
    }
}
