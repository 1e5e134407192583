//! Product enrichment endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use seoforge_core::{ProductInput, ProductRecord};
use seoforge_enrich::{ProcessOutcome, StatusReport};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn enrich_product(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProcessOutcome>, ApiError> {
    input.validate()?;
    let outcome = state.orchestrator.process(&input).await;
    info!(
        record_id = %outcome.record.id,
        status = %outcome.status,
        elapsed_ms = outcome.metadata.elapsed_ms,
        "Enrich request finished"
    );
    Ok(Json(outcome))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductRecord>, ApiError> {
    Ok(Json(state.orchestrator.get(id).await?))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusReport>, ApiError> {
    Ok(Json(state.orchestrator.get_status(id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReprocessParams {
    #[serde(default)]
    pub force: bool,
}

pub async fn reprocess_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReprocessParams>,
) -> Result<Json<ProcessOutcome>, ApiError> {
    Ok(Json(state.orchestrator.reprocess(id, params.force).await?))
}
