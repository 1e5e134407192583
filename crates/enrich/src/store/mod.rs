//! Record persistence.
//!
//! The orchestrator only needs find-by-id, find-by-model-number and an
//! atomic per-record save. Two implementations ship with the crate:
//! - `memory`: process-local map, used by tests and as the default
//! - `file`: one JSON document per record under a data directory

mod file;
mod memory;

pub use file::JsonFileProductStore;
pub use memory::InMemoryProductStore;

use seoforge_core::{ProductId, ProductRecord, SeoforgeError};
use thiserror::Error;

/// Errors produced by [`ProductStore`] implementations. Always fatal to the
/// pipeline run that hit them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model number '{model_number}' already belongs to record {existing}")]
    ModelNumberConflict {
        model_number: String,
        existing: ProductId,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for SeoforgeError {
    fn from(e: StoreError) -> Self {
        SeoforgeError::Storage(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError>;

    async fn find_by_model_number(&self, model_number: &str) -> Result<Option<ProductRecord>, StoreError>;

    /// Insert or replace the whole record. Atomic per record.
    async fn save(&self, record: &ProductRecord) -> Result<(), StoreError>;
}

/// Model numbers are matched after trimming; empty means "no model".
pub(crate) fn model_key(model_number: Option<&str>) -> Option<String> {
    model_number
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
