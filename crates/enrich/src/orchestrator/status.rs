use seoforge_core::{ProductId, ProductRecord, SeoforgeError};

use super::{EnrichmentOrchestrator, StatusReport};

impl EnrichmentOrchestrator {
    pub async fn get(&self, id: ProductId) -> Result<ProductRecord, SeoforgeError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SeoforgeError::NotFound(format!("product {}", id)))
    }

    pub async fn get_by_model_number(&self, model_number: &str) -> Result<ProductRecord, SeoforgeError> {
        self.store
            .find_by_model_number(model_number)
            .await?
            .ok_or_else(|| SeoforgeError::NotFound(format!("product with model number {}", model_number)))
    }

    /// Status plus which tracked fields are filled.
    pub async fn get_status(&self, id: ProductId) -> Result<StatusReport, SeoforgeError> {
        Ok(StatusReport::for_record(&self.get(id).await?))
    }
}
