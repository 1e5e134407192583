use std::sync::Arc;
use std::time::Duration;

use seoforge_core::{ProductRecord, DESCRIPTION_MAX_CHARS};
use serde_json::json;
use tracing::debug;

use super::content::polish::truncate_chars;
use super::{timestamp, EnrichmentStage, StageError, StageName, StageOutput};
use crate::patch::{PatchImage, ProductPatch};
use crate::sources::{with_timeout, ManufacturerData, ManufacturerSource};

/// Looks the model number up on the manufacturer's side.
pub struct ManufacturerLookupStage {
    source: Arc<dyn ManufacturerSource>,
    timeout: Duration,
}

impl ManufacturerLookupStage {
    pub fn new(source: Arc<dyn ManufacturerSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    fn to_patch(&self, model_number: &str, data: ManufacturerData) -> ProductPatch {
        // A hit always counts as a consulted source, even without a page URL.
        let source_url = data
            .source_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("manufacturer://{}/{}", self.source.source_name(), model_number));
        let fields: Vec<&str> = [
            data.name.as_ref().map(|_| "name"),
            data.description.as_ref().map(|_| "description"),
            data.price.map(|_| "price"),
            (!data.specifications.is_empty()).then_some("specifications"),
            (!data.images.is_empty()).then_some("images"),
        ]
        .into_iter()
        .flatten()
        .collect();

        ProductPatch {
            name: data.name,
            description: data
                .description
                .map(|d| truncate_chars(&d, DESCRIPTION_MAX_CHARS)),
            price: data.price,
            specifications: data.specifications,
            images: data.images.into_iter().map(PatchImage::new).collect(),
            ai_metadata: vec![(
                StageName::ManufacturerLookup.as_str().to_string(),
                json!({
                    "source": self.source.source_name(),
                    "source_url": source_url,
                    "fields": fields,
                    "looked_up_at": timestamp(),
                }),
            )],
            source_urls: vec![source_url],
            ..ProductPatch::default()
        }
    }
}

#[async_trait::async_trait]
impl EnrichmentStage for ManufacturerLookupStage {
    fn name(&self) -> StageName {
        StageName::ManufacturerLookup
    }

    async fn run(&self, record: &ProductRecord) -> Result<StageOutput, StageError> {
        let Some(model) = record
            .model_number
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
        else {
            return Ok(StageOutput::Skipped("no model number".to_string()));
        };

        let lookup = self.source.lookup(model, record.brand.as_deref());
        match with_timeout(self.timeout, lookup).await? {
            Some(data) => {
                debug!(record_id = %record.id, model, source = self.source.source_name(), "Manufacturer data found");
                Ok(StageOutput::Patch(self.to_patch(model, data)))
            }
            None => Ok(StageOutput::Skipped("no manufacturer data".to_string())),
        }
    }
}
