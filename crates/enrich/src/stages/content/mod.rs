//! Content generation stage.
//!
//! - `template`: the built-in composer and the no-I/O fallback template
//! - `polish`: keyword presence, ceilings and heuristic enhancement

pub(crate) mod polish;
mod template;

pub use template::{fallback_content, TemplateContentGenerator, FALLBACK_MODEL, TEMPLATE_MODEL};

use std::sync::Arc;
use std::time::Duration;

use seoforge_core::{is_filled, ProductRecord};
use serde_json::json;
use tracing::{debug, warn};

use super::{timestamp, EnrichmentStage, StageError, StageName, StageOutput};
use crate::patch::ProductPatch;
use crate::sources::{with_timeout, ContentContext, ContentGenerator, GeneratedContent};

const CONTEXT_KEYWORDS: usize = 5;
const CONTEXT_SPECIFICATIONS: usize = 3;

pub struct ContentGenerationStage {
    generator: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl ContentGenerationStage {
    pub fn new(generator: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

fn context_for(record: &ProductRecord) -> ContentContext {
    ContentContext {
        name: record.display_name().to_string(),
        brand: record.brand.clone().filter(|b| !b.trim().is_empty()),
        category: record.category.clone().filter(|c| !c.trim().is_empty()),
        keywords: record.seo_keywords.iter().take(CONTEXT_KEYWORDS).cloned().collect(),
        specifications: record
            .specifications
            .iter()
            .take(CONTEXT_SPECIFICATIONS)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Blank generated fields are taken from the fallback template.
fn backfill(mut content: GeneratedContent, fallback: &GeneratedContent) -> (GeneratedContent, bool) {
    let mut used = false;
    for (field, default) in [
        (&mut content.brief, &fallback.brief),
        (&mut content.description, &fallback.description),
        (&mut content.seo_title, &fallback.seo_title),
        (&mut content.meta_description, &fallback.meta_description),
    ] {
        if field.trim().is_empty() {
            *field = default.clone();
            used = true;
        }
    }
    (content, used)
}

#[async_trait::async_trait]
impl EnrichmentStage for ContentGenerationStage {
    fn name(&self) -> StageName {
        StageName::ContentGeneration
    }

    async fn run(&self, record: &ProductRecord) -> Result<StageOutput, StageError> {
        let missing = [
            &record.brief,
            &record.description,
            &record.seo_title,
            &record.meta_description,
        ]
        .into_iter()
        .filter(|f| !is_filled(f))
        .count();
        if missing == 0 {
            return Ok(StageOutput::Skipped("content already present".to_string()));
        }

        let ctx = context_for(record);
        let fallback = fallback_content(&ctx);
        let (content, model, fell_back) =
            match with_timeout(self.timeout, self.generator.generate(&ctx)).await {
                Ok(content) => {
                    let (content, partial) = backfill(content, &fallback);
                    (content, self.generator.model_name().to_string(), partial)
                }
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        generator = self.generator.model_name(),
                        error = %e,
                        "Content generation failed, using fallback template"
                    );
                    (fallback, FALLBACK_MODEL.to_string(), true)
                }
            };

        let content = polish::finalize(content, ctx.keywords.first().map(String::as_str));
        debug!(record_id = %record.id, model = %model, fallback = fell_back, "Content composed");

        Ok(StageOutput::Patch(ProductPatch {
            brief: Some(content.brief),
            description: Some(content.description),
            seo_title: Some(content.seo_title),
            meta_description: Some(content.meta_description),
            ai_metadata: vec![(
                StageName::ContentGeneration.as_str().to_string(),
                json!({
                    "model": model,
                    "fallback": fell_back,
                    "fields_missing": missing,
                    "generated_at": timestamp(),
                }),
            )],
            ..ProductPatch::default()
        }))
    }
}
