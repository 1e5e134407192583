use seoforge_core::ProductRecord;
use seoforge_keywords::{KeywordContext, KeywordRanker};
use serde_json::json;
use tracing::debug;

use super::{timestamp, EnrichmentStage, StageError, StageName, StageOutput};
use crate::patch::ProductPatch;

pub const KEYWORD_MODEL: &str = "keyword-ranker";

/// Ranked keywords kept in the metadata entry for inspection.
const METADATA_TOP: usize = 5;

pub struct KeywordResearchStage {
    ranker: KeywordRanker,
}

impl KeywordResearchStage {
    pub fn new(ranker: KeywordRanker) -> Self {
        Self { ranker }
    }
}

fn context_for(record: &ProductRecord) -> KeywordContext {
    let mut ctx = KeywordContext::new(record.display_name()).with_seeds(record.seo_keywords.clone());
    if let Some(brand) = record.brand.as_deref().filter(|b| !b.trim().is_empty()) {
        ctx = ctx.with_brand(brand);
    }
    if let Some(category) = record.category.as_deref().filter(|c| !c.trim().is_empty()) {
        ctx = ctx.with_category(category);
    }
    ctx
}

#[async_trait::async_trait]
impl EnrichmentStage for KeywordResearchStage {
    fn name(&self) -> StageName {
        StageName::KeywordResearch
    }

    async fn run(&self, record: &ProductRecord) -> Result<StageOutput, StageError> {
        if !record.has_identity() {
            return Err(StageError::Invariant(format!(
                "record {} has neither name nor model number",
                record.id
            )));
        }

        let ranked = self.ranker.rank(&context_for(record));
        if ranked.is_empty() {
            return Ok(StageOutput::Skipped("no keyword candidates".to_string()));
        }
        debug!(record_id = %record.id, keywords = ranked.len(), "Keywords ranked");

        let top: Vec<_> = ranked.iter().take(METADATA_TOP).collect();
        let entry = json!({
            "model": KEYWORD_MODEL,
            "keywords": ranked.len(),
            "top": top,
            "generated_at": timestamp(),
        });
        Ok(StageOutput::Patch(ProductPatch {
            seo_keywords: Some(ranked.into_iter().map(|k| k.keyword).collect()),
            ai_metadata: vec![(StageName::KeywordResearch.as_str().to_string(), entry)],
            ..ProductPatch::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seoforge_core::ProductInput;
    use std::collections::HashSet;

    #[tokio::test]
    async fn ranks_with_name_first() {
        let record = ProductRecord::from_input(&ProductInput::named("Generic Drill").brand("Bosch"));
        let stage = KeywordResearchStage::new(KeywordRanker::default());
        let StageOutput::Patch(patch) = stage.run(&record).await.unwrap() else {
            panic!("expected a patch");
        };
        let keywords = patch.seo_keywords.unwrap();
        assert_eq!(keywords[0], "Generic Drill");
        assert!(keywords.len() <= 50);
        let unique: HashSet<_> = keywords.iter().collect();
        assert_eq!(unique.len(), keywords.len());
        assert_eq!(patch.ai_metadata[0].1["model"], KEYWORD_MODEL);
    }

    #[tokio::test]
    async fn model_number_stands_in_for_name() {
        let record = ProductRecord::from_input(&ProductInput::with_model("GSP180"));
        let stage = KeywordResearchStage::new(KeywordRanker::new(10));
        let StageOutput::Patch(patch) = stage.run(&record).await.unwrap() else {
            panic!("expected a patch");
        };
        let keywords = patch.seo_keywords.unwrap();
        assert_eq!(keywords[0], "GSP180");
        assert!(keywords.len() <= 10);
    }

    #[tokio::test]
    async fn record_without_identity_is_fatal() {
        let record = ProductRecord::from_input(&ProductInput::default());
        let err = KeywordResearchStage::new(KeywordRanker::default())
            .run(&record)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn rerun_is_stable() {
        let mut record = ProductRecord::from_input(&ProductInput::named("Generic Drill"));
        let stage = KeywordResearchStage::new(KeywordRanker::default());
        let StageOutput::Patch(first) = stage.run(&record).await.unwrap() else {
            panic!("expected a patch");
        };
        record.seo_keywords = first.seo_keywords.clone().unwrap();
        let StageOutput::Patch(second) = stage.run(&record).await.unwrap() else {
            panic!("expected a patch");
        };
        assert_eq!(first.seo_keywords, second.seo_keywords);
    }
}
