use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use seoforge_core::ProductRecord;
use serde_json::json;
use tracing::debug;

use super::{timestamp, EnrichmentStage, StageError, StageName, StageOutput};
use crate::alt_text::generate_alt_texts;
use crate::patch::{PatchImage, ProductPatch};
use crate::sources::{with_timeout, ImageCandidate, ImageQuery, ImageSource, ImageSourceTag};

const HI_RES_HINTS: &[&str] = &["hires", "hi-res", "high-res", "highres", "large", "original", "2000", "1200"];
const FORMAT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];
const THUMBNAIL_HINTS: &[&str] = &["thumb", "icon", "small", "150x150", "_sm."];
const ISOLATED_HINTS: &[&str] = &["white", "isolated", "transparent", "cutout", "no-bg"];

fn base_score(tag: ImageSourceTag) -> i32 {
    match tag {
        ImageSourceTag::Manufacturer => 50,
        ImageSourceTag::Catalog => 40,
        ImageSourceTag::Stock => 30,
        ImageSourceTag::Ecommerce => 20,
    }
}

/// Source tag base plus URL hint adjustments.
pub fn score_image(candidate: &ImageCandidate) -> i32 {
    let url = candidate.url.to_lowercase();
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let has = |hints: &[&str]| hints.iter().any(|h| url.contains(h));

    let mut score = base_score(candidate.source);
    if has(HI_RES_HINTS) {
        score += 10;
    }
    if FORMAT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        score += 5;
    }
    if has(THUMBNAIL_HINTS) {
        score -= 20;
    }
    if has(ISOLATED_HINTS) {
        score += 15;
    }
    score
}

pub struct MediaDiscoveryStage {
    source: Arc<dyn ImageSource>,
    timeout: Duration,
    max_images: usize,
    min_score: i32,
}

impl MediaDiscoveryStage {
    pub fn new(source: Arc<dyn ImageSource>, timeout: Duration, max_images: usize, min_score: i32) -> Self {
        Self {
            source,
            timeout,
            max_images,
            min_score,
        }
    }

    /// Drop weak and duplicate candidates, best first, at most `max_images`.
    fn select(&self, candidates: Vec<ImageCandidate>) -> Vec<(ImageCandidate, i32)> {
        let mut scored: Vec<(ImageCandidate, i32)> = candidates
            .into_iter()
            .filter(|c| !c.url.trim().is_empty())
            .map(|c| {
                let score = score_image(&c);
                (c, score)
            })
            .filter(|(_, score)| *score >= self.min_score)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let mut seen = HashSet::new();
        scored.retain(|(c, _)| seen.insert(c.url.trim().to_string()));
        scored.truncate(self.max_images);
        scored
    }
}

#[async_trait::async_trait]
impl EnrichmentStage for MediaDiscoveryStage {
    fn name(&self) -> StageName {
        StageName::MediaDiscovery
    }

    async fn run(&self, record: &ProductRecord) -> Result<StageOutput, StageError> {
        if !record.gallery_images.is_empty() {
            return Ok(StageOutput::Skipped("gallery already populated".to_string()));
        }

        let query = ImageQuery {
            name: record.display_name(),
            brand: record.brand.as_deref(),
            model_number: record.model_number.as_deref(),
            max_images: self.max_images,
        };
        let candidates = with_timeout(self.timeout, self.source.discover(query)).await?;
        let found = candidates.len();
        let selected = self.select(candidates);
        if selected.is_empty() {
            return Ok(StageOutput::Skipped(format!(
                "no usable images ({} candidates)",
                found
            )));
        }
        debug!(record_id = %record.id, found, selected = selected.len(), "Images selected");

        let alts = generate_alt_texts(
            record.brand.as_deref(),
            record.display_name(),
            &record.image_alt_texts,
            selected.len(),
        );
        let scores: Vec<_> = selected
            .iter()
            .map(|(c, score)| json!({ "url": c.url, "source": c.source, "score": score }))
            .collect();
        let images = selected
            .into_iter()
            .zip(alts)
            .map(|((c, _), alt)| PatchImage::with_alt(c.url.trim(), alt))
            .collect();

        Ok(StageOutput::Patch(ProductPatch {
            images,
            ai_metadata: vec![(
                StageName::MediaDiscovery.as_str().to_string(),
                json!({
                    "candidates": found,
                    "selected": scores,
                    "discovered_at": timestamp(),
                }),
            )],
            ..ProductPatch::default()
        }))
    }
}
