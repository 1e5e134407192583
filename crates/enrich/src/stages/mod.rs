//! Enrichment stages.
//!
//! Each stage reads a record snapshot and returns a [`ProductPatch`]; none
//! of them mutates the record. Stages run in [`StageName::ORDER`]:
//! - `manufacturer`: manufacturer page lookup by model number
//! - `keywords`: keyword candidate generation and ranking
//! - `content`: brief / description / SEO copy
//! - `media`: gallery image discovery and alt text

pub mod content;
mod keywords;
mod manufacturer;
mod media;

pub use content::{ContentGenerationStage, TemplateContentGenerator};
pub use keywords::KeywordResearchStage;
pub use manufacturer::ManufacturerLookupStage;
pub use media::{score_image, MediaDiscoveryStage};

use seoforge_core::ProductRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patch::ProductPatch;
use crate::sources::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    ManufacturerLookup,
    KeywordResearch,
    ContentGeneration,
    MediaDiscovery,
}

impl StageName {
    pub const ORDER: [StageName; 4] = [
        StageName::ManufacturerLookup,
        StageName::KeywordResearch,
        StageName::ContentGeneration,
        StageName::MediaDiscovery,
    ];

    /// Also the stage's key in `ai_metadata`.
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::ManufacturerLookup => "manufacturer_lookup",
            StageName::KeywordResearch => "keyword_research",
            StageName::ContentGeneration => "content_generation",
            StageName::MediaDiscovery => "media_discovery",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a stage that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Patch(ProductPatch),
    /// Nothing to do; the reason ends up in the stage report.
    Skipped(String),
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<StageError> for seoforge_core::SeoforgeError {
    fn from(e: StageError) -> Self {
        match e {
            StageError::Source(e) => e.into(),
            StageError::Invariant(msg) => seoforge_core::SeoforgeError::Invariant(msg),
        }
    }
}

impl StageError {
    /// Only invariant violations abort the pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Invariant(_))
    }
}

#[async_trait::async_trait]
pub trait EnrichmentStage: Send + Sync {
    fn name(&self) -> StageName;

    async fn run(&self, record: &ProductRecord) -> Result<StageOutput, StageError>;
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
