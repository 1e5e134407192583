//! Enrichment orchestrator.
//!
//! Drives a record through the stages in fixed order, applies the merge
//! policy after each stage and owns the status state machine. At most one
//! run per record identity is in flight at a time.
//!
//! - `process`: resolve-or-create, the stage loop and terminal writes
//! - `status`: record lookup and completion reports
//! - `types`: outcome and report types

mod process;
mod status;
mod types;


pub use types::{ProcessMetadata, ProcessOutcome, StageReport, StatusReport};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use seoforge_core::config::PipelineConfig;
use seoforge_keywords::KeywordRanker;

use crate::locks::KeyedLocks;
use crate::sources::{
    ContentGenerator, ImageSource, ManufacturerSource, NoopImageSource, NoopManufacturerSource,
};
use crate::stages::{
    ContentGenerationStage, EnrichmentStage, KeywordResearchStage, ManufacturerLookupStage,
    MediaDiscoveryStage, TemplateContentGenerator,
};
use crate::store::ProductStore;

// ── Cancellation ─────────────────────────────────────────────────────

/// Caller-side cancellation. Checked before each stage, never mid-stage.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────

pub struct EnrichmentOrchestrator {
    store: Arc<dyn ProductStore>,
    stages: Vec<Box<dyn EnrichmentStage>>,
    locks: KeyedLocks,
}

impl EnrichmentOrchestrator {
    pub fn builder(store: Arc<dyn ProductStore>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(store)
    }

    /// Orchestrator over an explicit stage list, run in the given order.
    pub(crate) fn from_stages(store: Arc<dyn ProductStore>, stages: Vec<Box<dyn EnrichmentStage>>) -> Self {
        Self {
            store,
            stages,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Fluent builder for an [`EnrichmentOrchestrator`].
///
/// Every capability defaults to its offline implementation.
///
/// ```ignore
/// let orchestrator = EnrichmentOrchestrator::builder(store)
///     .manufacturer_source(Arc::new(MySource))
///     .config(config.pipeline.clone())
///     .build();
/// ```
pub struct OrchestratorBuilder {
    store: Arc<dyn ProductStore>,
    manufacturer: Arc<dyn ManufacturerSource>,
    images: Arc<dyn ImageSource>,
    content: Arc<dyn ContentGenerator>,
    config: PipelineConfig,
}

impl OrchestratorBuilder {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            manufacturer: Arc::new(NoopManufacturerSource),
            images: Arc::new(NoopImageSource),
            content: Arc::new(TemplateContentGenerator),
            config: PipelineConfig::default(),
        }
    }

    pub fn manufacturer_source(mut self, source: Arc<dyn ManufacturerSource>) -> Self {
        self.manufacturer = source;
        self
    }

    pub fn image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.images = source;
        self
    }

    pub fn content_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.content = generator;
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> EnrichmentOrchestrator {
        let timeout = self.config.source_timeout();
        let stages: Vec<Box<dyn EnrichmentStage>> = vec![
            Box::new(ManufacturerLookupStage::new(self.manufacturer, timeout)),
            Box::new(KeywordResearchStage::new(KeywordRanker::new(self.config.max_keywords))),
            Box::new(ContentGenerationStage::new(self.content, timeout)),
            Box::new(MediaDiscoveryStage::new(
                self.images,
                timeout,
                self.config.max_images,
                self.config.min_image_score,
            )),
        ];
        EnrichmentOrchestrator::from_stages(self.store, stages)
    }
}
