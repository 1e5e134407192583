//! Product enrichment pipeline.
//!
//! This crate provides:
//! - Capability traits for manufacturer, image and content sources
//! - Record stores (in-memory and JSON files)
//! - The fill-don't-replace merge policy
//! - The four enrichment stages
//! - The orchestrator that runs them under per-record locks

pub mod alt_text;
pub mod locks;
pub mod merge;
pub mod orchestrator;
pub mod patch;
pub mod sources;
pub mod stages;
pub mod store;

pub use merge::{apply_patch, MergeReport};
pub use orchestrator::{
    CancelSignal, EnrichmentOrchestrator, OrchestratorBuilder, ProcessMetadata, ProcessOutcome,
    StageReport, StatusReport,
};
pub use patch::{PatchImage, ProductPatch};
pub use sources::{
    ContentContext, ContentGenerator, GeneratedContent, ImageCandidate, ImageQuery, ImageSource,
    ImageSourceTag, ManufacturerData, ManufacturerSource, NoopImageSource, NoopManufacturerSource,
    SourceError,
};
pub use stages::{EnrichmentStage, StageError, StageName, StageOutput, TemplateContentGenerator};
pub use store::{InMemoryProductStore, JsonFileProductStore, ProductStore, StoreError};
