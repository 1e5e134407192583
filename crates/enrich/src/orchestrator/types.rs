use seoforge_core::{EnrichmentStatus, ProductRecord, TrackedField};
use serde::Serialize;

use crate::merge::MergeReport;
use crate::stages::StageName;

/// What one stage did during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: StageName,
    /// The stage returned a patch (it may still have changed nothing).
    pub applied: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fields_filled: Vec<TrackedField>,
}

impl StageReport {
    pub(crate) fn applied(stage: StageName, merge: &MergeReport) -> Self {
        Self {
            stage,
            applied: true,
            skipped: false,
            reason: None,
            error: None,
            fields_filled: merge.filled.clone(),
        }
    }

    pub(crate) fn skipped(stage: StageName, reason: impl Into<String>) -> Self {
        Self {
            stage,
            applied: false,
            skipped: true,
            reason: Some(reason.into()),
            error: None,
            fields_filled: Vec::new(),
        }
    }

    pub(crate) fn failed(stage: StageName, error: impl Into<String>) -> Self {
        Self {
            stage,
            applied: false,
            skipped: false,
            reason: None,
            error: Some(error.into()),
            fields_filled: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessMetadata {
    pub elapsed_ms: u64,
    /// Source URLs contributed during this run.
    pub sources_consulted: Vec<String>,
    /// Generators and rankers invoked during this run.
    pub models_invoked: Vec<String>,
    pub stages: Vec<StageReport>,
    pub cancelled: bool,
    /// Set when a reprocess request found nothing to do.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
    /// The fatal error behind a `failed` status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub record: ProductRecord,
    pub status: EnrichmentStatus,
    pub metadata: ProcessMetadata,
}

impl ProcessOutcome {
    pub(crate) fn new(record: ProductRecord, metadata: ProcessMetadata) -> Self {
        Self {
            status: record.enrichment_status,
            record,
            metadata,
        }
    }

    pub fn stage(&self, stage: StageName) -> Option<&StageReport> {
        self.metadata.stages.iter().find(|r| r.stage == stage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: EnrichmentStatus,
    pub completion_percentage: u8,
    pub completed_fields: Vec<TrackedField>,
    pub missing_fields: Vec<TrackedField>,
}

impl StatusReport {
    pub fn for_record(record: &ProductRecord) -> Self {
        let completed_fields = record.filled_fields();
        let missing_fields = record.missing_fields();
        let total = TrackedField::ALL.len();
        let percentage = (completed_fields.len() as f64 * 100.0 / total as f64).round() as u8;
        Self {
            status: record.enrichment_status,
            completion_percentage: percentage,
            completed_fields,
            missing_fields,
        }
    }
}
