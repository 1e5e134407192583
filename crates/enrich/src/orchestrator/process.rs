use std::time::Instant;

use seoforge_core::{EnrichmentStatus, ProductId, ProductInput, ProductRecord, SeoforgeError};
use tracing::{debug, error, info, warn};

use super::{CancelSignal, EnrichmentOrchestrator, ProcessMetadata, ProcessOutcome, StageReport};
use crate::merge::apply_patch;
use crate::patch::ProductPatch;
use crate::stages::StageOutput;
use crate::store::{model_key, StoreError};

fn lock_key(model_number: Option<&str>, id: ProductId) -> String {
    match model_key(model_number) {
        Some(model) => format!("model:{}", model),
        None => format!("id:{}", id),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn note_patch(metadata: &mut ProcessMetadata, patch: &ProductPatch) {
    for url in &patch.source_urls {
        if !metadata.sources_consulted.contains(url) {
            metadata.sources_consulted.push(url.clone());
        }
    }
    for (_, entry) in &patch.ai_metadata {
        if let Some(model) = entry.get("model").and_then(|m| m.as_str()) {
            if !metadata.models_invoked.iter().any(|m| m == model) {
                metadata.models_invoked.push(model.to_string());
            }
        }
    }
}

impl EnrichmentOrchestrator {
    /// Enrich `input`, reusing the record with the same model number when
    /// one exists. Always yields a record-shaped outcome.
    pub async fn process(&self, input: &ProductInput) -> ProcessOutcome {
        self.process_with(input, &CancelSignal::new()).await
    }

    pub async fn process_with(&self, input: &ProductInput, cancel: &CancelSignal) -> ProcessOutcome {
        let started = Instant::now();
        let input = input.normalized();
        let fresh = ProductRecord::from_input(&input);
        let _guard = self
            .locks
            .lock(lock_key(input.model_number.as_deref(), fresh.id))
            .await;

        match self.resolve(&input, fresh.clone()).await {
            Ok(record) => self.run_locked(record, cancel, started).await,
            Err(e) => {
                error!(model_number = ?input.model_number, error = %e, "Could not resolve record");
                // Nothing was persisted; report the input as a failed record.
                let mut record = fresh;
                record.enrichment_status = EnrichmentStatus::Failed;
                let metadata = ProcessMetadata {
                    elapsed_ms: elapsed_ms(started),
                    error: Some(SeoforgeError::from(e).to_string()),
                    ..ProcessMetadata::default()
                };
                ProcessOutcome::new(record, metadata)
            }
        }
    }

    /// Existing record for the input's model number (with the input's
    /// fields filled in), or `fresh`.
    async fn resolve(&self, input: &ProductInput, fresh: ProductRecord) -> Result<ProductRecord, StoreError> {
        let Some(model) = input.model_number.as_deref() else {
            return Ok(fresh);
        };
        let Some(mut existing) = self.store.find_by_model_number(model).await? else {
            return Ok(fresh);
        };

        let mut patch = ProductPatch::from_input(input);
        let new_seeds: Vec<String> = input
            .seo_keywords
            .iter()
            .filter(|k| !existing.seo_keywords.contains(k))
            .cloned()
            .collect();
        if !new_seeds.is_empty() {
            let mut keywords = existing.seo_keywords.clone();
            keywords.extend(new_seeds);
            patch.seo_keywords = Some(keywords);
        }
        let merge = apply_patch(&mut existing, patch);
        debug!(
            record_id = %existing.id,
            model_number = model,
            filled = merge.filled.len(),
            "Reusing existing record"
        );
        Ok(existing)
    }

    /// Re-run the pipeline for a stored record. Completed records are left
    /// alone unless `force` is set; forced runs still only fill gaps.
    pub async fn reprocess(&self, id: ProductId, force: bool) -> Result<ProcessOutcome, SeoforgeError> {
        let started = Instant::now();
        let known = self.get(id).await?;
        let _guard = self
            .locks
            .lock(lock_key(known.model_number.as_deref(), known.id))
            .await;

        // Another run may have finished while we waited.
        let record = self.get(id).await?;
        if record.enrichment_status == EnrichmentStatus::Completed && !force {
            debug!(record_id = %id, "Record already completed, reprocess skipped");
            let metadata = ProcessMetadata {
                elapsed_ms: elapsed_ms(started),
                skipped_reason: Some("record already completed".to_string()),
                ..ProcessMetadata::default()
            };
            return Ok(ProcessOutcome::new(record, metadata));
        }

        info!(
            record_id = %id,
            force,
            previous_status = %record.enrichment_status,
            "Reprocessing record"
        );
        Ok(self.run_locked(record, &CancelSignal::new(), started).await)
    }

    /// Reprocess each id in turn; one failure does not stop the rest.
    pub async fn reprocess_batch(
        &self,
        ids: &[ProductId],
        force: bool,
    ) -> Vec<(ProductId, Result<ProcessOutcome, SeoforgeError>)> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = self.reprocess(id, force).await;
            if let Err(e) = &result {
                warn!(record_id = %id, error = %e, "Batch reprocess entry failed");
            }
            results.push((id, result));
        }
        results
    }

    /// The stage loop. The caller holds the record's key lock.
    async fn run_locked(
        &self,
        mut record: ProductRecord,
        cancel: &CancelSignal,
        started: Instant,
    ) -> ProcessOutcome {
        let mut metadata = ProcessMetadata::default();

        if let Err(e) = record.transition(EnrichmentStatus::Processing) {
            return self.fail(record, e, metadata, started).await;
        }
        if let Err(e) = self.store.save(&record).await {
            return self.fail(record, e.into(), metadata, started).await;
        }
        info!(record_id = %record.id, model_number = ?record.model_number, "Enrichment started");

        if !record.has_identity() {
            let e = SeoforgeError::Invariant(format!(
                "record {} has neither name nor model number",
                record.id
            ));
            return self.fail(record, e, metadata, started).await;
        }

        for stage in &self.stages {
            let name = stage.name();
            if cancel.is_cancelled() {
                info!(record_id = %record.id, next_stage = %name, "Enrichment cancelled, record left processing");
                metadata.cancelled = true;
                metadata.elapsed_ms = elapsed_ms(started);
                return ProcessOutcome::new(record, metadata);
            }

            match stage.run(&record).await {
                Ok(StageOutput::Patch(patch)) => {
                    note_patch(&mut metadata, &patch);
                    let merge = apply_patch(&mut record, patch);
                    metadata.stages.push(StageReport::applied(name, &merge));
                    if merge.changed() {
                        if let Err(e) = self.store.save(&record).await {
                            return self.fail(record, e.into(), metadata, started).await;
                        }
                    }
                    debug!(
                        record_id = %record.id,
                        stage = %name,
                        filled = merge.filled.len(),
                        images = merge.images_added,
                        "Stage applied"
                    );
                }
                Ok(StageOutput::Skipped(reason)) => {
                    debug!(record_id = %record.id, stage = %name, reason = %reason, "Stage skipped");
                    metadata.stages.push(StageReport::skipped(name, reason));
                }
                Err(e) if e.is_fatal() => {
                    metadata.stages.push(StageReport::failed(name, e.to_string()));
                    return self.fail(record, e.into(), metadata, started).await;
                }
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        stage = %name,
                        error = %e,
                        "Stage failed, continuing without its data"
                    );
                    metadata.stages.push(StageReport::failed(name, e.to_string()));
                }
            }
        }

        let mut completed = record.clone();
        if let Err(e) = completed.transition(EnrichmentStatus::Completed) {
            return self.fail(record, e, metadata, started).await;
        }
        if let Err(e) = self.store.save(&completed).await {
            return self.fail(record, e.into(), metadata, started).await;
        }

        metadata.elapsed_ms = elapsed_ms(started);
        info!(
            record_id = %completed.id,
            elapsed_ms = metadata.elapsed_ms,
            missing = completed.missing_fields().len(),
            "Enrichment completed"
        );
        ProcessOutcome::new(completed, metadata)
    }

    /// Mark `record` failed and make one attempt to persist that.
    async fn fail(
        &self,
        mut record: ProductRecord,
        error: SeoforgeError,
        mut metadata: ProcessMetadata,
        started: Instant,
    ) -> ProcessOutcome {
        error!(record_id = %record.id, error = %error, "Enrichment failed");
        if record.transition(EnrichmentStatus::Failed).is_err() {
            record.enrichment_status = EnrichmentStatus::Failed;
            record.touch();
        }
        if let Err(e) = self.store.save(&record).await {
            error!(record_id = %record.id, error = %e, "Could not persist failed status");
        }
        metadata.error = Some(error.to_string());
        metadata.elapsed_ms = elapsed_ms(started);
        ProcessOutcome::new(record, metadata)
    }
}
