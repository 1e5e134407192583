//! Fill-don't-replace merge policy.
//!
//! The only place a [`ProductRecord`] is mutated by stage output:
//! - scalar fields (and price) are set only while empty
//! - `seo_keywords` is replaced wholesale by a non-empty ranking
//! - images, specifications, source URLs and metadata only ever grow
//! - `image_alt_texts` stays parallel to `gallery_images`

use std::collections::HashSet;

use seoforge_core::{is_filled, ProductRecord, TrackedField};
use serde::Serialize;

use crate::alt_text::{generate_alt_texts, unique_alt_text};
use crate::patch::{PatchImage, ProductPatch};

/// What a single merge changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Scalar fields that went from empty to filled.
    pub filled: Vec<TrackedField>,
    pub keywords_replaced: bool,
    pub images_added: usize,
    pub specifications_added: usize,
    pub sources_added: usize,
    pub metadata_appended: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.filled.is_empty()
            || self.keywords_replaced
            || self.images_added > 0
            || self.specifications_added > 0
            || self.sources_added > 0
            || self.metadata_appended > 0
    }
}

fn fill(slot: &mut Option<String>, candidate: Option<String>) -> bool {
    if is_filled(slot) {
        return false;
    }
    match candidate
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
    {
        Some(value) => {
            *slot = Some(value);
            true
        }
        None => false,
    }
}

/// Apply `patch` to `record` under the fill-don't-replace policy.
pub fn apply_patch(record: &mut ProductRecord, patch: ProductPatch) -> MergeReport {
    let mut report = MergeReport::default();
    let ProductPatch {
        name,
        brand,
        category,
        brief,
        description,
        seo_title,
        meta_description,
        price,
        seo_keywords,
        images,
        specifications,
        source_urls,
        ai_metadata,
    } = patch;

    let scalars = [
        (TrackedField::Name, &mut record.name, name),
        (TrackedField::Brand, &mut record.brand, brand),
        (TrackedField::Category, &mut record.category, category),
        (TrackedField::Brief, &mut record.brief, brief),
        (TrackedField::Description, &mut record.description, description),
        (TrackedField::SeoTitle, &mut record.seo_title, seo_title),
        (TrackedField::MetaDescription, &mut record.meta_description, meta_description),
    ];
    for (field, slot, candidate) in scalars {
        if fill(slot, candidate) {
            report.filled.push(field);
        }
    }

    if record.price.is_none() {
        if let Some(p) = price.filter(|p| p.is_finite() && *p >= 0.0) {
            record.price = Some(p);
            report.filled.push(TrackedField::Price);
        }
    }

    if let Some(keywords) = seo_keywords {
        let mut ranked: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let keyword = keyword.trim().to_string();
            if !keyword.is_empty() && !ranked.contains(&keyword) {
                ranked.push(keyword);
            }
        }
        if !ranked.is_empty() && ranked != record.seo_keywords {
            record.seo_keywords = ranked;
            report.keywords_replaced = true;
        }
    }

    repair_alt_texts(record);
    report.images_added = merge_images(record, images);

    for (key, value) in specifications {
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() || record.specifications.contains_key(key) {
            continue;
        }
        record.specifications.insert(key.to_string(), value.to_string());
        report.specifications_added += 1;
    }

    for url in source_urls {
        let url = url.trim();
        if !url.is_empty() && record.source_urls.insert(url.to_string()) {
            report.sources_added += 1;
        }
    }

    for (stage, entry) in ai_metadata {
        let slot = record
            .ai_metadata
            .entry(stage)
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        match slot {
            serde_json::Value::Array(entries) => entries.push(entry),
            other => {
                let previous = other.take();
                *other = serde_json::Value::Array(vec![previous, entry]);
            }
        }
        report.metadata_appended += 1;
    }

    if report.changed() {
        record.touch();
    }
    report
}

/// Bring `image_alt_texts` back to the length of `gallery_images`.
fn repair_alt_texts(record: &mut ProductRecord) {
    let images = record.gallery_images.len();
    let alts = record.image_alt_texts.len();
    if alts > images {
        record.image_alt_texts.truncate(images);
    } else if alts < images {
        let missing = generate_alt_texts(
            record.brand.as_deref(),
            record.display_name(),
            &record.image_alt_texts,
            images - alts,
        );
        record.image_alt_texts.extend(missing);
    }
}

fn merge_images(record: &mut ProductRecord, images: Vec<PatchImage>) -> usize {
    let mut added = 0;
    for image in images {
        let url = image.url.trim();
        if url.is_empty() || record.gallery_images.iter().any(|u| u == url) {
            continue;
        }
        let alt = match image.alt_text.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(alt) => {
                let taken: HashSet<String> = record.image_alt_texts.iter().cloned().collect();
                unique_alt_text(alt, &taken)
            }
            None => generate_alt_texts(
                record.brand.as_deref(),
                record.display_name(),
                &record.image_alt_texts,
                1,
            )
            .pop()
            .unwrap_or_else(|| record.display_name().to_string()),
        };
        record.gallery_images.push(url.to_string());
        record.image_alt_texts.push(alt);
        added += 1;
    }
    added
}
