use std::collections::BTreeMap;

use seoforge_core::{is_filled, ProductInput};

/// A gallery image proposed by a stage, with optional alt text.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchImage {
    pub url: String,
    pub alt_text: Option<String>,
}

impl PatchImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt_text: None,
        }
    }

    pub fn with_alt(url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt_text: Some(alt_text.into()),
        }
    }
}

/// Partial update returned by a stage. Every field is a candidate; the
/// merge step decides what actually lands on the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub brief: Option<String>,
    pub description: Option<String>,
    pub seo_title: Option<String>,
    pub meta_description: Option<String>,
    pub price: Option<f64>,

    /// Replacement keyword ranking. `None` leaves keywords untouched.
    pub seo_keywords: Option<Vec<String>>,
    pub images: Vec<PatchImage>,
    pub specifications: BTreeMap<String, String>,
    pub source_urls: Vec<String>,
    /// `(stage key, entry)` pairs appended to `ai_metadata[stage key]`.
    pub ai_metadata: Vec<(String, serde_json::Value)>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        !is_filled(&self.name)
            && !is_filled(&self.brand)
            && !is_filled(&self.category)
            && !is_filled(&self.brief)
            && !is_filled(&self.description)
            && !is_filled(&self.seo_title)
            && !is_filled(&self.meta_description)
            && self.price.is_none()
            && self.seo_keywords.as_ref().map_or(true, Vec::is_empty)
            && self.images.is_empty()
            && self.specifications.is_empty()
            && self.source_urls.is_empty()
            && self.ai_metadata.is_empty()
    }

    /// Fields a re-submitted input may contribute to an existing record.
    /// Input keywords are seeds for ranking, not a replacement list.
    pub fn from_input(input: &ProductInput) -> Self {
        let input = input.normalized();
        Self {
            name: input.name,
            brand: input.brand,
            category: input.category,
            description: input.description,
            price: input.price,
            specifications: input.specifications,
            ..Self::default()
        }
    }
}
