use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SeoforgeError;

/// Opaque record identifier, assigned when a record is first created.
pub type ProductId = Uuid;

/// Hard character ceilings for generated copy.
pub const BRIEF_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const SEO_TITLE_MAX_CHARS: usize = 60;
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;

const NAME_MAX_CHARS: usize = 200;
const MODEL_NUMBER_MAX_CHARS: usize = 100;

// ── Status ────────────────────────────────────────────────────

/// Lifecycle of a record inside the enrichment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EnrichmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EnrichmentStatus::Completed | EnrichmentStatus::Failed)
    }

    /// Any state may (re-)enter `Processing`; terminal states are only
    /// reachable from `Processing`.
    pub fn can_transition_to(self, next: EnrichmentStatus) -> bool {
        match next {
            EnrichmentStatus::Processing => true,
            EnrichmentStatus::Completed | EnrichmentStatus::Failed => {
                self == EnrichmentStatus::Processing
            }
            EnrichmentStatus::Pending => false,
        }
    }
}

impl std::fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentStatus::Pending => write!(f, "pending"),
            EnrichmentStatus::Processing => write!(f, "processing"),
            EnrichmentStatus::Completed => write!(f, "completed"),
            EnrichmentStatus::Failed => write!(f, "failed"),
        }
    }
}

// ── Tracked fields ────────────────────────────────────────────

/// Fields counted by status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Name,
    Brand,
    Category,
    Brief,
    Description,
    SeoTitle,
    MetaDescription,
    Price,
    SeoKeywords,
    GalleryImages,
    Specifications,
}

impl TrackedField {
    pub const ALL: [TrackedField; 11] = [
        TrackedField::Name,
        TrackedField::Brand,
        TrackedField::Category,
        TrackedField::Brief,
        TrackedField::Description,
        TrackedField::SeoTitle,
        TrackedField::MetaDescription,
        TrackedField::Price,
        TrackedField::SeoKeywords,
        TrackedField::GalleryImages,
        TrackedField::Specifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::Name => "name",
            TrackedField::Brand => "brand",
            TrackedField::Category => "category",
            TrackedField::Brief => "brief",
            TrackedField::Description => "description",
            TrackedField::SeoTitle => "seo_title",
            TrackedField::MetaDescription => "meta_description",
            TrackedField::Price => "price",
            TrackedField::SeoKeywords => "seo_keywords",
            TrackedField::GalleryImages => "gallery_images",
            TrackedField::Specifications => "specifications",
        }
    }

    pub fn is_filled(self, record: &ProductRecord) -> bool {
        match self {
            TrackedField::Name => is_filled(&record.name),
            TrackedField::Brand => is_filled(&record.brand),
            TrackedField::Category => is_filled(&record.category),
            TrackedField::Brief => is_filled(&record.brief),
            TrackedField::Description => is_filled(&record.description),
            TrackedField::SeoTitle => is_filled(&record.seo_title),
            TrackedField::MetaDescription => is_filled(&record.meta_description),
            TrackedField::Price => record.price.is_some(),
            TrackedField::SeoKeywords => !record.seo_keywords.is_empty(),
            TrackedField::GalleryImages => !record.gallery_images.is_empty(),
            TrackedField::Specifications => !record.specifications.is_empty(),
        }
    }
}

/// A text field counts as filled once it holds anything but whitespace.
pub fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ── Record ────────────────────────────────────────────────────

/// The unit of work flowing through the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub model_number: Option<String>,

    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub brief: Option<String>,
    pub description: Option<String>,
    pub seo_title: Option<String>,
    pub meta_description: Option<String>,
    pub price: Option<f64>,

    /// Rank order, no duplicates.
    pub seo_keywords: Vec<String>,
    pub gallery_images: Vec<String>,
    /// Parallel to `gallery_images`.
    pub image_alt_texts: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub source_urls: BTreeSet<String>,
    /// Per-stage invocation log; each value is a JSON array that only grows.
    pub ai_metadata: BTreeMap<String, serde_json::Value>,

    pub enrichment_status: EnrichmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Seed a new, pending record from caller input.
    pub fn from_input(input: &ProductInput) -> Self {
        let input = input.normalized();
        let now = Utc::now();
        let mut seo_keywords: Vec<String> = Vec::new();
        for keyword in input.seo_keywords {
            if !seo_keywords.contains(&keyword) {
                seo_keywords.push(keyword);
            }
        }
        Self {
            id: Uuid::new_v4(),
            model_number: input.model_number,
            name: input.name,
            brand: input.brand,
            category: input.category,
            brief: None,
            description: input.description,
            seo_title: None,
            meta_description: None,
            price: input.price,
            seo_keywords,
            gallery_images: Vec::new(),
            image_alt_texts: Vec::new(),
            specifications: input.specifications,
            source_urls: BTreeSet::new(),
            ai_metadata: BTreeMap::new(),
            enrichment_status: EnrichmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Move to `next`, refusing transitions the state machine forbids.
    pub fn transition(&mut self, next: EnrichmentStatus) -> Result<(), SeoforgeError> {
        if !self.enrichment_status.can_transition_to(next) {
            return Err(SeoforgeError::Invariant(format!(
                "illegal status transition {} -> {} for record {}",
                self.enrichment_status, next, self.id
            )));
        }
        self.enrichment_status = next;
        self.touch();
        Ok(())
    }

    /// True when the record carries a name or a model number.
    pub fn has_identity(&self) -> bool {
        is_filled(&self.name) || is_filled(&self.model_number)
    }

    /// Best human-facing label: name, then model number.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.model_number.as_deref().filter(|m| !m.trim().is_empty()))
            .unwrap_or("Product")
    }

    pub fn filled_fields(&self) -> Vec<TrackedField> {
        TrackedField::ALL
            .into_iter()
            .filter(|f| f.is_filled(self))
            .collect()
    }

    pub fn missing_fields(&self) -> Vec<TrackedField> {
        TrackedField::ALL
            .into_iter()
            .filter(|f| !f.is_filled(self))
            .collect()
    }
}

// ── Input ─────────────────────────────────────────────────────

/// Sparse caller input accepted by the pipeline entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub model_number: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub seo_keywords: Vec<String>,
    pub specifications: BTreeMap<String, String>,
}

impl ProductInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_model(model_number: impl Into<String>) -> Self {
        Self {
            model_number: Some(model_number.into()),
            ..Self::default()
        }
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Trim strings and drop empty values.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            name: clean(&self.name),
            model_number: clean(&self.model_number),
            brand: clean(&self.brand),
            category: clean(&self.category),
            description: clean(&self.description),
            price: self.price.filter(|p| p.is_finite() && *p >= 0.0),
            seo_keywords: self
                .seo_keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            specifications: self
                .specifications
                .iter()
                .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
        }
    }

    /// Entry-boundary validation; the orchestrator assumes this passed.
    pub fn validate(&self) -> Result<(), SeoforgeError> {
        let input = self.normalized();
        if input.name.is_none() && input.model_number.is_none() {
            return Err(SeoforgeError::Validation(
                "either name or model_number is required".to_string(),
            ));
        }
        if input
            .name
            .as_deref()
            .is_some_and(|n| n.chars().count() > NAME_MAX_CHARS)
        {
            return Err(SeoforgeError::Validation(format!(
                "name exceeds {} characters",
                NAME_MAX_CHARS
            )));
        }
        if input
            .model_number
            .as_deref()
            .is_some_and(|m| m.chars().count() > MODEL_NUMBER_MAX_CHARS)
        {
            return Err(SeoforgeError::Validation(format!(
                "model_number exceeds {} characters",
                MODEL_NUMBER_MAX_CHARS
            )));
        }
        if self.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(SeoforgeError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use EnrichmentStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Completed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn illegal_transition_is_invariant_error() {
        let mut record = ProductRecord::from_input(&ProductInput::named("Drill"));
        let err = record.transition(EnrichmentStatus::Completed).unwrap_err();
        assert!(matches!(err, SeoforgeError::Invariant(_)));
        assert_eq!(record.enrichment_status, EnrichmentStatus::Pending);
    }

    #[test]
    fn from_input_trims_and_dedups() {
        let input = ProductInput {
            name: Some("  Generic Drill ".to_string()),
            model_number: Some("   ".to_string()),
            seo_keywords: vec!["drill".into(), "drill".into(), " ".into()],
            ..ProductInput::default()
        };
        let record = ProductRecord::from_input(&input);
        assert_eq!(record.name.as_deref(), Some("Generic Drill"));
        assert_eq!(record.model_number, None);
        assert_eq!(record.seo_keywords, vec!["drill".to_string()]);
        assert_eq!(record.enrichment_status, EnrichmentStatus::Pending);
    }

    #[test]
    fn validation_requires_name_or_model() {
        assert!(ProductInput::default().validate().is_err());
        assert!(ProductInput::named("  ").validate().is_err());
        assert!(ProductInput::named("Drill").validate().is_ok());
        assert!(ProductInput::with_model("GSP180").validate().is_ok());
    }

    #[test]
    fn validation_rejects_negative_price() {
        let mut input = ProductInput::named("Drill");
        input.price = Some(-1.0);
        assert!(matches!(input.validate(), Err(SeoforgeError::Validation(_))));
    }

    #[test]
    fn tracked_fields_split() {
        let mut record = ProductRecord::from_input(&ProductInput::named("Drill"));
        record.price = Some(10.0);
        let filled = record.filled_fields();
        assert_eq!(filled, vec![TrackedField::Name, TrackedField::Price]);
        assert_eq!(record.missing_fields().len(), TrackedField::ALL.len() - 2);
    }

    #[test]
    fn display_name_falls_back_to_model() {
        let record = ProductRecord::from_input(&ProductInput::with_model("GSP180"));
        assert_eq!(record.display_name(), "GSP180");
    }
}
