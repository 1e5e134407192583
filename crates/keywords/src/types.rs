use serde::{Deserialize, Serialize};

/// Product context the generators and scorer work from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordContext {
    /// Product name (or model number when no name is known).
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Caller-supplied keywords, added to the pool unchanged.
    pub seeds: Vec<String>,
}

impl KeywordContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<String>) -> Self {
        self.seeds = seeds;
        self
    }

    pub(crate) fn name_lower(&self) -> String {
        self.name.trim().to_lowercase()
    }

    pub(crate) fn brand_lower(&self) -> Option<String> {
        self.brand
            .as_deref()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty())
    }

    pub(crate) fn category_lower(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }
}

/// Three-level rating used for competition and commercial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::Medium => write!(f, "medium"),
            Level::High => write!(f, "high"),
        }
    }
}

/// A scored keyword with synthetic search metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedKeyword {
    pub keyword: String,
    pub score: u32,
    pub estimated_volume: u32,
    pub competition: Level,
    pub commercial_value: Level,
}
