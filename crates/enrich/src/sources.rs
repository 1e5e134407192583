//! External capabilities the pipeline consumes.
//!
//! Every capability returns `Result<Option<T>, SourceError>` (or a list):
//! `Ok(Some)` is a hit, `Ok(None)` a miss, `Err` an unavailable source.
//! The stages treat misses and errors alike; only the log line differs.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised by external sources. Always non-fatal to the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Source call timed out after {0}ms")]
    Timeout(u64),

    #[error("Source request failed: {0}")]
    RequestFailed(String),

    #[error("Source returned unusable data: {0}")]
    InvalidResponse(String),
}

impl From<SourceError> for seoforge_core::SeoforgeError {
    fn from(e: SourceError) -> Self {
        seoforge_core::SeoforgeError::SourceUnavailable(e.to_string())
    }
}

/// Run a source call under a hard deadline; an elapsed deadline becomes
/// [`SourceError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout.as_millis() as u64)),
    }
}

// ── Manufacturer ────────────────────────────────────────────────────

/// Structured manufacturer page data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub specifications: BTreeMap<String, String>,
    pub images: Vec<String>,
    pub source_url: Option<String>,
}

#[async_trait::async_trait]
pub trait ManufacturerSource: Send + Sync {
    /// Short identifier used when the data carries no source URL.
    fn source_name(&self) -> &str;

    async fn lookup(
        &self,
        model_number: &str,
        brand: Option<&str>,
    ) -> Result<Option<ManufacturerData>, SourceError>;
}

/// Never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopManufacturerSource;

#[async_trait::async_trait]
impl ManufacturerSource for NoopManufacturerSource {
    fn source_name(&self) -> &str {
        "none"
    }

    async fn lookup(
        &self,
        _model_number: &str,
        _brand: Option<&str>,
    ) -> Result<Option<ManufacturerData>, SourceError> {
        Ok(None)
    }
}

// ── Images ──────────────────────────────────────────────────────────

/// Where an image candidate came from. Drives its base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSourceTag {
    Manufacturer,
    Catalog,
    Stock,
    Ecommerce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    pub source: ImageSourceTag,
}

impl ImageCandidate {
    pub fn new(url: impl Into<String>, source: ImageSourceTag) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }
}

/// Query passed to [`ImageSource::discover`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageQuery<'a> {
    pub name: &'a str,
    pub brand: Option<&'a str>,
    pub model_number: Option<&'a str>,
    pub max_images: usize,
}

#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    async fn discover(&self, query: ImageQuery<'_>) -> Result<Vec<ImageCandidate>, SourceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopImageSource;

#[async_trait::async_trait]
impl ImageSource for NoopImageSource {
    async fn discover(&self, _query: ImageQuery<'_>) -> Result<Vec<ImageCandidate>, SourceError> {
        Ok(Vec::new())
    }
}

// ── Content ─────────────────────────────────────────────────────────

/// Inputs available to a content generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentContext {
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Highest-ranked keywords first.
    pub keywords: Vec<String>,
    /// A few key specifications, in key order.
    pub specifications: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub brief: String,
    pub description: String,
    pub seo_title: String,
    pub meta_description: String,
}

#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Model identifier recorded in `ai_metadata`.
    fn model_name(&self) -> &str;

    async fn generate(&self, context: &ContentContext) -> Result<GeneratedContent, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_maps_to_source_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, SourceError>(1)
        };
        let result = with_timeout(Duration::from_millis(10), slow).await;
        assert_eq!(result, Err(SourceError::Timeout(10)));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, SourceError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn noop_sources_miss() {
        assert_eq!(NoopManufacturerSource.lookup("X1", None).await, Ok(None));
        let query = ImageQuery {
            name: "X",
            brand: None,
            model_number: None,
            max_images: 3,
        };
        assert!(NoopImageSource.discover(query).await.unwrap().is_empty());
    }
}
