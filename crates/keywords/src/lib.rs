//! SEO keyword research: candidate generation and relevance ranking.
//!
//! This crate provides:
//! - Seven independent candidate generators over (name, brand, category)
//! - Additive relevance scoring against fixed term lists
//! - A stable ranker that deduplicates, orders and truncates candidates
//! - Synthetic volume / competition metadata for surviving keywords

pub mod generators;
pub mod ranker;
pub mod scoring;
pub mod types;

pub use generators::generate_candidates;
pub use ranker::{KeywordRanker, DEFAULT_MAX_KEYWORDS};
pub use types::{KeywordContext, Level, RankedKeyword};
