use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::types::{KeywordContext, Level};

pub const COMMERCIAL_TERMS: &[&str] = &[
    "buy", "price", "sale", "cheap", "deal", "discount", "best", "affordable", "shop", "order",
];

pub const PROFESSIONAL_TERMS: &[&str] = &[
    "professional", "industrial", "commercial", "heavy duty", "contractor", "trade",
];

pub const GENERIC_TERMS: &[&str] = &["tool", "equipment", "item", "product"];

const EXACT_NAME_BONUS: i32 = 100;
const CONTAINS_NAME_BONUS: i32 = 80;
const CONTAINS_CATEGORY_BONUS: i32 = 60;
const COMMERCIAL_BONUS: i32 = 40;
const PROFESSIONAL_BONUS: i32 = 30;
const LONG_TAIL_BONUS: i32 = 20;
const GENERIC_PENALTY: i32 = 50;

// (min, max) synthetic monthly volume per word-count bucket.
const HEAD_VOLUME: (u32, u32) = (10_000, 50_000);
const BODY_VOLUME: (u32, u32) = (1_000, 10_000);
const TAIL_VOLUME: (u32, u32) = (100, 1_000);

pub fn word_count(keyword: &str) -> usize {
    keyword.split_whitespace().count()
}

pub fn has_commercial_intent(keyword_lower: &str) -> bool {
    COMMERCIAL_TERMS.iter().any(|t| keyword_lower.contains(t))
}

fn has_professional_term(keyword_lower: &str) -> bool {
    PROFESSIONAL_TERMS.iter().any(|t| keyword_lower.contains(t))
}

/// How closely a candidate matches the product name. Orders best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameMatch {
    Exact,
    CaseVariant,
    Other,
}

pub fn name_match(keyword: &str, ctx: &KeywordContext) -> NameMatch {
    let name = ctx.name.trim();
    let keyword = keyword.trim();
    if name.is_empty() {
        NameMatch::Other
    } else if keyword == name {
        NameMatch::Exact
    } else if keyword.to_lowercase() == ctx.name_lower() {
        NameMatch::CaseVariant
    } else {
        NameMatch::Other
    }
}

/// Relevance score for one candidate, floored at zero.
pub fn score_keyword(keyword: &str, ctx: &KeywordContext) -> u32 {
    let kw = keyword.trim().to_lowercase();
    let name = ctx.name_lower();
    let mut score = 0i32;

    if !name.is_empty() {
        if kw == name {
            score += EXACT_NAME_BONUS;
        } else if kw.contains(&name) {
            score += CONTAINS_NAME_BONUS;
        }
    }
    if let Some(category) = ctx.category_lower() {
        if kw.contains(&category) {
            score += CONTAINS_CATEGORY_BONUS;
        }
    }
    if has_commercial_intent(&kw) {
        score += COMMERCIAL_BONUS;
    }
    if has_professional_term(&kw) {
        score += PROFESSIONAL_BONUS;
    }
    if word_count(&kw) >= 3 {
        score += LONG_TAIL_BONUS;
    }
    if GENERIC_TERMS.contains(&kw.as_str()) {
        score -= GENERIC_PENALTY;
    }

    score.max(0) as u32
}

/// Deterministic volume inside the keyword's word-count bucket.
pub fn estimate_volume(keyword: &str) -> u32 {
    let (min, max) = match word_count(keyword) {
        0 | 1 => HEAD_VOLUME,
        2 => BODY_VOLUME,
        _ => TAIL_VOLUME,
    };
    let mut hasher = DefaultHasher::new();
    keyword.hash(&mut hasher);
    min + (hasher.finish() % u64::from(max - min)) as u32
}

pub fn competition(keyword: &str) -> Level {
    let kw = keyword.to_lowercase();
    if has_commercial_intent(&kw) {
        Level::High
    } else if word_count(&kw) <= 2 {
        Level::Medium
    } else {
        Level::Low
    }
}

pub fn commercial_value(keyword: &str) -> Level {
    if has_commercial_intent(&keyword.to_lowercase()) {
        Level::High
    } else {
        Level::Medium
    }
}
