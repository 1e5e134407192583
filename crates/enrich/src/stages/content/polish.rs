//! Post-processing applied to every generated text field.

use seoforge_core::{
    BRIEF_MAX_CHARS, DESCRIPTION_MAX_CHARS, META_DESCRIPTION_MAX_CHARS, SEO_TITLE_MAX_CHARS,
};

use crate::sources::GeneratedContent;

const ELLIPSIS: &str = "...";

const ACTION_WORDS: &[&str] = &["buy", "shop", "order", "get", "discover", "explore"];
const ACTION_SUFFIX: &str = " Shop now.";

const POWER_WORDS: &[&str] = &[
    "professional",
    "industrial",
    "premium",
    "heavy-duty",
    "reliable",
    "durable",
];
const POWER_PREFIX: &str = "Professional ";

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn contains_word(text_lower: &str, words: &[&str]) -> bool {
    text_lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|token| words.contains(&token))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cut to at most `max` characters, ending in `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if char_len(text) <= max {
        return text.to_string();
    }
    if max <= ELLIPSIS.len() {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - ELLIPSIS.len()).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// Lead with `keyword` when the text lacks it and the result still fits.
pub fn ensure_keyword(text: &str, keyword: Option<&str>, max: usize) -> String {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return text.to_string();
    };
    if text.to_lowercase().contains(&keyword.to_lowercase()) {
        return text.to_string();
    }
    let candidate = format!("{}: {}", capitalize(keyword), text);
    if char_len(&candidate) <= max {
        candidate
    } else {
        text.to_string()
    }
}

pub fn ensure_action_word(text: &str, max: usize) -> String {
    if contains_word(&text.to_lowercase(), ACTION_WORDS) {
        return text.to_string();
    }
    let candidate = format!("{}{}", text.trim_end(), ACTION_SUFFIX);
    if char_len(&candidate) <= max {
        candidate
    } else {
        text.to_string()
    }
}

pub fn ensure_power_word(text: &str, max: usize) -> String {
    if contains_word(&text.to_lowercase(), POWER_WORDS) {
        return text.to_string();
    }
    let candidate = format!("{}{}", POWER_PREFIX, text);
    if char_len(&candidate) <= max {
        candidate
    } else {
        text.to_string()
    }
}

/// Keyword presence, then the hard ceiling, then enhancements that fit.
pub fn finalize(content: GeneratedContent, keyword: Option<&str>) -> GeneratedContent {
    let brief = truncate_chars(&ensure_keyword(&content.brief, keyword, BRIEF_MAX_CHARS), BRIEF_MAX_CHARS);
    let description = ensure_keyword(&content.description, keyword, DESCRIPTION_MAX_CHARS);
    let seo_title = ensure_keyword(&content.seo_title, keyword, SEO_TITLE_MAX_CHARS);
    let meta = truncate_chars(
        &ensure_keyword(&content.meta_description, keyword, META_DESCRIPTION_MAX_CHARS),
        META_DESCRIPTION_MAX_CHARS,
    );
    GeneratedContent {
        brief: ensure_power_word(&brief, BRIEF_MAX_CHARS),
        description: truncate_chars(&description, DESCRIPTION_MAX_CHARS),
        seo_title: truncate_chars(&seo_title, SEO_TITLE_MAX_CHARS),
        meta_description: ensure_action_word(&meta, META_DESCRIPTION_MAX_CHARS),
    }
}
