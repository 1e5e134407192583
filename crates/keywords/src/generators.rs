//! Candidate keyword generators.
//!
//! Each generator is independent and only reads the [`KeywordContext`].
//! [`generate_candidates`] runs them in a fixed order; that order is the
//! tie-break priority used by the ranker.

use crate::types::KeywordContext;

// ── Fixed tables ────────────────────────────────────────────────────

const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    ("drill", &["power drill", "cordless drill", "drill driver", "electric drill"]),
    ("saw", &["power saw", "circular saw", "cutting saw"]),
    ("grinder", &["angle grinder", "disc grinder"]),
    ("sander", &["power sander", "orbital sander"]),
    ("hammer", &["rotary hammer", "hammer drill"]),
    ("wrench", &["impact wrench", "torque wrench"]),
    ("screwdriver", &["electric screwdriver", "impact driver"]),
    ("generator", &["power generator", "portable generator"]),
    ("compressor", &["air compressor", "portable compressor"]),
    ("ladder", &["step ladder", "extension ladder"]),
];

/// (industry, trigger words, industry terms)
const INDUSTRY_VERTICALS: &[(&str, &[&str], &[&str])] = &[
    (
        "construction",
        &["drill", "saw", "hammer", "concrete", "grinder", "jigsaw"],
        &["construction tools", "contractor equipment", "building site tools"],
    ),
    (
        "woodworking",
        &["sander", "router", "planer", "jigsaw", "wood"],
        &["woodworking tools", "carpentry equipment"],
    ),
    (
        "automotive",
        &["wrench", "jack", "compressor", "socket", "impact"],
        &["automotive tools", "garage equipment", "mechanic tools"],
    ),
    (
        "electrical",
        &["multimeter", "tester", "wire", "cable", "voltage"],
        &["electrical tools", "electrician equipment"],
    ),
    (
        "gardening",
        &["mower", "trimmer", "hedge", "leaf", "garden", "chainsaw"],
        &["garden tools", "landscaping equipment"],
    ),
    (
        "metalworking",
        &["welder", "metal", "cutter", "grinder"],
        &["metalworking tools", "fabrication equipment"],
    ),
];

const LONG_TAIL_TEMPLATES: &[&str] = &["best {product} for {use}", "{product} for {use}"];

const USE_CASES: &[&str] = &["home use", "professional use", "diy projects", "heavy duty work"];

const MODIFIER_PREFIXES: &[&str] = &[
    "best",
    "professional",
    "cheap",
    "affordable",
    "premium",
    "heavy duty",
    "cordless",
    "portable",
];

const MODIFIER_SUFFIXES: &[&str] = &["for sale", "price", "review", "deals", "online"];

const COMPETITORS: &[(&str, &[&str])] = &[
    ("bosch", &["makita", "dewalt", "milwaukee"]),
    ("makita", &["bosch", "dewalt", "ryobi"]),
    ("dewalt", &["milwaukee", "makita", "bosch"]),
    ("milwaukee", &["dewalt", "makita"]),
    ("ryobi", &["black+decker", "makita"]),
    ("hilti", &["bosch", "dewalt"]),
    ("stanley", &["dewalt", "craftsman"]),
];

const LOCATION_MODIFIERS: &[&str] = &["near me", "in stock", "uk", "usa", "local store"];

// ── Generators ──────────────────────────────────────────────────────

/// Product terms used by the template generators: the name first, then the
/// category when it adds something.
fn product_terms(ctx: &KeywordContext) -> Vec<String> {
    let mut terms = Vec::new();
    let name = ctx.name_lower();
    if !name.is_empty() {
        terms.push(name);
    }
    if let Some(category) = ctx.category_lower() {
        if !terms.contains(&category) {
            terms.push(category);
        }
    }
    terms
}

/// Name and brand combinations.
pub fn base_keywords(ctx: &KeywordContext) -> Vec<String> {
    let mut out = Vec::new();
    let name = ctx.name.trim();
    if name.is_empty() {
        return out;
    }
    let name_lower = ctx.name_lower();
    out.push(name.to_string());
    if name_lower != name {
        out.push(name_lower.clone());
    }
    if let Some(brand) = ctx.brand_lower() {
        if !name_lower.contains(&brand) {
            out.push(format!("{} {}", brand, name_lower));
        }
        if let Some(category) = ctx.category_lower() {
            out.push(format!("{} {}", brand, category));
        }
    }
    if let Some(category) = ctx.category_lower() {
        if !name_lower.contains(&category) {
            out.push(format!("{} {}", name_lower, category));
        }
    }
    out
}

/// Synonyms for the category (or the name, when there is no category).
pub fn category_synonyms(ctx: &KeywordContext) -> Vec<String> {
    let subject = ctx.category_lower().unwrap_or_else(|| ctx.name_lower());
    let brand = ctx.brand_lower();
    let mut out = Vec::new();
    for (key, synonyms) in CATEGORY_SYNONYMS {
        if !subject.contains(key) {
            continue;
        }
        for synonym in *synonyms {
            out.push(synonym.to_string());
            if let Some(brand) = &brand {
                out.push(format!("{} {}", brand, synonym));
            }
        }
    }
    out
}

/// Industry terms for every vertical whose trigger words appear in the
/// name or category.
pub fn industry_terms(ctx: &KeywordContext) -> Vec<String> {
    let haystack = format!(
        "{} {}",
        ctx.name_lower(),
        ctx.category_lower().unwrap_or_default()
    );
    INDUSTRY_VERTICALS
        .iter()
        .filter(|(_, triggers, _)| triggers.iter().any(|t| haystack.contains(t)))
        .flat_map(|(_, _, terms)| terms.iter().map(|t| t.to_string()))
        .collect()
}

/// Product × use-case expansion over the long-tail templates.
pub fn long_tail_keywords(ctx: &KeywordContext) -> Vec<String> {
    let mut out = Vec::new();
    for product in product_terms(ctx) {
        for template in LONG_TAIL_TEMPLATES {
            for use_case in USE_CASES {
                out.push(
                    template
                        .replace("{product}", &product)
                        .replace("{use}", use_case),
                );
            }
        }
    }
    out
}

/// Adjective prefixes and commercial suffixes around each product term.
pub fn modifier_keywords(ctx: &KeywordContext) -> Vec<String> {
    let mut out = Vec::new();
    for product in product_terms(ctx) {
        for prefix in MODIFIER_PREFIXES {
            out.push(format!("{} {}", prefix, product));
        }
        for suffix in MODIFIER_SUFFIXES {
            out.push(format!("{} {}", product, suffix));
        }
    }
    out
}

/// "{brand} vs {competitor}" style phrases.
pub fn competitor_keywords(ctx: &KeywordContext) -> Vec<String> {
    let Some(brand) = ctx.brand_lower() else {
        return Vec::new();
    };
    let Some((_, competitors)) = COMPETITORS.iter().find(|(b, _)| *b == brand) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for competitor in *competitors {
        out.push(format!("{} vs {}", brand, competitor));
        if let Some(category) = ctx.category_lower() {
            out.push(format!("{} {} alternative", competitor, category));
        }
    }
    out
}

/// Location-modified variants of each product term.
pub fn locality_keywords(ctx: &KeywordContext) -> Vec<String> {
    let mut out = Vec::new();
    for product in product_terms(ctx) {
        for location in LOCATION_MODIFIERS {
            out.push(format!("{} {}", product, location));
        }
    }
    out
}

/// Run every generator in priority order, then append the caller's seeds.
/// The result may contain duplicates.
pub fn generate_candidates(ctx: &KeywordContext) -> Vec<String> {
    let generators: [fn(&KeywordContext) -> Vec<String>; 7] = [
        base_keywords,
        category_synonyms,
        industry_terms,
        long_tail_keywords,
        modifier_keywords,
        competitor_keywords,
        locality_keywords,
    ];
    let mut candidates: Vec<String> = generators.iter().flat_map(|g| g(ctx)).collect();
    candidates.extend(ctx.seeds.iter().cloned());
    candidates
}
