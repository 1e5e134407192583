//! Image alt text composition.

use std::collections::HashSet;

const BRANDED_TEMPLATES: &[&str] = &[
    "{brand} {name}",
    "{brand} {name} product image",
    "{name} by {brand}",
    "{brand} {name} detail view",
    "{brand} {name} in use",
];

const UNBRANDED_TEMPLATES: &[&str] = &[
    "{name}",
    "{name} product image",
    "{name} detail view",
    "{name} close-up",
    "{name} in use",
];

fn render(template: &str, brand: Option<&str>, name: &str) -> String {
    template
        .replace("{brand}", brand.unwrap_or_default())
        .replace("{name}", name)
}

/// `candidate`, or `candidate N` for the smallest N >= 2 not yet taken.
pub fn unique_alt_text(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    (2..)
        .map(|n| format!("{} {}", candidate, n))
        .find(|c| !taken.contains(c))
        .unwrap_or_else(|| candidate.to_string())
}

/// `count` alt texts for new images, distinct from each other and from
/// `existing`. Templates cycle starting after the ones already used.
pub fn generate_alt_texts(
    brand: Option<&str>,
    name: &str,
    existing: &[String],
    count: usize,
) -> Vec<String> {
    // A name that already carries the brand reads badly with it prefixed.
    let name_lower = name.to_lowercase();
    let brand = brand
        .map(str::trim)
        .filter(|b| !b.is_empty() && !name_lower.contains(&b.to_lowercase()));
    let templates = if brand.is_some() {
        BRANDED_TEMPLATES
    } else {
        UNBRANDED_TEMPLATES
    };
    let mut taken: HashSet<String> = existing.iter().cloned().collect();
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let template = templates[(existing.len() + i) % templates.len()];
        let alt = unique_alt_text(&render(template, brand, name), &taken);
        taken.insert(alt.clone());
        out.push(alt);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_templates_with_suffix_on_wrap() {
        let alts = generate_alt_texts(Some("Bosch"), "GSP180", &[], 7);
        assert_eq!(alts[0], "Bosch GSP180");
        assert_eq!(alts[2], "GSP180 by Bosch");
        assert_eq!(alts[5], "Bosch GSP180 2");
        assert_eq!(alts[6], "Bosch GSP180 product image 2");
        let unique: HashSet<_> = alts.iter().collect();
        assert_eq!(unique.len(), alts.len());
    }

    #[test]
    fn avoids_existing_alts() {
        let existing = vec!["Drill".to_string()];
        let alts = generate_alt_texts(None, "Drill", &existing, 5);
        assert!(!alts.contains(&"Drill".to_string()));
        assert_eq!(alts[4], "Drill 2");
    }

    #[test]
    fn blank_brand_uses_unbranded_templates() {
        let alts = generate_alt_texts(Some("  "), "Drill", &[], 1);
        assert_eq!(alts, vec!["Drill".to_string()]);
    }

    #[test]
    fn brand_already_in_name_is_not_repeated() {
        let alts = generate_alt_texts(Some("Bosch"), "Bosch GSP180", &[], 2);
        assert_eq!(alts, vec!["Bosch GSP180".to_string(), "Bosch GSP180 product image".to_string()]);
    }

    #[test]
    fn suffix_skips_taken_numbers() {
        let taken: HashSet<String> = ["a", "a 2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_alt_text("a", &taken), "a 3");
        assert_eq!(unique_alt_text("b", &taken), "b");
    }
}
