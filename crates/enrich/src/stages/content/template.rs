use crate::sources::{ContentContext, ContentGenerator, GeneratedContent, SourceError};

pub const TEMPLATE_MODEL: &str = "template-composer";
pub const FALLBACK_MODEL: &str = "fallback-template";

/// "Brand Name", unless the name already starts with the brand.
fn label(ctx: &ContentContext) -> String {
    match ctx.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        Some(brand) if !ctx.name.to_lowercase().contains(&brand.to_lowercase()) => {
            format!("{} {}", brand, ctx.name)
        }
        _ => ctx.name.clone(),
    }
}

fn category_phrase(ctx: &ContentContext) -> String {
    ctx.category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "equipment".to_string())
}

fn spec_summary(ctx: &ContentContext) -> Option<String> {
    if ctx.specifications.is_empty() {
        return None;
    }
    Some(
        ctx.specifications
            .iter()
            .map(|(k, v)| format!("{} {}", k, v))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Composes copy from brand, name, category, keywords and specifications.
/// Performs no I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateContentGenerator;

impl TemplateContentGenerator {
    pub fn compose(ctx: &ContentContext) -> GeneratedContent {
        let label = label(ctx);
        let category = category_phrase(ctx);
        let specs = spec_summary(ctx);
        let secondary = ctx.keywords.get(1).cloned();

        let brief = format!("{} - reliable {} built for everyday jobs.", label, category);

        let mut description = format!("The {} is {} designed for demanding work.", label, with_article(&category));
        if let Some(specs) = &specs {
            description.push_str(&format!(" Key specifications: {}.", specs));
        }
        if let Some(keyword) = &secondary {
            description.push_str(&format!(" A strong choice for anyone searching for {}.", keyword));
        }

        let seo_title = match ctx.category.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(c) => format!("{} | {}", label, c.trim()),
            None => format!("{} | Buy Online", label),
        };

        let meta_description = match &specs {
            Some(specs) => format!("Buy the {}: {} with {}. Fast delivery and expert support.", label, category, specs),
            None => format!("Buy the {}, {} you can count on. Fast delivery and expert support.", label, with_article(&category)),
        };

        GeneratedContent {
            brief,
            description,
            seo_title,
            meta_description,
        }
    }
}

fn with_article(noun: &str) -> String {
    let article = match noun.chars().next() {
        Some(c) if "aeiou".contains(c) => "an",
        _ => "a",
    };
    format!("{} {}", article, noun)
}

#[async_trait::async_trait]
impl ContentGenerator for TemplateContentGenerator {
    fn model_name(&self) -> &str {
        TEMPLATE_MODEL
    }

    async fn generate(&self, context: &ContentContext) -> Result<GeneratedContent, SourceError> {
        Ok(Self::compose(context))
    }
}

/// Last-resort copy from brand, name and category only.
pub fn fallback_content(ctx: &ContentContext) -> GeneratedContent {
    let label = label(ctx);
    let category = category_phrase(ctx);
    GeneratedContent {
        brief: format!("{} {}.", label, category),
        description: format!("{} from our {} range.", label, category),
        seo_title: label.clone(),
        meta_description: format!("{} - {}.", label, category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ContentContext {
        ContentContext {
            name: "GSP180".into(),
            brand: Some("Bosch".into()),
            category: Some("Power Tools".into()),
            keywords: vec!["GSP180".into(), "bosch gsp180".into()],
            specifications: vec![("voltage".into(), "18V".into())],
        }
    }

    #[test]
    fn composes_from_context() {
        let content = TemplateContentGenerator::compose(&ctx());
        assert!(content.brief.starts_with("Bosch GSP180"));
        assert!(content.description.contains("voltage 18V"));
        assert!(content.description.contains("bosch gsp180"));
        assert_eq!(content.seo_title, "Bosch GSP180 | Power Tools");
        assert!(content.meta_description.starts_with("Buy the Bosch GSP180"));
    }

    #[test]
    fn brand_not_repeated_when_in_name() {
        let mut c = ctx();
        c.name = "Bosch GSP180".into();
        assert!(TemplateContentGenerator::compose(&c).brief.starts_with("Bosch GSP180 -"));
    }

    #[test]
    fn fallback_uses_only_identity_fields() {
        let content = fallback_content(&ContentContext {
            name: "Generic Drill".into(),
            ..ContentContext::default()
        });
        assert_eq!(content.brief, "Generic Drill equipment.");
        assert_eq!(content.seo_title, "Generic Drill");
        assert!(!content.description.is_empty());
    }
}
