use std::collections::HashSet;

use tracing::debug;

use crate::generators::generate_candidates;
use crate::scoring::{commercial_value, competition, estimate_volume, name_match, score_keyword, NameMatch};
use crate::types::{KeywordContext, RankedKeyword};

pub const DEFAULT_MAX_KEYWORDS: usize = 50;

/// Deduplicates, scores and orders keyword candidates.
#[derive(Debug, Clone)]
pub struct KeywordRanker {
    max_keywords: usize,
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYWORDS)
    }
}

impl KeywordRanker {
    pub fn new(max_keywords: usize) -> Self {
        Self { max_keywords }
    }

    /// Generate candidates from the context (seeds included) and rank them.
    pub fn rank(&self, ctx: &KeywordContext) -> Vec<RankedKeyword> {
        self.rank_candidates(generate_candidates(ctx), ctx)
    }

    /// Rank an explicit candidate pool.
    ///
    /// The product name as given is pinned first, then its case variants.
    /// The rest is ordered by score with ties kept in candidate order.
    pub fn rank_candidates(&self, candidates: Vec<String>, ctx: &KeywordContext) -> Vec<RankedKeyword> {
        let total = candidates.len();
        let mut seen = HashSet::with_capacity(total);
        let unique: Vec<String> = candidates
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();

        let mut scored: Vec<(NameMatch, u32, String)> = unique
            .into_iter()
            .map(|kw| (name_match(&kw, ctx), score_keyword(&kw, ctx), kw))
            .collect();

        // sort_by is stable, so generator order survives equal keys
        scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));
        scored.truncate(self.max_keywords);

        debug!(
            candidates = total,
            kept = scored.len(),
            name = %ctx.name,
            "Ranked keyword candidates"
        );

        scored
            .into_iter()
            .map(|(_, score, keyword)| RankedKeyword {
                estimated_volume: estimate_volume(&keyword),
                competition: competition(&keyword),
                commercial_value: commercial_value(&keyword),
                score,
                keyword,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_name_ranks_first() {
        let ctx = KeywordContext::new("Bosch GSP180")
            .with_brand("Bosch")
            .with_category("Drill");
        let ranked = KeywordRanker::default().rank(&ctx);
        assert_eq!(ranked[0].keyword, "Bosch GSP180");
    }

    #[test]
    fn output_bounded_and_unique() {
        let ctx = KeywordContext::new("Generic Drill")
            .with_brand("Makita")
            .with_category("Cordless Drill");
        let ranked = KeywordRanker::default().rank(&ctx);
        assert!(ranked.len() <= DEFAULT_MAX_KEYWORDS);
        let unique: HashSet<_> = ranked.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(unique.len(), ranked.len());
    }

    #[test]
    fn scores_are_non_increasing_after_pinned() {
        let ctx = KeywordContext::new("Widget");
        let ranked = KeywordRanker::new(100).rank_candidates(
            vec![
                "tool".into(),
                "widget".into(),
                "buy widget online".into(),
                "Widget".into(),
                "widget".into(),
            ],
            &ctx,
        );
        let words: Vec<_> = ranked.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(words, vec!["Widget", "widget", "buy widget online", "tool"]);
        assert_eq!(ranked[3].score, 0);
    }

    #[test]
    fn given_name_beats_case_variants() {
        let ctx = KeywordContext::new("Widget");
        let ranked = KeywordRanker::default().rank_candidates(
            vec!["widget".into(), "WIDGET".into(), "Widget".into()],
            &ctx,
        );
        let words: Vec<_> = ranked.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(words, vec!["Widget", "widget", "WIDGET"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        let ctx = KeywordContext::new("X");
        let ranked = KeywordRanker::default()
            .rank_candidates(vec!["Drill".into(), "drill".into(), "Drill".into()], &ctx);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let ctx = KeywordContext::new("Unrelated");
        let ranked = KeywordRanker::default()
            .rank_candidates(vec!["alpha".into(), "beta".into(), "gamma".into()], &ctx);
        let words: Vec<_> = ranked.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn truncates_to_limit() {
        let ctx = KeywordContext::new("Widget");
        let candidates = (0..80).map(|i| format!("kw {}", i)).collect();
        let ranked = KeywordRanker::new(10).rank_candidates(candidates, &ctx);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].keyword, "kw 0");
    }

    #[test]
    fn ranked_keyword_serializes_lowercase_levels() {
        let ctx = KeywordContext::new("Widget");
        let ranked = KeywordRanker::default().rank_candidates(vec!["buy widget".into()], &ctx);
        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["competition"], "high");
        assert_eq!(json["commercial_value"], "high");
    }
}
