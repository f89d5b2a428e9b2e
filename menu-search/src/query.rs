//! Query embeddings with pseudo-relevance feedback.
//!
//! Hashed vectors have no notion of synonyms. To approximate one, the query
//! vector is blended with the stored vectors of the catalog items that match
//! the query lexically, so a query like "healthy" drifts toward whatever
//! vocabulary those items share.

use tracing::trace;

use crate::catalog::IndexedItem;
use crate::config::{FieldWeights, SearchConfig};
use crate::lexical::{LexicalScorer, query_words};
use crate::vector::{Embedding, FeatureVectorBuilder, add_scaled, normalize, zero_vector};

/// Encodes free-text queries into embeddings comparable with item vectors.
#[derive(Debug, Clone)]
pub struct QueryEncoder {
    encoder: FeatureVectorBuilder,
    scorer: LexicalScorer,
    weights: FieldWeights,
    baseline_weight: f32,
    context_weight: f32,
    feedback_items: usize,
}

impl QueryEncoder {
    /// Create an encoder from the field weights and expansion settings in `config`.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            encoder: FeatureVectorBuilder::new(),
            scorer: LexicalScorer::new(),
            weights: config.field_weights,
            baseline_weight: config.baseline_weight,
            context_weight: config.context_weight,
            feedback_items: config.feedback_items,
        }
    }

    /// The query embedded as if it were every field of an item.
    pub fn baseline(&self, query: &str) -> Embedding {
        let mut vector = zero_vector();
        for weight in [
            self.weights.name,
            self.weights.category,
            self.weights.description,
            self.weights.tags,
        ] {
            add_scaled(&mut vector, &self.encoder.build(query, weight), 1.0);
        }
        normalize(&mut vector);
        vector
    }

    /// Encode `query`, expanding it with the best lexical matches in `items`.
    ///
    /// Falls back to the [`baseline`](Self::baseline) vector when nothing
    /// in `items` matches.
    pub fn encode(&self, query: &str, items: &[IndexedItem]) -> Embedding {
        let baseline = self.baseline(query);
        let feedback = self.feedback(query, items);
        if feedback.is_empty() {
            return baseline;
        }

        let total: f32 = feedback.iter().map(|(_, score)| score).sum();
        let mut context = zero_vector();
        for (item, score) in &feedback {
            add_scaled(&mut context, &item.vector, score / total);
        }

        let mut blended = zero_vector();
        add_scaled(&mut blended, &baseline, self.baseline_weight);
        add_scaled(&mut blended, &context, self.context_weight);
        normalize(&mut blended);

        trace!(feedback = feedback.len(), "expanded query vector");
        blended
    }

    /// Top items by coarse lexical score, best first, positive scores only.
    fn feedback<'a>(&self, query: &str, items: &'a [IndexedItem]) -> Vec<(&'a IndexedItem, f32)> {
        let words = query_words(query);
        if words.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(&IndexedItem, f32)> = items
            .iter()
            .map(|item| (item, self.scorer.feedback_score(&words, &item.metadata)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.feedback_items);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::indexer::MenuIndexBuilder;
    use crate::vector::{cosine_similarity, magnitude};

    fn items() -> Vec<IndexedItem> {
        MenuIndexBuilder::new(FieldWeights::default())
            .build(&[
                CatalogItem::new("1", "Quinoa Bowl", "bowls").with_tags(["healthy", "vegan"]),
                CatalogItem::new("2", "Kale Salad", "salads").with_tags(["healthy", "greens"]),
                CatalogItem::new("3", "Double Cheeseburger", "burgers").with_tags(["beef"]),
            ])
            .unwrap()
    }

    #[test]
    fn unmatched_query_returns_baseline() {
        let encoder = QueryEncoder::new(&SearchConfig::default());
        let items = items();
        assert_eq!(encoder.encode("sushi", &items), encoder.baseline("sushi"));
    }

    #[test]
    fn baseline_equals_plain_feature_vector() {
        let encoder = QueryEncoder::new(&SearchConfig::default());
        let plain = FeatureVectorBuilder::new().build("green curry", 1.0);
        for (a, b) in encoder.baseline("green curry").iter().zip(plain.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn feedback_pulls_query_toward_matching_items() {
        let encoder = QueryEncoder::new(&SearchConfig::default());
        let items = items();
        let expanded = encoder.encode("healthy", &items);
        let baseline = encoder.baseline("healthy");

        assert!((magnitude(&expanded) - 1.0).abs() < 1e-5);
        let bowl = &items[0].vector;
        assert!(cosine_similarity(&expanded, bowl) > cosine_similarity(&baseline, bowl));
        assert!(
            cosine_similarity(&expanded, bowl) > cosine_similarity(&expanded, &items[2].vector)
        );
    }

    #[test]
    fn feedback_is_limited_to_configured_count() {
        let config = SearchConfig::builder().feedback_items(1).build().unwrap();
        let encoder = QueryEncoder::new(&config);
        let items = items();
        let picked = encoder.feedback("healthy", &items);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0.id, "1");
    }

    #[test]
    fn blank_query_is_zero_vector() {
        let encoder = QueryEncoder::new(&SearchConfig::default());
        assert_eq!(encoder.encode("  ", &items()), zero_vector());
    }
}
