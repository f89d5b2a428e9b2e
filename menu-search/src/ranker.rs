//! Hybrid ranking: vector similarity merged with keyword score.

use std::collections::HashMap;

use tracing::debug;

use crate::config::SearchConfig;
use crate::lexical::LexicalScorer;
use crate::query::QueryEncoder;
use crate::results::SearchResult;
use crate::store::IndexStore;

/// Merges nearest-neighbour candidates and lexical matches into one ranking.
///
/// An item found by both signals receives the sum of its weighted
/// contributions; an item found by only one receives that contribution alone.
#[derive(Debug, Clone)]
pub struct HybridRanker {
    encoder: QueryEncoder,
    scorer: LexicalScorer,
    vector_top_k: usize,
    vector_weight: f32,
    lexical_weight: f32,
}

impl HybridRanker {
    /// Create a ranker from `config`.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            encoder: QueryEncoder::new(config),
            scorer: LexicalScorer::new(),
            vector_top_k: config.vector_top_k,
            vector_weight: config.vector_weight,
            lexical_weight: config.lexical_weight,
        }
    }

    /// Rank every candidate for `query` in `store`, best first.
    ///
    /// Ties keep encounter order (vector candidates first, then lexical-only
    /// matches in index order).
    pub fn rank(&self, query: &str, store: &dyn IndexStore) -> Vec<SearchResult> {
        let items = store.items();
        let query_vector = self.encoder.encode(query, items);
        let vector_hits = store.search(&query_vector, self.vector_top_k);
        let lexical_hits = self.scorer.matches(query, items);
        let (vector_count, lexical_count) = (vector_hits.len(), lexical_hits.len());

        let mut merged: Vec<SearchResult> = Vec::with_capacity(vector_count + lexical_count);
        let mut positions: HashMap<String, usize> = HashMap::new();

        for hit in vector_hits {
            let contribution = hit.similarity * self.vector_weight;
            match positions.get(&hit.id) {
                Some(&i) => merged[i].similarity += contribution,
                None => {
                    positions.insert(hit.id, merged.len());
                    merged.push(SearchResult { item: hit.metadata, similarity: contribution });
                }
            }
        }

        for hit in lexical_hits {
            let contribution = hit.score * self.lexical_weight;
            match positions.get(&hit.item.id) {
                Some(&i) => merged[i].similarity += contribution,
                None => {
                    positions.insert(hit.item.id.clone(), merged.len());
                    merged.push(SearchResult {
                        item: hit.item.metadata.clone(),
                        similarity: contribution,
                    });
                }
            }
        }

        merged.retain(|r| !r.item.name.is_empty() && !r.item.category.is_empty());
        merged.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            query,
            backend = store.name(),
            vector_count,
            lexical_count,
            result_count = merged.len(),
            "ranked query"
        );
        merged
    }
}
