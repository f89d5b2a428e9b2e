//! Similarity-free index used when the vector index is unavailable.

use rand::Rng;
use tracing::warn;

use super::{IndexStore, VectorMatch, to_match};
use crate::catalog::IndexedItem;

/// Upper bound of the random score given to every item.
///
/// Kept well below any lexical contribution so keyword scoring decides the
/// final order and the random part only breaks ties.
const FALLBACK_JITTER: f32 = 0.01;

/// Returns every item with a small random similarity.
///
/// Lexical scoring downstream still produces usable rankings; this store only
/// guarantees that every item is a candidate. It never fails.
#[derive(Debug, Clone, Default)]
pub struct FallbackIndexStore {
    items: Vec<IndexedItem>,
}

impl FallbackIndexStore {
    /// Wrap `items` without building any search structure.
    pub fn new(items: Vec<IndexedItem>) -> Self {
        warn!(items = items.len(), "vector index running in degraded mode");
        Self { items }
    }
}

impl IndexStore for FallbackIndexStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    /// Ignores `query` and `top_k`: all items are returned.
    fn search(&self, _query: &[f32], _top_k: usize) -> Vec<VectorMatch> {
        let mut rng = rand::thread_rng();
        let mut matches: Vec<VectorMatch> = self
            .items
            .iter()
            .map(|item| to_match(item, rng.gen_range(0.0..FALLBACK_JITTER)))
            .collect();
        matches.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches
    }

    fn is_degraded(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::config::FieldWeights;
    use crate::indexer::MenuIndexBuilder;

    #[test]
    fn returns_all_items_with_bounded_scores() {
        let items = MenuIndexBuilder::new(FieldWeights::default())
            .build(&[
                CatalogItem::new("1", "Ramen", "noodles"),
                CatalogItem::new("2", "Udon", "noodles"),
                CatalogItem::new("3", "Mochi", "desserts"),
            ])
            .unwrap();
        let store = FallbackIndexStore::new(items);

        let matches = store.search(&[], 1);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| (0.0..FALLBACK_JITTER).contains(&m.similarity)));
        for window in matches.windows(2) {
            assert!(window[0].similarity >= window[1].similarity);
        }
    }
}
