//! Nearest-neighbour index over item embeddings.
//!
//! [`IndexStore`] has two implementations:
//!
//! - [`HnswIndexStore`]: HNSW graph with cosine distance (feature `hnsw`)
//! - [`FallbackIndexStore`]: similarity-free; used when the graph cannot be built
//!
//! [`build_index_store`] picks one at construction time.

mod fallback;
#[cfg(feature = "hnsw")]
mod graph;

pub use fallback::FallbackIndexStore;
#[cfg(feature = "hnsw")]
pub use graph::HnswIndexStore;

use serde::Serialize;
use tracing::warn;

use crate::catalog::{IndexedItem, MenuItemMetadata};

/// One vector search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub similarity: f32,
    pub metadata: MenuItemMetadata,
}

/// A searchable, immutable set of [`IndexedItem`]s.
pub trait IndexStore: Send + Sync {
    /// Short backend name for logs and introspection.
    fn name(&self) -> &'static str;

    /// The indexed items, in build order.
    fn items(&self) -> &[IndexedItem];

    /// Return up to `top_k` items ordered by descending similarity to `query`.
    fn search(&self, query: &[f32], top_k: usize) -> Vec<VectorMatch>;

    /// `true` for implementations that do not rank by similarity.
    fn is_degraded(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Build the best available [`IndexStore`] for `items`.
///
/// Tries the HNSW index first. If it cannot be constructed, or the `hnsw`
/// feature is disabled, logs the degradation and returns a
/// [`FallbackIndexStore`]. Never fails.
pub fn build_index_store(items: Vec<IndexedItem>) -> Box<dyn IndexStore> {
    #[cfg(feature = "hnsw")]
    {
        match HnswIndexStore::check(&items) {
            Ok(()) => return Box::new(HnswIndexStore::build(items)),
            Err(e) => warn!(error = %e, "falling back to degraded index"),
        }
    }
    #[cfg(not(feature = "hnsw"))]
    warn!("vector index support not compiled in, falling back to degraded index");

    Box::new(FallbackIndexStore::new(items))
}

fn to_match(item: &IndexedItem, similarity: f32) -> VectorMatch {
    VectorMatch { id: item.id.clone(), similarity, metadata: item.metadata.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::config::FieldWeights;
    use crate::indexer::MenuIndexBuilder;

    #[test]
    fn factory_falls_back_on_empty_input() {
        let store = build_index_store(Vec::new());
        assert!(store.is_degraded());
        assert!(store.is_empty());
        assert!(store.search(&[0.0; 384], 5).is_empty());
    }

    #[cfg(feature = "hnsw")]
    #[test]
    fn factory_prefers_hnsw() {
        let items = MenuIndexBuilder::new(FieldWeights::default())
            .build(&[CatalogItem::new("1", "Pad Thai", "noodles")])
            .unwrap();
        let store = build_index_store(items);
        assert_eq!(store.name(), "hnsw");
        assert!(!store.is_degraded());
        assert_eq!(store.len(), 1);
    }

    #[cfg(feature = "hnsw")]
    #[test]
    fn factory_hands_every_item_to_fallback() {
        let mut items = MenuIndexBuilder::new(FieldWeights::default())
            .build(&[
                CatalogItem::new("1", "Pad Thai", "noodles"),
                CatalogItem::new("2", "Green Curry", "curries"),
            ])
            .unwrap();
        items[1].vector.truncate(8);

        let store = build_index_store(items);
        assert_eq!(store.name(), "fallback");
        let ids: Vec<&str> = store.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
