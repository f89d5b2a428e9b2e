// rust-cv/hnsw nearest-neighbour index over item embeddings

use hnsw::{Hnsw, Searcher};
use rand::rngs::StdRng;
use space::{Metric, Neighbor};
use tracing::{debug, instrument};

use super::{IndexStore, VectorMatch, to_match};
use crate::catalog::IndexedItem;
use crate::error::{Result, SearchError};
use crate::vector::EMBEDDING_DIM;

/// Minimum ef_search parameter for HNSW queries.
///
/// Queries use max(k * 2, MIN_EF_SEARCH) so small `k` still explores
/// enough of the graph for good recall.
const MIN_EF_SEARCH: usize = 50;

/// Cosine distance scaled to u32: 0 for identical direction, u32::MAX for
/// opposite direction or a zero vector.
struct CosineDistance;

impl Metric<Box<[f32]>> for CosineDistance {
    type Unit = u32;

    fn distance(&self, a: &Box<[f32]>, b: &Box<[f32]>) -> u32 {
        let a: &[f32] = a;
        let b: &[f32] = b;

        let dot: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
        let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

        if mag_a == 0.0 || mag_b == 0.0 {
            return u32::MAX;
        }

        let distance = (1.0 - dot / (mag_a * mag_b)).clamp(0.0, 2.0);
        (distance * (u32::MAX as f32 / 2.0)) as u32
    }
}

type Graph = Hnsw<CosineDistance, Box<[f32]>, StdRng, 16, 32>;

/// HNSW (Hierarchical Navigable Small World) index with cosine distance.
///
/// M = 16 links per node above layer 0 and M0 = 32 at layer 0. The graph is
/// built once from the full item set and never mutated afterwards, so
/// searches only need `&self` and a per-query [`Searcher`].
pub struct HnswIndexStore {
    index: Graph,
    /// Item at HNSW position `i` is `items[i]`.
    items: Vec<IndexedItem>,
}

impl HnswIndexStore {
    /// Build the graph over `items`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DegradedIndex`] if `items` is empty or any
    /// embedding does not have [`EMBEDDING_DIM`] components.
    pub fn new(items: Vec<IndexedItem>) -> Result<Self> {
        Self::check(&items)?;
        Ok(Self::build(items))
    }

    /// Validate `items` without building anything.
    pub(super) fn check(items: &[IndexedItem]) -> Result<()> {
        if items.is_empty() {
            return Err(SearchError::DegradedIndex("no items to index".to_string()));
        }
        if let Some(bad) = items.iter().find(|item| item.vector.len() != EMBEDDING_DIM) {
            return Err(SearchError::DegradedIndex(format!(
                "item '{}' has {} dimensions, expected {EMBEDDING_DIM}",
                bad.id,
                bad.vector.len()
            )));
        }
        Ok(())
    }

    /// Build the graph over items that passed [`check`](Self::check).
    #[instrument(skip_all, fields(items = items.len()))]
    pub(super) fn build(items: Vec<IndexedItem>) -> Self {
        let mut index: Graph = Hnsw::new(CosineDistance);
        let mut searcher = Searcher::default();
        for item in &items {
            index.insert(item.vector.clone().into_boxed_slice(), &mut searcher);
        }
        debug!(indexed = items.len(), "hnsw index built");

        Self { index, items }
    }
}

impl IndexStore for HnswIndexStore {
    fn name(&self) -> &'static str {
        "hnsw"
    }

    fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    fn search(&self, query: &[f32], top_k: usize) -> Vec<VectorMatch> {
        if query.len() != EMBEDDING_DIM || top_k == 0 {
            return Vec::new();
        }

        let k = top_k.min(self.items.len());
        let mut neighbors = vec![Neighbor { index: !0, distance: !0 }; k];
        let ef_search = (k * 2).max(MIN_EF_SEARCH);
        let query: Box<[f32]> = query.to_vec().into_boxed_slice();
        let mut searcher = Searcher::default();

        self.index.nearest(&query, ef_search, &mut searcher, &mut neighbors);

        neighbors
            .into_iter()
            .filter(|n| n.index != !0)
            .filter_map(|n| {
                let distance = n.distance as f32 / (u32::MAX as f32 / 2.0);
                let similarity = (1.0 - distance).clamp(0.0, 1.0);
                self.items.get(n.index).map(|item| to_match(item, similarity))
            })
            .collect()
    }
}
