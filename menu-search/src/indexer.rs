//! Composite item embeddings.

use tracing::{debug, info, warn};

use crate::catalog::{CatalogItem, IndexedItem};
use crate::config::FieldWeights;
use crate::error::{Result, SearchError};
use crate::vector::{FeatureVectorBuilder, add_scaled, normalize, zero_vector};

/// Number of items embedded between cooperative yields.
const YIELD_EVERY: usize = 64;

/// Builds one weighted composite embedding per catalog item.
///
/// The name, description, category (with sub-category) and tag fields are
/// each turned into a normalized feature vector, the field vectors are
/// summed, and the sum is normalized. A long description therefore counts
/// no more than a one-word name.
#[derive(Debug, Clone, Default)]
pub struct MenuIndexBuilder {
    encoder: FeatureVectorBuilder,
    weights: FieldWeights,
}

impl MenuIndexBuilder {
    /// Create a builder using the given field weights.
    pub fn new(weights: FieldWeights) -> Self {
        Self { encoder: FeatureVectorBuilder::new(), weights }
    }

    /// Embed a single item, or `None` if its id, name, or category is missing.
    pub fn embed_item(&self, item: &CatalogItem) -> Option<IndexedItem> {
        let metadata = item.to_metadata()?;

        let category = format!(
            "{} {}",
            metadata.category,
            item.sub_category.as_deref().unwrap_or_default()
        );
        let tags = metadata.tags.join(" ");

        let mut vector = zero_vector();
        for (text, weight) in [
            (metadata.name.as_str(), self.weights.name),
            (metadata.description.as_str(), self.weights.description),
            (category.as_str(), self.weights.category),
            (tags.as_str(), self.weights.tags),
        ] {
            add_scaled(&mut vector, &self.encoder.build(text, weight), 1.0);
        }
        normalize(&mut vector);

        Some(IndexedItem { id: metadata.id.clone(), vector, metadata })
    }

    /// Embed every valid item in `items`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyIndex`] if no item could be embedded.
    pub fn build(&self, items: &[CatalogItem]) -> Result<Vec<IndexedItem>> {
        let indexed: Vec<IndexedItem> =
            items.iter().enumerate().filter_map(|(i, item)| self.embed_logged(i, item)).collect();
        finish(items.len(), indexed)
    }

    /// Like [`build`](Self::build) but yields to the runtime periodically and
    /// reports `(processed, total)` after every batch.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyIndex`] if no item could be embedded.
    pub async fn build_async<F>(
        &self,
        items: &[CatalogItem],
        mut on_progress: F,
    ) -> Result<Vec<IndexedItem>>
    where
        F: FnMut(usize, usize),
    {
        let total = items.len();
        let mut indexed = Vec::with_capacity(total);
        for (batch, chunk) in items.chunks(YIELD_EVERY).enumerate() {
            let offset = batch * YIELD_EVERY;
            for (i, item) in chunk.iter().enumerate() {
                if let Some(entry) = self.embed_logged(offset + i, item) {
                    indexed.push(entry);
                }
            }
            on_progress(offset + chunk.len(), total);
            tokio::task::yield_now().await;
        }
        finish(total, indexed)
    }

    fn embed_logged(&self, position: usize, item: &CatalogItem) -> Option<IndexedItem> {
        let entry = self.embed_item(item);
        if entry.is_none() {
            warn!(
                position,
                id = ?item.id,
                name = ?item.name,
                "skipping catalog item without id, name, or category"
            );
        }
        entry
    }
}

fn finish(total: usize, indexed: Vec<IndexedItem>) -> Result<Vec<IndexedItem>> {
    if indexed.is_empty() {
        debug!(total, "no catalog item could be embedded");
        return Err(SearchError::EmptyIndex);
    }
    info!(total, indexed = indexed.len(), skipped = total - indexed.len(), "built menu embeddings");
    Ok(indexed)
}
