//! Tunable ranking parameters.
//!
//! The defaults are fixed blend ratios chosen empirically for short menu
//! text; they are tunables, not invariants.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Default key under which the index snapshot is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "menu-search-index";

/// Per-field weights used when embedding items and queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldWeights {
    pub name: f32,
    pub description: f32,
    /// Applies to `category + " " + sub_category`.
    pub category: f32,
    /// Applies to the space-joined tag list.
    pub tags: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { name: 4.0, description: 2.0, category: 3.0, tags: 2.5 }
    }
}

impl FieldWeights {
    fn values(&self) -> [f32; 4] {
        [self.name, self.description, self.category, self.tags]
    }
}

/// Configuration parameters for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Number of nearest-neighbour candidates taken from the vector index.
    pub vector_top_k: usize,
    /// Multiplier applied to vector similarity when merging.
    pub vector_weight: f32,
    /// Multiplier applied to lexical score when merging.
    pub lexical_weight: f32,
    /// Share of the raw query vector in the expanded query.
    pub baseline_weight: f32,
    /// Share of the feedback context vector in the expanded query.
    pub context_weight: f32,
    /// Number of lexically matched items blended into the query vector.
    pub feedback_items: usize,
    /// Field weights for item and query embeddings.
    pub field_weights: FieldWeights,
    /// Key of the persisted index snapshot in the durable store.
    pub storage_key: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_top_k: 50,
            vector_weight: 0.6,
            lexical_weight: 0.4,
            baseline_weight: 0.4,
            context_weight: 0.6,
            feedback_items: 5,
            field_weights: FieldWeights::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl SearchConfig {
    /// Create a new builder for constructing a [`SearchConfig`].
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if:
    /// - any weight is negative or not finite
    /// - `vector_top_k == 0` or `feedback_items == 0`
    /// - `storage_key` is empty
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("vector_weight", self.vector_weight),
            ("lexical_weight", self.lexical_weight),
            ("baseline_weight", self.baseline_weight),
            ("context_weight", self.context_weight),
        ];
        for (name, value) in weights {
            check_weight(name, value)?;
        }
        for value in self.field_weights.values() {
            check_weight("field_weights", value)?;
        }
        if self.vector_top_k == 0 {
            return Err(SearchError::Config("vector_top_k must be greater than zero".to_string()));
        }
        if self.feedback_items == 0 {
            return Err(SearchError::Config(
                "feedback_items must be greater than zero".to_string(),
            ));
        }
        if self.storage_key.is_empty() {
            return Err(SearchError::Config("storage_key must not be empty".to_string()));
        }
        Ok(())
    }
}

fn check_weight(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SearchError::Config(format!(
            "{name} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the number of vector candidates considered per query.
    pub fn vector_top_k(mut self, k: usize) -> Self {
        self.config.vector_top_k = k;
        self
    }

    /// Set the vector and lexical merge weights.
    pub fn blend(mut self, vector_weight: f32, lexical_weight: f32) -> Self {
        self.config.vector_weight = vector_weight;
        self.config.lexical_weight = lexical_weight;
        self
    }

    /// Set the baseline and context weights of query expansion.
    pub fn expansion(mut self, baseline_weight: f32, context_weight: f32) -> Self {
        self.config.baseline_weight = baseline_weight;
        self.config.context_weight = context_weight;
        self
    }

    /// Set how many lexical matches feed query expansion.
    pub fn feedback_items(mut self, count: usize) -> Self {
        self.config.feedback_items = count;
        self
    }

    /// Set the per-field embedding weights.
    pub fn field_weights(mut self, weights: FieldWeights) -> Self {
        self.config.field_weights = weights;
        self
    }

    /// Set the durable store key for the index snapshot.
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// Build the [`SearchConfig`], validating every parameter.
    ///
    /// # Errors
    ///
    /// See [`SearchConfig::validate`].
    pub fn build(self) -> Result<SearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vector_top_k, 50);
        assert_eq!(config.feedback_items, 5);
        assert_eq!(config.field_weights, FieldWeights::default());
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(SearchConfig::builder().vector_top_k(0).build().is_err());
        assert!(SearchConfig::builder().feedback_items(0).build().is_err());
        assert!(SearchConfig::builder().blend(-0.1, 0.4).build().is_err());
        assert!(SearchConfig::builder().expansion(f32::NAN, 0.6).build().is_err());
        assert!(SearchConfig::builder().storage_key("").build().is_err());
        let weights = FieldWeights { tags: f32::INFINITY, ..FieldWeights::default() };
        assert!(SearchConfig::builder().field_weights(weights).build().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config =
            SearchConfig::builder().vector_top_k(20).storage_key("menu-v2").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
