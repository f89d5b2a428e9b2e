//! Hashing-based feature vectors.
//!
//! [`FeatureVectorBuilder`] turns free text into a fixed-length embedding
//! without a trained model. Every word is hashed into three slots, the
//! primary slot also receives a position bonus favouring early words, and
//! consecutive word pairs and triples are hashed into one slot each so short
//! phrases ("veggie burger") land near each other.

use crate::hashing::{hash_text, slot};

/// Number of components in every embedding.
pub const EMBEDDING_DIM: usize = 384;

/// A dense embedding of [`EMBEDDING_DIM`] components.
///
/// Either the zero vector or L2-normalized.
pub type Embedding = Vec<f32>;

const SECONDARY_PROBE: u64 = 31;
const TERTIARY_PROBE: u64 = 37;
const BIGRAM_WEIGHT: f32 = 0.5;
const TRIGRAM_WEIGHT: f32 = 0.3;
/// Late words keep at least half of the position bonus.
const POSITION_DECAY: f32 = 0.5;

/// Builds deterministic embeddings from text by feature hashing.
///
/// # Example
///
/// ```rust,ignore
/// use menu_search::vector::FeatureVectorBuilder;
///
/// let builder = FeatureVectorBuilder::new();
/// let v = builder.build("Veggie Burger", 4.0);
/// assert_eq!(v.len(), 384);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self
    }

    /// Build a normalized embedding for `text`, scaling every feature by `weight`.
    ///
    /// Empty or whitespace-only text yields the zero vector.
    pub fn build(&self, text: &str, weight: f32) -> Embedding {
        let mut vector = zero_vector();
        self.accumulate(&mut vector, text, weight);
        normalize(&mut vector);
        vector
    }

    /// Add the raw (unnormalized) features of `text` into `vector`.
    ///
    /// Features are spread over `vector.len()` slots; an empty `vector` is
    /// left as is.
    pub fn accumulate(&self, vector: &mut [f32], text: &str, weight: f32) {
        let text = text.trim().to_lowercase();
        if text.is_empty() || vector.is_empty() {
            return;
        }
        let dims = vector.len();
        let words: Vec<&str> = text.split_whitespace().collect();
        let count = words.len() as f32;

        for (i, word) in words.iter().enumerate() {
            let h = hash_text(word);
            let primary = slot(h, 1, dims);
            vector[primary] += weight;
            vector[slot(h, SECONDARY_PROBE, dims)] += weight;
            vector[slot(h, TERTIARY_PROBE, dims)] += weight;

            let position_factor = 1.0 - (i as f32 / count) * POSITION_DECAY;
            vector[primary] += weight * position_factor;
        }

        for pair in words.windows(2) {
            let bigram = pair.join(" ");
            vector[slot(hash_text(&bigram), 1, dims)] += weight * BIGRAM_WEIGHT;
        }

        for triple in words.windows(3) {
            let trigram = triple.join(" ");
            vector[slot(hash_text(&trigram), 1, dims)] += weight * TRIGRAM_WEIGHT;
        }
    }
}

/// A fresh all-zero embedding.
pub fn zero_vector() -> Embedding {
    vec![0.0; EMBEDDING_DIM]
}

/// Euclidean length of `vector`.
pub fn magnitude(vector: &[f32]) -> f32 {
    vector.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt() as f32
}

/// Scale `vector` to unit length in place. The zero vector is left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value = (f64::from(*value) / norm) as f32;
    }
}

/// `target += scale * source`, component-wise.
pub fn add_scaled(target: &mut [f32], source: &[f32], scale: f32) {
    for (t, s) in target.iter_mut().zip(source.iter()) {
        *t += scale * s;
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
