//! Keyword-overlap scoring.
//!
//! Each query word is matched by substring containment against the item's
//! name, category, description and tags. A query consisting of a single word
//! is treated as a probable category or tag search and boosts those fields.

use crate::catalog::{IndexedItem, MenuItemMetadata};

const NAME_MATCH: f32 = 1.0;
const CATEGORY_EXACT: f32 = 2.0;
const CATEGORY_PARTIAL: f32 = 0.8;
const DESCRIPTION_MATCH: f32 = 0.6;
const TAG_EXACT: f32 = 1.0;
const TAG_PARTIAL: f32 = 0.5;

/// Multiplier for category and tag totals in category-search mode.
const CATEGORY_MODE_BOOST: f32 = 2.0;

const NAME_SHARE: f32 = 0.35;
const CATEGORY_SHARE: f32 = 0.25;
const DESCRIPTION_SHARE: f32 = 0.15;
const TAG_SHARE: f32 = 0.25;

/// Split a query into lowercase whitespace-separated words.
pub fn query_words(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// An item with a non-zero keyword score.
#[derive(Debug, Clone, Copy)]
pub struct LexicalMatch<'a> {
    pub item: &'a IndexedItem,
    pub score: f32,
}

/// Lowercased copies of the searchable fields of one item.
struct Fields {
    name: String,
    category: String,
    description: String,
    tags: Vec<String>,
}

impl Fields {
    fn of(item: &MenuItemMetadata) -> Self {
        Self {
            name: item.name.to_lowercase(),
            category: item.category.to_lowercase(),
            description: item.description.to_lowercase(),
            tags: item.tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

fn combine(name: f32, category: f32, description: f32, tags: f32) -> f32 {
    NAME_SHARE * name
        + CATEGORY_SHARE * category
        + DESCRIPTION_SHARE * description
        + TAG_SHARE * tags
}

/// Scores items by keyword overlap with a query. Scores are always `>= 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    /// Create a new scorer.
    pub fn new() -> Self {
        Self
    }

    /// Score one item against `query`.
    pub fn score(&self, query: &str, item: &MenuItemMetadata) -> f32 {
        self.score_words(&query_words(query), item)
    }

    /// Score one item against pre-split, lowercase query words.
    ///
    /// Category-search mode applies when there is exactly one word.
    pub fn score_words(&self, words: &[String], item: &MenuItemMetadata) -> f32 {
        if words.is_empty() {
            return 0.0;
        }
        let fields = Fields::of(item);
        let (mut name, mut category, mut description, mut tags) = (0.0, 0.0, 0.0, 0.0);

        for word in words {
            let word = word.as_str();
            if fields.name.contains(word) {
                name += NAME_MATCH;
            }
            if fields.category == word {
                category += CATEGORY_EXACT;
            } else if fields.category.contains(word) {
                category += CATEGORY_PARTIAL;
            }
            if fields.description.contains(word) {
                description += DESCRIPTION_MATCH;
            }
            if fields.tags.iter().any(|t| t == word) {
                tags += TAG_EXACT;
            } else if fields.tags.iter().any(|t| t.contains(word)) {
                tags += TAG_PARTIAL;
            }
        }

        if words.len() == 1 {
            category *= CATEGORY_MODE_BOOST;
            tags *= CATEGORY_MODE_BOOST;
        }

        combine(name, category, description, tags)
    }

    /// Score every item and keep the non-zero ones, in index order.
    pub fn matches<'a>(&self, query: &str, items: &'a [IndexedItem]) -> Vec<LexicalMatch<'a>> {
        let words = query_words(query);
        items
            .iter()
            .filter_map(|item| {
                let score = self.score_words(&words, &item.metadata);
                (score > 0.0).then_some(LexicalMatch { item, score })
            })
            .collect()
    }

    /// Coarse relevance used to pick feedback items for query expansion.
    ///
    /// Plain containment per field with no exact-match or single-word boosts.
    pub fn feedback_score(&self, words: &[String], item: &MenuItemMetadata) -> f32 {
        let fields = Fields::of(item);
        let (mut name, mut category, mut description, mut tags) = (0.0, 0.0, 0.0, 0.0);
        for word in words {
            let word = word.as_str();
            if fields.name.contains(word) {
                name += 1.0;
            }
            if fields.category.contains(word) {
                category += 0.8;
            }
            if fields.description.contains(word) {
                description += 0.6;
            }
            if fields.tags.iter().any(|t| t.contains(word)) {
                tags += 0.5;
            }
        }
        combine(name, category, description, tags)
    }
}
