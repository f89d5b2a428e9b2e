//! Category grouping of ranked results.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::results::SearchResult;

/// Bucket used for results whose item has no category.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Results partitioned by category.
///
/// Categories keep the order in which they first appear in the ranked input,
/// and each bucket is sorted by descending similarity. Serializes as a JSON
/// object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedResults {
    groups: Vec<(String, Vec<SearchResult>)>,
}

impl GroupedResults {
    /// Results for `category`, if any.
    pub fn get(&self, category: &str) -> Option<&[SearchResult]> {
        self.groups.iter().find(|(name, _)| name == category).map(|(_, results)| results.as_slice())
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// `(category, results)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SearchResult])> {
        self.groups.iter().map(|(name, results)| (name.as_str(), results.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for GroupedResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, results) in &self.groups {
            map.serialize_entry(category, results)?;
        }
        map.end()
    }
}

/// Partition ranked `results` by item category.
pub fn group_by_category(results: &[SearchResult]) -> GroupedResults {
    let mut groups: Vec<(String, Vec<SearchResult>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in results {
        let category = if result.item.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            result.item.category.as_str()
        };
        let slot = *positions.entry(category.to_string()).or_insert_with(|| {
            groups.push((category.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(result.clone());
    }

    for (_, bucket) in &mut groups {
        bucket.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    GroupedResults { groups }
}
