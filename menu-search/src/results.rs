//! Search result types.

use serde::Serialize;

use crate::catalog::MenuItemMetadata;
use crate::grouping::GroupedResults;

/// A ranked menu item.
///
/// `similarity` is a blended, unitless score: only the ordering it induces
/// is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub item: MenuItemMetadata,
    pub similarity: f32,
}

/// The answer to one query: overall ranking plus the same results by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub grouped: GroupedResults,
}

impl SearchResponse {
    /// A response with no results.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
