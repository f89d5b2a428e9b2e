//! Catalog input and indexed item types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SearchError};
use crate::vector::Embedding;

/// A raw menu item as delivered by the catalog feed.
///
/// Every field is optional; items lacking an `id`, `name`, or `category`
/// are skipped during indexing rather than failing the build. A field with
/// the wrong JSON type is read as absent, so a malformed `price` or `tags`
/// only loses that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogItem {
    /// Catalog identifier. Numeric ids are accepted and stringified.
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(alias = "sub_category", deserialize_with = "lenient")]
    pub sub_category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub available: Option<bool>,
}

impl CatalogItem {
    /// Create an item with the three required fields set.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sub-category.
    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Convert into indexable metadata, or `None` if a required field is
    /// absent or empty.
    pub fn to_metadata(&self) -> Option<MenuItemMetadata> {
        let id = non_empty(self.id.as_deref())?;
        let name = non_empty(self.name.as_deref())?;
        let category = non_empty(self.category.as_deref())?;
        Some(MenuItemMetadata {
            id: id.to_string(),
            name: name.to_string(),
            description: self.description.clone().unwrap_or_default(),
            price: self.price.unwrap_or(0.0),
            category: category.to_string(),
            tags: self.tags.clone().unwrap_or_default(),
            image: self.image.clone().unwrap_or_default(),
            available: self.available.unwrap_or(true),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Read an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!(error = %e, "ignoring malformed catalog field");
                Ok(None)
            }
        },
    }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => {
            warn!(id = %other, "ignoring catalog item id of unsupported type");
            Ok(None)
        }
    }
}

/// A menu catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuCatalog {
    pub items: Vec<CatalogItem>,
}

impl MenuCatalog {
    /// Create a catalog from a list of items.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Parse a catalog from untyped JSON of the form `{ "items": [...] }`.
    ///
    /// Elements that cannot be read as an item are dropped with a warning;
    /// they are treated like items missing their required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidCatalog`] if `items` is missing or is
    /// not an array.
    pub fn from_value(menu_data: &Value) -> Result<Self> {
        let items = menu_data
            .get("items")
            .ok_or_else(|| SearchError::InvalidCatalog("missing 'items' field".to_string()))?
            .as_array()
            .ok_or_else(|| SearchError::InvalidCatalog("'items' is not an array".to_string()))?;

        let mut parsed = Vec::with_capacity(items.len());
        for (position, raw) in items.iter().enumerate() {
            match CatalogItem::deserialize(raw) {
                Ok(item) => parsed.push(item),
                Err(e) => warn!(position, error = %e, "skipping unreadable catalog entry"),
            }
        }
        Ok(Self { items: parsed })
    }
}

/// Item metadata carried alongside each embedding and returned with results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub image: String,
    pub available: bool,
}

/// A catalog item with its composite embedding.
///
/// Immutable once built; the index is only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    pub id: String,
    pub vector: Embedding,
    pub metadata: MenuItemMetadata,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_camel_case_and_numeric_ids() {
        let catalog = MenuCatalog::from_value(&json!({
            "items": [
                { "id": 7, "name": "Tiramisu", "category": "desserts", "subCategory": "italian" },
                { "id": "8", "name": "Gelato", "category": "desserts", "sub_category": "frozen" }
            ]
        }))
        .unwrap();

        assert_eq!(catalog.items.len(), 2);
        assert_eq!(catalog.items[0].id.as_deref(), Some("7"));
        assert_eq!(catalog.items[0].sub_category.as_deref(), Some("italian"));
        assert_eq!(catalog.items[1].sub_category.as_deref(), Some("frozen"));
    }

    #[test]
    fn rejects_missing_or_non_array_items() {
        assert!(matches!(
            MenuCatalog::from_value(&json!({})),
            Err(SearchError::InvalidCatalog(_))
        ));
        assert!(matches!(
            MenuCatalog::from_value(&json!({ "items": "pizza" })),
            Err(SearchError::InvalidCatalog(_))
        ));
        assert!(matches!(
            MenuCatalog::from_value(&json!(null)),
            Err(SearchError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn drops_unreadable_entries() {
        let catalog = MenuCatalog::from_value(&json!({
            "items": [
                { "id": "1", "name": "Soup", "category": "starters" },
                "not an item",
                { "id": true, "name": "Odd", "category": "x" }
            ]
        }))
        .unwrap();
        assert_eq!(catalog.items.len(), 2);
        assert!(catalog.items[1].id.is_none());
        assert!(catalog.items[1].to_metadata().is_none());
    }

    #[test]
    fn mistyped_optional_fields_fall_back_to_defaults() {
        let catalog = MenuCatalog::from_value(&json!({
            "items": [
                { "id": "1", "name": "Margherita Pizza", "category": "pizza", "price": "9.99" },
                { "id": "2", "name": "Caesar Salad", "category": "salads", "tags": "fresh" },
                { "id": "3", "name": "Lemonade", "category": "drinks", "available": "yes",
                  "image": 42, "description": ["cold"] }
            ]
        }))
        .unwrap();
        assert_eq!(catalog.items.len(), 3);

        let metadata: Vec<MenuItemMetadata> =
            catalog.items.iter().map(|item| item.to_metadata().unwrap()).collect();
        assert_eq!(metadata[0].price, 0.0);
        assert!(metadata[1].tags.is_empty());
        assert!(metadata[2].available);
        assert_eq!(metadata[2].image, "");
        assert_eq!(metadata[2].description, "");
    }

    #[test]
    fn mistyped_required_field_reads_as_absent() {
        let catalog = MenuCatalog::from_value(&json!({
            "items": [{ "id": "1", "name": 12, "category": "pizza" }]
        }))
        .unwrap();
        assert!(catalog.items[0].name.is_none());
        assert!(catalog.items[0].to_metadata().is_none());
    }

    #[test]
    fn metadata_requires_id_name_and_category() {
        assert!(CatalogItem::new("1", "Soup", "starters").to_metadata().is_some());
        assert!(CatalogItem::new("", "Soup", "starters").to_metadata().is_none());
        assert!(CatalogItem::new("1", "Soup", "").to_metadata().is_none());
        let no_name = CatalogItem { name: None, ..CatalogItem::new("1", "x", "starters") };
        assert!(no_name.to_metadata().is_none());
    }

    #[test]
    fn metadata_fills_defaults() {
        let meta = CatalogItem::new("1", "Soup", "starters").to_metadata().unwrap();
        assert_eq!(meta.description, "");
        assert_eq!(meta.price, 0.0);
        assert!(meta.tags.is_empty());
        assert!(meta.available);
    }
}
