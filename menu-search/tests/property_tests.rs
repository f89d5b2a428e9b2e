//! Property tests for feature hashing, composite embeddings and grouping.

use menu_search::vector::magnitude;
use menu_search::{
    CatalogItem, EMBEDDING_DIM, FeatureVectorBuilder, FieldWeights, MenuIndexBuilder,
    MenuItemMetadata, SearchResult, group_by_category, hash_text,
};
use proptest::prelude::*;

/// Free text made of one or more lowercase words.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,10}", 1..8).prop_map(|words| words.join(" "))
}

fn arb_result() -> impl Strategy<Value = SearchResult> {
    ("[0-9]{1,4}", prop_oneof![Just(String::new()), "[a-z]{3,8}"], 0.0f32..1.0f32).prop_map(
        |(id, category, similarity)| SearchResult {
            item: MenuItemMetadata {
                id: id.clone(),
                name: format!("dish {id}"),
                description: String::new(),
                price: 0.0,
                category,
                tags: Vec::new(),
                image: String::new(),
                available: true,
            },
            similarity,
        },
    )
}

/// **Property 1: Deterministic embeddings**
/// *For any* text and weight, building the embedding twice SHALL produce
/// identical vectors, and the hash of the text SHALL be stable.
mod prop_deterministic {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn same_text_same_vector(text in arb_text(), weight in 0.5f32..5.0f32) {
            let builder = FeatureVectorBuilder::new();
            prop_assert_eq!(builder.build(&text, weight), builder.build(&text, weight));
            prop_assert_eq!(hash_text(&text), hash_text(&text));
        }

        #[test]
        fn case_and_outer_whitespace_are_ignored(text in arb_text()) {
            let builder = FeatureVectorBuilder::new();
            let padded = format!("  {}  ", text.to_uppercase());
            prop_assert_eq!(builder.build(&text, 1.0), builder.build(&padded, 1.0));
        }
    }
}

/// **Property 2: Unit length**
/// *For any* non-blank text, the embedding SHALL have EMBEDDING_DIM components
/// and L2 norm within 1e-6 of 1.0; blank text SHALL yield the zero vector.
mod prop_unit_length {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn non_blank_text_is_normalized(text in arb_text(), weight in 0.5f32..5.0f32) {
            let vector = FeatureVectorBuilder::new().build(&text, weight);
            prop_assert_eq!(vector.len(), EMBEDDING_DIM);
            let norm: f64 =
                vector.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-6, "norm was {}", norm);
        }

        #[test]
        fn blank_text_is_zero(spaces in "[ \t\n]{0,6}") {
            let vector = FeatureVectorBuilder::new().build(&spaces, 4.0);
            prop_assert_eq!(vector.len(), EMBEDDING_DIM);
            prop_assert!(vector.iter().all(|x| *x == 0.0));
        }

        #[test]
        fn composite_item_vector_is_normalized(
            name in arb_text(),
            category in "[a-z]{3,10}",
            description in proptest::option::of(arb_text()),
            tags in proptest::collection::vec("[a-z]{3,8}", 0..4),
        ) {
            let mut item = CatalogItem::new("1", name, category).with_tags(tags);
            if let Some(description) = description {
                item = item.with_description(description);
            }
            let indexed = MenuIndexBuilder::new(FieldWeights::default()).embed_item(&item).unwrap();
            prop_assert!((magnitude(&indexed.vector) - 1.0).abs() < 1e-5);
        }
    }
}

/// **Property 3: Grouping partitions results**
/// *For any* ranked results, every result SHALL appear in exactly one group,
/// the group named by its category (or "Other"), and each group SHALL be
/// ordered by descending similarity.
mod prop_grouping {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn groups_partition_and_sort(results in proptest::collection::vec(arb_result(), 0..30)) {
            let grouped = group_by_category(&results);

            let total: usize = grouped.iter().map(|(_, bucket)| bucket.len()).sum();
            prop_assert_eq!(total, results.len());

            for (category, bucket) in grouped.iter() {
                prop_assert!(!bucket.is_empty());
                for result in bucket {
                    let expected = if result.item.category.is_empty() {
                        "Other"
                    } else {
                        result.item.category.as_str()
                    };
                    prop_assert_eq!(expected, category);
                }
                prop_assert!(bucket.windows(2).all(|w| w[0].similarity >= w[1].similarity));
            }
        }
    }
}
