//! # menu-search
//!
//! Hybrid semantic search for restaurant menu catalogs that runs entirely
//! in-process: no embedding model, no search server.
//!
//! Menu items are embedded with deterministic feature hashing, indexed in an
//! HNSW graph, and queried by blending vector similarity with keyword
//! scoring. Results come back ranked and grouped by category. The built index
//! is persisted to a pluggable durable store so it can be restored without
//! rebuilding.
//!
//! ## Modules
//!
//! - [`engine`] - [`MenuSearch`], the entry point
//! - [`lifecycle`] - UNINITIALIZED → LOADING → READY | ERROR state machine
//! - [`hashing`] / [`vector`] - text hashing and feature vectors
//! - [`indexer`] - composite item embeddings
//! - [`store`] - nearest-neighbour index with a degraded fallback
//! - [`query`] / [`lexical`] / [`ranker`] - query expansion and hybrid ranking
//! - [`grouping`] - category buckets
//! - [`storage`] / [`persistence`] - durable store and index snapshots

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod hashing;
pub mod indexer;
pub mod lexical;
pub mod lifecycle;
pub mod persistence;
pub mod query;
pub mod ranker;
pub mod results;
pub mod storage;
pub mod store;
pub mod vector;

pub use catalog::{CatalogItem, IndexedItem, MenuCatalog, MenuItemMetadata};
pub use config::{FieldWeights, SearchConfig, SearchConfigBuilder};
pub use engine::{MenuSearch, MenuSearchBuilder};
pub use error::{Result, SearchError};
pub use grouping::{GroupedResults, group_by_category};
pub use hashing::hash_text;
pub use indexer::MenuIndexBuilder;
pub use lexical::LexicalScorer;
pub use lifecycle::{LifecycleSnapshot, ListenerId, SearchLifecycle, SearchState};
pub use persistence::IndexCache;
pub use query::QueryEncoder;
pub use ranker::HybridRanker;
pub use results::{SearchResponse, SearchResult};
pub use storage::{FileStorage, InMemoryStorage, StorageBackend, StorageError};
pub use store::{FallbackIndexStore, IndexStore, VectorMatch, build_index_store};
#[cfg(feature = "hnsw")]
pub use store::HnswIndexStore;
pub use vector::{EMBEDDING_DIM, Embedding, FeatureVectorBuilder};
