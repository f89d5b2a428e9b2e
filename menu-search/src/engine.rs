//! The menu search engine.
//!
//! [`MenuSearch`] coordinates index construction (validate → embed → index →
//! persist) and query execution (encode → vector + lexical → merge → group),
//! and drives the [`SearchLifecycle`] observers see.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use menu_search::{InMemoryStorage, MenuSearch};
//!
//! let search = MenuSearch::builder()
//!     .storage(Arc::new(InMemoryStorage::new()))
//!     .build()?;
//!
//! search.add_state_listener(|s| println!("{} {}%", s.state, s.progress));
//! search.initialize_index(&menu_json).await?;
//! let response = search.search("vegetarian").await?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::catalog::{CatalogItem, MenuCatalog};
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::grouping::group_by_category;
use crate::indexer::MenuIndexBuilder;
use crate::lifecycle::{LifecycleSnapshot, ListenerId, SearchLifecycle, SearchState};
use crate::persistence::IndexCache;
use crate::ranker::HybridRanker;
use crate::results::SearchResponse;
use crate::storage::StorageBackend;
use crate::store::{IndexStore, build_index_store};

const PROGRESS_VALIDATED: u8 = 10;
const PROGRESS_EMBEDDED: u8 = 70;
const PROGRESS_INDEXED: u8 = 85;
const PROGRESS_PERSISTED: u8 = 95;

/// Hybrid semantic search over one menu catalog snapshot.
///
/// Build with [`MenuSearch::builder()`]. Searching is only possible once
/// [`initialize`](Self::initialize) (or [`restore`](Self::restore)) has
/// brought the lifecycle to [`SearchState::Ready`]. Searches only read the
/// index and may run concurrently; initializations are serialized.
pub struct MenuSearch {
    config: SearchConfig,
    indexer: MenuIndexBuilder,
    ranker: HybridRanker,
    cache: IndexCache,
    lifecycle: SearchLifecycle,
    index: RwLock<Option<Arc<dyn IndexStore>>>,
    init_lock: Mutex<()>,
}

impl MenuSearch {
    /// Create a new [`MenuSearchBuilder`].
    pub fn builder() -> MenuSearchBuilder {
        MenuSearchBuilder::default()
    }

    /// Create an engine with the default configuration.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::from_parts(SearchConfig::default(), storage)
    }

    fn from_parts(config: SearchConfig, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            indexer: MenuIndexBuilder::new(config.field_weights),
            ranker: HybridRanker::new(&config),
            cache: IndexCache::new(storage, config.storage_key.clone()),
            lifecycle: SearchLifecycle::new(),
            index: RwLock::new(None),
            init_lock: Mutex::new(()),
            config,
        }
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The current lifecycle snapshot.
    pub fn state(&self) -> LifecycleSnapshot {
        self.lifecycle.current()
    }

    /// Number of indexed items, or 0 before the first build.
    pub async fn indexed_count(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, |store| store.len())
    }

    /// Name of the active index backend (`"hnsw"` or `"fallback"`), if built.
    pub async fn backend(&self) -> Option<&'static str> {
        self.index.read().await.as_ref().map(|store| store.name())
    }

    /// Subscribe to lifecycle changes. `listener` is called right away with
    /// the current state.
    pub fn add_state_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&LifecycleSnapshot) + Send + Sync + 'static,
    {
        self.lifecycle.subscribe(listener)
    }

    /// Unsubscribe a listener. Returns `false` if it was not registered.
    pub fn remove_state_listener(&self, id: ListenerId) -> bool {
        self.lifecycle.unsubscribe(id)
    }

    /// Build the index from untyped menu data of the form `{ "items": [...] }`.
    ///
    /// Returns the number of indexed items.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidCatalog`] if `items` is missing or not an
    /// array, or [`SearchError::EmptyIndex`] if no item is valid. The
    /// lifecycle ends in [`SearchState::Error`] in both cases.
    pub async fn initialize_index(&self, menu_data: &Value) -> Result<usize> {
        let _guard = self.init_lock.lock().await;
        self.begin_build().await;
        let outcome = match MenuCatalog::from_value(menu_data) {
            Ok(catalog) => self.build(&catalog.items).await,
            Err(e) => Err(e),
        };
        self.finish_build(outcome)
    }

    /// Build the index from a typed catalog.
    ///
    /// Returns the number of indexed items.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyIndex`] if no item is valid; the lifecycle
    /// ends in [`SearchState::Error`].
    pub async fn initialize(&self, catalog: MenuCatalog) -> Result<usize> {
        let _guard = self.init_lock.lock().await;
        self.begin_build().await;
        let outcome = self.build(&catalog.items).await;
        self.finish_build(outcome)
    }

    async fn begin_build(&self) {
        self.lifecycle.begin_loading();
        self.index.write().await.take();
    }

    async fn build(&self, items: &[CatalogItem]) -> Result<usize> {
        self.lifecycle.report_progress(PROGRESS_VALIDATED);

        let span = u64::from(PROGRESS_EMBEDDED - PROGRESS_VALIDATED);
        let indexed = self
            .indexer
            .build_async(items, |done, total| {
                let share = (done as u64 * span) / total.max(1) as u64;
                self.lifecycle.report_progress(PROGRESS_VALIDATED + share as u8);
            })
            .await?;

        let store: Arc<dyn IndexStore> = Arc::from(build_index_store(indexed));
        let count = store.len();
        let backend = store.name();
        *self.index.write().await = Some(store.clone());
        self.lifecycle.report_progress(PROGRESS_INDEXED);

        if let Err(e) = self.cache.persist(store.items()).await {
            warn!(error = %e, "search index kept in memory only");
        }
        self.lifecycle.report_progress(PROGRESS_PERSISTED);

        info!(count, backend, "menu search index ready");
        Ok(count)
    }

    fn finish_build(&self, outcome: Result<usize>) -> Result<usize> {
        match outcome {
            Ok(count) => {
                self.lifecycle.mark_ready();
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "failed to build menu search index");
                self.lifecycle.mark_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Load the last persisted index instead of rebuilding it.
    ///
    /// Returns `true` and moves to [`SearchState::Ready`] when a usable
    /// snapshot was found. A missing, unreadable, or incompatible snapshot is
    /// logged and leaves the engine untouched.
    pub async fn restore(&self) -> bool {
        let _guard = self.init_lock.lock().await;
        let items = match self.cache.restore().await {
            Ok(Some(items)) if !items.is_empty() => items,
            Ok(_) => return false,
            Err(e) => {
                warn!(error = %e, "ignoring persisted search index");
                return false;
            }
        };

        self.begin_build().await;
        let store: Arc<dyn IndexStore> = Arc::from(build_index_store(items));
        info!(count = store.len(), backend = store.name(), "menu search index restored");
        *self.index.write().await = Some(store);
        self.lifecycle.mark_ready();
        true
    }

    /// Search the menu.
    ///
    /// `None` or blank queries return an empty response in any state.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotReady`] unless the lifecycle is
    /// [`SearchState::Ready`].
    pub async fn search<'q>(&self, query: impl Into<Option<&'q str>>) -> Result<SearchResponse> {
        let Some(query) = query.into().map(str::trim).filter(|q| !q.is_empty()) else {
            return Ok(SearchResponse::empty());
        };

        let state = self.lifecycle.state();
        if state != SearchState::Ready {
            return Err(SearchError::NotReady { state });
        }
        let store = self.index.read().await.clone().ok_or(SearchError::NotReady { state })?;

        let results = self.ranker.rank(query, store.as_ref());
        let grouped = group_by_category(&results);
        info!(query, result_count = results.len(), groups = grouped.len(), "search completed");
        Ok(SearchResponse { results, grouped })
    }

    /// Drop the in-memory index, purge the persisted snapshot, and return to
    /// [`SearchState::Uninitialized`]. Failures are logged, never raised.
    pub async fn cleanup(&self) {
        let _guard = self.init_lock.lock().await;
        self.index.write().await.take();
        if let Err(e) = self.cache.clear().await {
            warn!(error = %e, "failed to purge persisted search index");
        }
        self.lifecycle.reset();
        info!("menu search index cleaned up");
    }
}

impl fmt::Debug for MenuSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuSearch")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .field("storage_key", &self.cache.key())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`MenuSearch`].
///
/// `storage` is required; `config` defaults to [`SearchConfig::default()`].
#[derive(Default)]
pub struct MenuSearchBuilder {
    config: Option<SearchConfig>,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl MenuSearchBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the durable store used to persist the index.
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Build the [`MenuSearch`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `storage` is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<MenuSearch> {
        let storage =
            self.storage.ok_or_else(|| SearchError::Config("storage is required".to_string()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(MenuSearch::from_parts(config, storage))
    }
}
