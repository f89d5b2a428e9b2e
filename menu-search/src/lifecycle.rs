//! Index lifecycle state machine with synchronous observers.
//!
//! ```text
//! UNINITIALIZED ──initialize──▶ LOADING ──ok──▶ READY
//!                                  │  ▲           │
//!                                  │  └─initialize┤
//!                                  └──err──▶ ERROR┘
//! ```
//!
//! Every transition (and every progress update while loading) is delivered
//! to all listeners in registration order before the transition call returns.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The lifecycle state of the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchState {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

impl SearchState {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Any state may be reset to `Uninitialized`; `Loading` may repeat to
    /// report progress.
    pub fn can_transition_to(self, next: SearchState) -> bool {
        use SearchState::*;
        matches!(
            (self, next),
            (_, Uninitialized)
                | (Uninitialized | Ready | Error, Loading)
                | (Loading, Loading | Ready | Error)
        )
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchState::Uninitialized => "UNINITIALIZED",
            SearchState::Loading => "LOADING",
            SearchState::Ready => "READY",
            SearchState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// What listeners receive: the state, the last error, and load progress (0–100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleSnapshot {
    pub state: SearchState,
    pub error: Option<String>,
    pub progress: u8,
}

impl LifecycleSnapshot {
    fn new(state: SearchState, error: Option<String>, progress: u8) -> Self {
        Self { state, error, progress: progress.min(100) }
    }
}

impl Default for LifecycleSnapshot {
    fn default() -> Self {
        Self::new(SearchState::Uninitialized, None, 0)
    }
}

/// A lifecycle observer.
pub type StateListener = Arc<dyn Fn(&LifecycleSnapshot) + Send + Sync>;

/// Handle returned by [`SearchLifecycle::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Inner {
    current: LifecycleSnapshot,
    listeners: Vec<(ListenerId, StateListener)>,
    next_id: u64,
}

/// Owns the [`LifecycleSnapshot`] and notifies listeners of every change.
#[derive(Default)]
pub struct SearchLifecycle {
    inner: Mutex<Inner>,
}

impl SearchLifecycle {
    /// Start in [`SearchState::Uninitialized`] with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current snapshot.
    pub fn current(&self) -> LifecycleSnapshot {
        self.lock().current.clone()
    }

    /// The current state.
    pub fn state(&self) -> SearchState {
        self.lock().current.state
    }

    /// Register `listener` and immediately call it with the current snapshot.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&LifecycleSnapshot) + Send + Sync + 'static,
    {
        let listener: StateListener = Arc::new(listener);
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = ListenerId(inner.next_id);
            inner.next_id += 1;
            inner.listeners.push((id, listener.clone()));
            (id, inner.current.clone())
        };
        listener(&snapshot);
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(listener_id, _)| *listener_id != id);
        inner.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Enter [`SearchState::Loading`] at progress 0.
    pub fn begin_loading(&self) -> bool {
        self.transition(LifecycleSnapshot::new(SearchState::Loading, None, 0))
    }

    /// Report load progress. Ignored unless currently loading.
    pub fn report_progress(&self, progress: u8) -> bool {
        if self.state() != SearchState::Loading {
            return false;
        }
        self.transition(LifecycleSnapshot::new(SearchState::Loading, None, progress))
    }

    /// Enter [`SearchState::Ready`].
    pub fn mark_ready(&self) -> bool {
        self.transition(LifecycleSnapshot::new(SearchState::Ready, None, 100))
    }

    /// Enter [`SearchState::Error`] with `message`.
    pub fn mark_error(&self, message: impl Into<String>) -> bool {
        self.transition(LifecycleSnapshot::new(SearchState::Error, Some(message.into()), 0))
    }

    /// Return to [`SearchState::Uninitialized`].
    pub fn reset(&self) -> bool {
        self.transition(LifecycleSnapshot::default())
    }

    fn transition(&self, next: LifecycleSnapshot) -> bool {
        let listeners: Vec<StateListener> = {
            let mut inner = self.lock();
            let from = inner.current.state;
            if !from.can_transition_to(next.state) {
                warn!(%from, to = %next.state, "ignoring invalid lifecycle transition");
                return false;
            }
            debug!(%from, to = %next.state, progress = next.progress, "lifecycle transition");
            inner.current = next.clone();
            inner.listeners.iter().map(|(_, listener)| listener.clone()).collect()
        };
        // Called outside the lock so listeners may query or unsubscribe.
        for listener in listeners {
            listener(&next);
        }
        true
    }
}

impl fmt::Debug for SearchLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SearchLifecycle")
            .field("current", &inner.current)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(lifecycle: &SearchLifecycle) -> (ListenerId, Arc<Mutex<Vec<LifecycleSnapshot>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = lifecycle.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        (id, seen)
    }

    #[test]
    fn new_listener_receives_current_state() {
        let lifecycle = SearchLifecycle::new();
        let (_, seen) = recorder(&lifecycle);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].state, SearchState::Uninitialized);
    }

    #[test]
    fn listeners_see_every_transition_in_order() {
        let lifecycle = SearchLifecycle::new();
        let (_, seen) = recorder(&lifecycle);

        assert!(lifecycle.begin_loading());
        assert!(lifecycle.report_progress(50));
        assert!(lifecycle.mark_ready());

        let states: Vec<(SearchState, u8)> =
            seen.lock().unwrap().iter().map(|s| (s.state, s.progress)).collect();
        assert_eq!(
            states,
            vec![
                (SearchState::Uninitialized, 0),
                (SearchState::Loading, 0),
                (SearchState::Loading, 50),
                (SearchState::Ready, 100),
            ]
        );
    }

    #[test]
    fn error_carries_message_and_can_reload() {
        let lifecycle = SearchLifecycle::new();
        lifecycle.begin_loading();
        lifecycle.mark_error("boom");
        let current = lifecycle.current();
        assert_eq!(current.state, SearchState::Error);
        assert_eq!(current.error.as_deref(), Some("boom"));
        assert!(lifecycle.begin_loading());
        assert_eq!(lifecycle.current().error, None);
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let lifecycle = SearchLifecycle::new();
        assert!(!lifecycle.mark_ready());
        assert!(!lifecycle.mark_error("nope"));
        assert!(!lifecycle.report_progress(10));
        assert_eq!(lifecycle.state(), SearchState::Uninitialized);

        lifecycle.begin_loading();
        lifecycle.mark_ready();
        assert!(!lifecycle.mark_error("late"));
        assert_eq!(lifecycle.state(), SearchState::Ready);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let lifecycle = SearchLifecycle::new();
        let (id, seen) = recorder(&lifecycle);
        assert!(lifecycle.unsubscribe(id));
        assert!(!lifecycle.unsubscribe(id));
        lifecycle.begin_loading();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(lifecycle.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_state_during_notification() {
        let lifecycle = Arc::new(SearchLifecycle::new());
        let observed = Arc::new(Mutex::new(Vec::new()));
        let (inner, sink) = (lifecycle.clone(), observed.clone());
        lifecycle.subscribe(move |_| sink.lock().unwrap().push(inner.state()));
        lifecycle.begin_loading();
        assert_eq!(
            *observed.lock().unwrap(),
            vec![SearchState::Uninitialized, SearchState::Loading]
        );
    }

    #[test]
    fn state_serializes_in_upper_case() {
        assert_eq!(serde_json::to_string(&SearchState::Ready).unwrap(), "\"READY\"");
        assert_eq!(SearchState::Uninitialized.to_string(), "UNINITIALIZED");
    }
}
