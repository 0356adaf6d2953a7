//! Search session: the user's query state and the instant-search policy.
//!
//! With instant search on, search text edits apply immediately. With it off,
//! edits only update a draft that [`SearchSession::submit`] applies. Category,
//! specialty and mode changes always apply immediately. Every change is
//! written to the session-scoped key-value store so a reload restores it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::{CategoryLabels, EngineConfig};
use crate::filter::filter;
use crate::matcher::MatchMode;
use crate::ports::KeyValueStore;
use crate::query::{CategoryFilter, QueryState};
use crate::record::Record;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default)]
    query: QueryState,

    /// Search text typed but not yet submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_search_text: Option<String>,
}

/// Owns the query state of one user session.
pub struct SearchSession {
    key: String,
    labels: CategoryLabels,
    store: Option<Arc<dyn KeyValueStore>>,
    state: RwLock<SessionState>,
    revision: AtomicU64,
}

impl SearchSession {
    /// Creates a session that is not persisted.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            key: config.session_key.clone(),
            labels: config.category_labels.clone(),
            store: None,
            state: RwLock::new(SessionState::default()),
            revision: AtomicU64::new(0),
        }
    }

    /// Creates a session persisted in `store`, restoring any saved state.
    ///
    /// A missing or unreadable entry starts a fresh session.
    pub fn restore(config: &EngineConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let state = match store.read(&config.session_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "ignoring corrupt session state");
                SessionState::default()
            }),
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::debug!(error = %e, "could not read session state");
                SessionState::default()
            }
        };

        Self {
            store: Some(store),
            state: RwLock::new(state),
            ..Self::new(config)
        }
    }

    /// The applied query state.
    pub fn query(&self) -> QueryState {
        self.state.read().query.clone()
    }

    /// The search text as typed, including an unsubmitted draft.
    pub fn draft(&self) -> String {
        let state = self.state.read();
        state
            .pending_search_text
            .clone()
            .unwrap_or_else(|| state.query.search_text.clone())
    }

    /// Returns true when a typed search text has not been applied yet.
    pub fn has_pending_search(&self) -> bool {
        self.state.read().pending_search_text.is_some()
    }

    /// Counter bumped every time the applied query changes.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }

    /// Updates the search text. Returns true when the applied query changed.
    pub fn set_search_text(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(|state| {
            if state.query.instant_search {
                state.pending_search_text = None;
                replace(&mut state.query.search_text, text)
            } else {
                state.pending_search_text = Some(text);
                false
            }
        })
    }

    /// Applies the pending search text. Returns true when the applied query changed.
    pub fn submit(&self) -> bool {
        self.update(|state| match state.pending_search_text.take() {
            Some(text) => replace(&mut state.query.search_text, text),
            None => false,
        })
    }

    pub fn set_category(&self, category: CategoryFilter) -> bool {
        self.update(|state| replace(&mut state.query.category_filter, category))
    }

    pub fn set_specialty(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(|state| replace(&mut state.query.specialty_filter, text))
    }

    pub fn set_match_mode(&self, mode: MatchMode) -> bool {
        self.update(|state| replace(&mut state.query.match_mode, mode))
    }

    /// Turns instant search on or off.
    ///
    /// Turning it on applies any pending draft.
    pub fn set_instant_search(&self, instant: bool) -> bool {
        self.update(|state| {
            state.query.instant_search = instant;
            match state.pending_search_text.take() {
                Some(text) if instant => replace(&mut state.query.search_text, text),
                pending => {
                    state.pending_search_text = pending;
                    false
                }
            }
        })
    }

    /// Resets the session to an empty query.
    pub fn clear(&self) -> bool {
        self.update(|state| {
            let instant = state.query.instant_search;
            let old = std::mem::take(state);
            state.query.instant_search = instant;
            old.query != state.query
        })
    }

    /// Filters `records` with the applied query.
    pub fn results<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let query = self.query();
        filter(records, &query, &self.labels)
    }

    fn update(&self, apply: impl FnOnce(&mut SessionState) -> bool) -> bool {
        let mut state = self.state.write();
        let before = state.clone();
        let changed = apply(&mut *state);
        if changed {
            self.revision.fetch_add(1, Ordering::Relaxed);
        }
        if *state != before {
            self.persist(&state);
        }
        changed
    }

    fn persist(&self, state: &SessionState) {
        let Some(store) = &self.store else {
            return;
        };
        let written = serde_json::to_string(state)
            .map_err(Into::into)
            .and_then(|json| store.write(&self.key, &json));
        if let Err(e) = written {
            tracing::warn!(error = %e, key = %self.key, "failed to persist session state");
        }
    }
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("key", &self.key)
            .field("state", &*self.state.read())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

/// Replaces `slot` with `value` and reports whether it changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
