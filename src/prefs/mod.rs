//! Persisted client preferences.
//!
//! Preferences live under the `"prefs"` key of a small key-value store as
//! `{"q": ..., "limit": ...}`. They are read once at startup and written back
//! when the search text or page size is set. `hydrate` and `reset` only touch
//! the in-memory value.

mod kv;

pub use kv::*;

use tokio::sync::watch;

use crate::models::{Preferences, PreferencesPatch};

/// Key under which preferences are stored.
pub const PREFS_KEY: &str = "prefs";

/// Preference persistence error.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current preferences backed by a key-value store.
///
/// Every change notifies subscribers; only the setters persist.
pub struct PreferencesHandle<S> {
    store: S,
    current: watch::Sender<Preferences>,
}

impl<S: KeyValueStore> PreferencesHandle<S> {
    /// Load preferences from `store`, falling back to defaults when the entry
    /// is missing or unreadable.
    pub fn load(store: S) -> Self {
        let mut prefs = Preferences::default();

        match store.get(PREFS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PreferencesPatch>(&raw) {
                Ok(patch) => prefs.hydrate(patch),
                Err(e) => tracing::warn!("Ignoring unreadable preferences: {}", e),
            },
            Ok(None) => tracing::debug!("No stored preferences, using defaults"),
            Err(e) => tracing::warn!("Failed to read preferences: {}", e),
        }

        Self {
            store,
            current: watch::Sender::new(prefs),
        }
    }

    pub fn current(&self) -> Preferences {
        self.current.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.current.subscribe()
    }

    /// Set the search text and persist.
    pub fn set_query(&self, q: impl Into<String>) -> Result<(), PrefsError> {
        let q = q.into();
        self.update(|p| p.set_query(q));
        self.save()
    }

    /// Set the page size (clamped to 1..=50) and persist.
    pub fn set_limit(&self, limit: usize) -> Result<(), PrefsError> {
        self.update(|p| p.set_limit(limit));
        self.save()
    }

    /// Apply a partial update without persisting it.
    pub fn hydrate(&self, patch: PreferencesPatch) {
        self.update(|p| p.hydrate(patch));
    }

    /// Return to defaults without persisting.
    pub fn reset(&self) {
        self.update(|p| *p = Preferences::default());
    }

    fn update(&self, f: impl FnOnce(&mut Preferences)) {
        self.current.send_if_modified(|prefs| {
            let before = prefs.clone();
            f(prefs);
            *prefs != before
        });
    }

    fn save(&self) -> Result<(), PrefsError> {
        let json = serde_json::to_string(&self.current())?;
        self.store.set(PREFS_KEY, &json)
    }
}
