//! Callback registry for cache change notifications.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::CacheSnapshot;

type Callback = Arc<dyn Fn(&CacheSnapshot) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

pub(crate) type SharedListeners = Arc<Mutex<Listeners>>;

pub(crate) fn register(
    listeners: &SharedListeners,
    callback: impl Fn(&CacheSnapshot) + Send + Sync + 'static,
) -> Subscription {
    let mut guard = listeners.lock().unwrap_or_else(PoisonError::into_inner);
    let id = guard.next_id;
    guard.next_id += 1;
    guard.callbacks.push((id, Arc::new(callback)));

    Subscription {
        id,
        listeners: Arc::downgrade(listeners),
    }
}

/// Invoke every callback with `snapshot`.
///
/// The registry lock is released before any callback runs, so callbacks may
/// register, drop subscriptions or touch the cache.
pub(crate) fn notify(listeners: &SharedListeners, snapshot: &CacheSnapshot) {
    let callbacks: Vec<Callback> = listeners
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .callbacks
        .iter()
        .map(|(_, cb)| Arc::clone(cb))
        .collect();

    for callback in callbacks {
        callback(snapshot);
    }
}

/// Handle for a registered change callback. Dropping it unregisters the
/// callback.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
