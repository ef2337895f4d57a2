//! Cursor-paginated, optimistically-updated cache over one users query.
//!
//! The cache holds the materialized view of a single query scope (filter and
//! page size): the users loaded so far, the last cursor and total, and a
//! status. Pages are merged by id; creates and deletes are applied locally
//! before the service answers and rolled back if it refuses.
//!
//! All state sits behind one mutex that is never held across an await.
//! Every query is tagged with a generation, bumped by a replacing query and
//! by [`UsersCache::reset`]; a response from an older generation is dropped
//! and the request itself is cancelled as soon as it is superseded.
//! Mutations are tagged with an epoch that only `reset` bumps.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::listeners::{self, Listeners, SharedListeners, Subscription};
use super::UsersApi;
use crate::errors::ClientError;
use crate::models::{
    clamp_limit, gender_counts, CreateUserRequest, GenderCounts, Profile, User, UsersPage,
    DEFAULT_LIMIT,
};

/// Identity of a cached entry.
///
/// Placeholders for creates the service has not confirmed yet carry a local
/// token and sort before every confirmed id, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Pending(u64),
    Confirmed(u64),
}

impl Ord for EntryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (EntryKey::Pending(a), EntryKey::Pending(b)) => b.cmp(a),
            (EntryKey::Pending(_), EntryKey::Confirmed(_)) => Ordering::Less,
            (EntryKey::Confirmed(_), EntryKey::Pending(_)) => Ordering::Greater,
            (EntryKey::Confirmed(a), EntryKey::Confirmed(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for EntryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One user in the materialized view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedUser {
    pub key: EntryKey,
    pub profile: Profile,
}

impl CachedUser {
    /// Server-assigned id, if confirmed.
    pub fn id(&self) -> Option<u64> {
        match self.key {
            EntryKey::Confirmed(id) => Some(id),
            EntryKey::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.key, EntryKey::Pending(_))
    }
}

impl From<User> for CachedUser {
    fn from(user: User) -> Self {
        Self {
            key: EntryKey::Confirmed(user.id),
            profile: user.profile,
        }
    }
}

/// Lifecycle of the cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Filter and page size of the query the cache materializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScope {
    pub q: Option<String>,
    pub limit: usize,
}

impl Default for QueryScope {
    fn default() -> Self {
        Self {
            q: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Loaded users plus the pagination state that came with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// Sorted by key, keys unique.
    pub items: Vec<CachedUser>,
    pub next_cursor: Option<u64>,
    pub total: usize,
}

impl View {
    fn position(&self, key: EntryKey) -> Result<usize, usize> {
        self.items.binary_search_by_key(&key, |u| u.key)
    }

    /// Insert or overwrite `users` by id, keeping the items sorted.
    fn merge(&mut self, users: impl IntoIterator<Item = User>) {
        for user in users {
            let entry = CachedUser::from(user);
            match self.position(entry.key) {
                Ok(i) => self.items[i] = entry,
                Err(i) => self.items.insert(i, entry),
            }
        }
    }

    fn remove(&mut self, key: EntryKey) -> Option<CachedUser> {
        self.position(key).ok().map(|i| self.items.remove(i))
    }

    fn insert(&mut self, entry: CachedUser) {
        if let Err(i) = self.position(entry.key) {
            self.items.insert(i, entry);
        }
    }
}

/// Observable state of the cache at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub view: View,
    pub status: Status,
    pub error: Option<String>,
    pub scope: QueryScope,
}

impl CacheSnapshot {
    pub fn items(&self) -> &[CachedUser] {
        &self.view.items
    }

    pub fn total(&self) -> usize {
        self.view.total
    }

    pub fn next_cursor(&self) -> Option<u64> {
        self.view.next_cursor
    }

    pub fn has_more(&self) -> bool {
        self.view.next_cursor.is_some()
    }

    pub fn gender_counts(&self) -> GenderCounts {
        gender_counts(self.view.items.iter().map(|u| &u.profile))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    view: View,
    status: Status,
    error: Option<String>,
    scope: QueryScope,
    /// Bumped by replacing queries and reset.
    generation: u64,
    /// Bumped by reset.
    epoch: u64,
    /// Bumped whenever `view` is swapped out wholesale.
    view_id: u64,
    /// Bumped whenever a page from the service is applied.
    page_seq: u64,
    /// Bumped on every change to `view`.
    revision: u64,
    next_token: u64,
}

impl CacheState {
    fn touch(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn begin(&mut self) {
        self.status = Status::Loading;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.status = Status::Succeeded;
        self.error = None;
    }

    fn fail(&mut self, error: &ClientError) {
        self.status = Status::Failed;
        self.error = Some(error.to_string());
    }

    fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            view: self.view.clone(),
            status: self.status,
            error: self.error.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Bookkeeping for one in-flight create or delete.
///
/// Lives on the stack of the operation that issued it and is consumed when
/// the response arrives.
struct Optimistic {
    epoch: u64,
    view_id: u64,
    page_seq: u64,
    /// `revision` right after the optimistic edit.
    revision: u64,
    snapshot: View,
}

impl Optimistic {
    /// Whether `state` still shows exactly the optimistic edit.
    fn untouched(&self, state: &CacheState) -> bool {
        state.revision == self.revision
    }

    /// Whether the view the edit was applied to is still in place.
    fn same_view(&self, state: &CacheState) -> bool {
        state.view_id == self.view_id
    }

    /// Whether `total` still derives from the page seen at edit time.
    fn same_total(&self, state: &CacheState) -> bool {
        self.same_view(state) && state.page_seq == self.page_seq
    }
}

/// Client-side cache over one users query.
///
/// Changes can be observed three ways: pull with [`snapshot`](Self::snapshot),
/// push with [`subscribe`](Self::subscribe), or register a callback with
/// [`on_change`](Self::on_change).
pub struct UsersCache<A> {
    api: A,
    state: Mutex<CacheState>,
    changes: watch::Sender<CacheSnapshot>,
    generation: watch::Sender<u64>,
    listeners: SharedListeners,
}

impl<A: UsersApi> UsersCache<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(CacheState::default()),
            changes: watch::Sender::new(CacheSnapshot::default()),
            generation: watch::Sender::new(0),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Current state.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.changes.borrow().clone()
    }

    /// Receiver that observes every published state.
    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot> {
        self.changes.subscribe()
    }

    /// Call `callback` after every state change until the returned
    /// [`Subscription`] is dropped.
    pub fn on_change(
        &self,
        callback: impl Fn(&CacheSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        listeners::register(&self.listeners, callback)
    }

    /// Per-gender tallies over the loaded users.
    pub fn gender_counts(&self) -> GenderCounts {
        self.changes.borrow().gender_counts()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the state behind `guard`, then run callbacks without the lock.
    fn publish(&self, guard: MutexGuard<'_, CacheState>) {
        let snapshot = guard.snapshot();
        self.changes.send_replace(snapshot.clone());
        drop(guard);
        listeners::notify(&self.listeners, &snapshot);
    }

    /// Load a page of `q` with page size `limit`, starting after `cursor`.
    ///
    /// With `replace` the page becomes the whole view and supersedes any query
    /// still in flight; otherwise it is merged into the view by id. Returns
    /// `Ok(None)` when this query was superseded before it could be applied.
    pub async fn query(
        &self,
        q: Option<&str>,
        limit: usize,
        cursor: Option<u64>,
        replace: bool,
    ) -> Result<Option<UsersPage>, ClientError> {
        let q = q.map(str::trim).filter(|q| !q.is_empty());
        let limit = clamp_limit(limit);

        let generation = {
            let mut state = self.lock();
            if replace {
                state.generation += 1;
                state.scope = QueryScope {
                    q: q.map(String::from),
                    limit,
                };
                self.generation.send_replace(state.generation);
            }
            state.begin();
            let generation = state.generation;
            self.publish(state);
            generation
        };

        let result = {
            let mut superseded = self.generation.subscribe();
            tokio::select! {
                result = self.api.list_page(q, limit, cursor) => result,
                _ = wait_superseded(&mut superseded, generation) => {
                    tracing::debug!(generation, "Cancelled superseded users query");
                    return Ok(None);
                }
            }
        };

        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(generation, "Discarded stale users page");
            return Ok(None);
        }

        match result {
            Ok(page) => {
                if replace {
                    state.view = View::default();
                    state.view_id += 1;
                }
                state.view.merge(page.items.iter().cloned());
                state.view.next_cursor = page.next_cursor;
                state.view.total = page.total;
                state.page_seq += 1;
                state.touch();
                state.succeed();
                self.publish(state);
                Ok(Some(page))
            }
            Err(err) => {
                state.fail(&err);
                self.publish(state);
                Err(err)
            }
        }
    }

    /// Fetch the next page of the current scope and merge it in.
    ///
    /// Returns `Ok(None)` without a request when the view is exhausted.
    pub async fn load_more(&self) -> Result<Option<UsersPage>, ClientError> {
        let (scope, cursor) = {
            let state = self.lock();
            (state.scope.clone(), state.view.next_cursor)
        };

        match cursor {
            Some(cursor) => {
                self.query(scope.q.as_deref(), scope.limit, Some(cursor), false)
                    .await
            }
            None => Ok(None),
        }
    }

    /// Show `profile` at the head of the view right away, then create it.
    ///
    /// On success the placeholder is swapped for the stored user; on failure
    /// the view goes back to what it was before the call.
    pub async fn create_optimistic(&self, profile: Profile) -> Result<User, ClientError> {
        let (token, guard) = {
            let mut state = self.lock();
            let snapshot = state.view.clone();
            let token = state.next_token;
            state.next_token += 1;

            state.view.insert(CachedUser {
                key: EntryKey::Pending(token),
                profile: profile.clone(),
            });
            state.view.total += 1;
            let revision = state.touch();
            state.begin();

            let guard = Optimistic {
                epoch: state.epoch,
                view_id: state.view_id,
                page_seq: state.page_seq,
                revision,
                snapshot,
            };
            self.publish(state);
            (token, guard)
        };

        let result = self.api.create(&CreateUserRequest::from(profile)).await;

        let mut state = self.lock();
        if state.epoch != guard.epoch {
            tracing::debug!("Discarded create response for a reset cache");
            return result;
        }

        let placeholder = EntryKey::Pending(token);
        match &result {
            Ok(user) => {
                if guard.same_view(&state) && state.view.remove(placeholder).is_some() {
                    state.view.merge([user.clone()]);
                }
                state.touch();
                state.succeed();
            }
            Err(err) => {
                tracing::warn!("Rolling back optimistic create: {}", err);
                if guard.untouched(&state) {
                    state.view = guard.snapshot;
                } else if guard.same_view(&state)
                    && state.view.remove(placeholder).is_some()
                    && guard.same_total(&state)
                {
                    state.view.total = state.view.total.saturating_sub(1);
                }
                state.touch();
                state.fail(err);
            }
        }
        self.publish(state);
        result
    }

    /// Drop user `id` from the view right away, then delete it.
    ///
    /// On failure the user is put back and the total restored.
    pub async fn delete_optimistic(&self, id: u64) -> Result<User, ClientError> {
        let key = EntryKey::Confirmed(id);

        let (removed, decremented, guard) = {
            let mut state = self.lock();
            let snapshot = state.view.clone();

            let removed = state.view.remove(key);
            let decremented = state.view.total > 0;
            state.view.total = state.view.total.saturating_sub(1);
            let revision = state.touch();
            state.begin();

            let guard = Optimistic {
                epoch: state.epoch,
                view_id: state.view_id,
                page_seq: state.page_seq,
                revision,
                snapshot,
            };
            self.publish(state);
            (removed, decremented, guard)
        };

        let result = self.api.delete(id).await;

        let mut state = self.lock();
        if state.epoch != guard.epoch {
            tracing::debug!("Discarded delete response for a reset cache");
            return result;
        }

        match &result {
            Ok(_) => state.succeed(),
            Err(err) => {
                tracing::warn!("Rolling back optimistic delete of user {}: {}", id, err);
                if guard.untouched(&state) {
                    state.view = guard.snapshot;
                } else if guard.same_view(&state) {
                    if let Some(entry) = removed {
                        state.view.insert(entry);
                    }
                    if decremented && guard.same_total(&state) {
                        state.view.total += 1;
                    }
                }
                state.touch();
                state.fail(err);
            }
        }
        self.publish(state);
        result
    }

    /// Clear the view and return to `Idle`.
    ///
    /// Queries and mutations already in flight are ignored when they answer.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.view = View::default();
        state.view_id += 1;
        state.status = Status::Idle;
        state.error = None;
        state.generation += 1;
        state.epoch += 1;
        state.touch();
        self.generation.send_replace(state.generation);
        self.publish(state);
    }
}

/// Resolve once the generation moves past `generation`.
async fn wait_superseded(rx: &mut watch::Receiver<u64>, generation: u64) {
    let moved_on = rx.wait_for(|current| *current != generation).await.is_ok();
    if !moved_on {
        std::future::pending::<()>().await;
    }
}

impl<A> std::fmt::Debug for UsersCache<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersCache")
            .field("state", &*self.changes.borrow())
            .finish_non_exhaustive()
    }
}
