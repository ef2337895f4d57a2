//! User repository: list, create and delete over an in-memory set.

use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{
    clamp_limit, CreateUserRequest, ListParams, ListUsersResponse, User, UsersPage, DEFAULT_LIMIT,
};
use crate::search::Filter;
use crate::seed::generate_users;

/// In-memory user repository.
///
/// Ids are assigned as `max(existing) + 1`, so a deleted maximum id may be
/// handed out again. The store assumes a single writer per request.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Create a store holding `count` generated users.
    pub fn seeded(count: usize, seed: Option<u64>) -> Self {
        Self::new(generate_users(count, seed))
    }

    /// Number of users currently stored.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Replace the whole user set.
    pub async fn reset(&self, users: Vec<User>) {
        let mut guard = self.users.write().await;
        *guard = users;
        tracing::info!("User store reset with {} users", guard.len());
    }

    /// Answer a list query.
    ///
    /// Without `limit` and `cursor` every match is returned as a bare list;
    /// otherwise a single page is returned.
    pub async fn list(&self, params: &ListParams) -> ListUsersResponse {
        if params.is_paginated() {
            let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
            ListUsersResponse::Page(self.page(params.q.as_deref(), limit, params.cursor).await)
        } else {
            ListUsersResponse::All(self.matching(params.q.as_deref()).await)
        }
    }

    /// All users matching the filter, ordered by id.
    pub async fn matching(&self, q: Option<&str>) -> Vec<User> {
        let filter = Filter::new(q);
        let users = self.users.read().await;

        let mut matches: Vec<User> = users
            .iter()
            .filter(|u| filter.matches(&u.profile))
            .cloned()
            .collect();
        matches.sort_by_key(|u| u.id);
        matches
    }

    /// One page of the filtered, id-ordered set.
    ///
    /// The page starts right after the user whose id equals `cursor`. A
    /// cursor that matches no user in the filtered set starts from the
    /// beginning.
    pub async fn page(&self, q: Option<&str>, limit: usize, cursor: Option<u64>) -> UsersPage {
        let limit = clamp_limit(limit);
        let matches = self.matching(q).await;
        let total = matches.len();

        let start = cursor
            .and_then(|c| matches.iter().position(|u| u.id == c))
            .map_or(0, |i| i + 1);
        let end = (start + limit).min(total);

        let items = matches[start..end].to_vec();
        let next_cursor = if end < total {
            items.last().map(|u| u.id)
        } else {
            None
        };

        tracing::debug!(
            q = q.unwrap_or_default(),
            limit,
            ?cursor,
            returned = items.len(),
            total,
            "Listed users page"
        );

        UsersPage {
            items,
            next_cursor,
            total,
        }
    }

    /// Validate and append a new user.
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let profile = request.validate().map_err(|msg| {
            tracing::warn!("Rejected user create: {}", msg);
            AppError::Validation(msg)
        })?;

        let mut users = self.users.write().await;
        let id = users
            .iter()
            .map(|u| u.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                tracing::error!("User id space exhausted");
                AppError::Internal("No user id left to assign".to_string())
            })?;
        let user = User::new(id, profile);
        users.push(user.clone());

        tracing::info!("Created user {}", id);
        Ok(user)
    }

    /// Delete a user by its raw id parameter.
    pub async fn delete(&self, raw_id: Option<&str>) -> Result<User, AppError> {
        let id = parse_id(raw_id)?;
        self.delete_id(id).await
    }

    /// Delete a user by id.
    pub async fn delete_id(&self, id: u64) -> Result<User, AppError> {
        if id == 0 {
            return Err(AppError::BadRequest("Invalid id".to_string()));
        }

        let mut users = self.users.write().await;
        let index = users.iter().position(|u| u.id == id).ok_or_else(|| {
            tracing::warn!("Delete of unknown user {}", id);
            AppError::NotFound(format!("User {} not found", id))
        })?;

        let removed = users.remove(index);
        tracing::info!("Deleted user {}", id);
        Ok(removed)
    }
}

/// Parse a delete id. Missing, zero and non-integer ids are bad requests.
pub fn parse_id(raw: Option<&str>) -> Result<u64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing id".to_string()))?;

    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(AppError::BadRequest(format!("Invalid id '{}'", raw))),
        Ok(id) => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Profile};

    fn user(id: u64, name: &str) -> User {
        User::new(
            id,
            Profile {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                gender: Gender::Other,
                title: "Designer".to_string(),
            },
        )
    }

    fn three_users() -> UserStore {
        UserStore::new(vec![user(1, "Ann"), user(2, "Bob"), user(3, "Cid")])
    }

    fn request(name: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: Some(name.to_string()),
            email: Some("a@x.com".to_string()),
            gender: Some("other".to_string()),
            title: Some("T".to_string()),
        }
    }

    #[tokio::test]
    async fn test_page_walk_scenario() {
        let store = three_users();

        let first = store.page(None, 2, None).await;
        assert_eq!(first.items.iter().map(|u| u.id).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(first.next_cursor, Some(2));
        assert_eq!(first.total, 3);

        let second = store.page(None, 2, first.next_cursor).await;
        assert_eq!(second.items.iter().map(|u| u.id).collect::<Vec<_>>(), [3]);
        assert_eq!(second.next_cursor, None);
        assert_eq!(second.total, 3);
    }

    #[tokio::test]
    async fn test_pagination_is_exhaustive() {
        let store = UserStore::seeded(100, Some(11));
        let expected = store.matching(Some("a")).await;

        for limit in [1, 7, 20, 50] {
            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let page = store.page(Some("a"), limit, cursor).await;
                assert_eq!(page.total, expected.len());
                seen.extend(page.items.iter().map(|u| u.id));
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
            let expected_ids: Vec<u64> = expected.iter().map(|u| u.id).collect();
            assert_eq!(seen, expected_ids, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_unknown_cursor_starts_from_beginning() {
        let store = three_users();
        let from_start = store.page(None, 2, None).await;
        assert_eq!(store.page(None, 2, Some(999)).await, from_start);

        // Cursor exists overall but not in the filtered set
        let filtered = store.page(Some("bob"), 2, None).await;
        assert_eq!(store.page(Some("bob"), 2, Some(1)).await, filtered);
    }

    #[tokio::test]
    async fn test_page_limit_is_clamped() {
        let store = UserStore::seeded(80, Some(1));
        assert_eq!(store.page(None, 500, None).await.items.len(), 50);
        assert_eq!(store.page(None, 0, None).await.items.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_applies_before_pagination() {
        let store = three_users();
        let page = store.page(Some("CID"), 2, None).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, 3);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_legacy_list_returns_all_matches() {
        let store = three_users();
        let response = store.list(&ListParams::default()).await;
        match response {
            ListUsersResponse::All(users) => assert_eq!(users.len(), 3),
            other => panic!("expected bare list, got {:?}", other),
        }

        let paged = store
            .list(&ListParams {
                cursor: Some(1),
                ..Default::default()
            })
            .await;
        assert!(matches!(paged, ListUsersResponse::Page(p) if p.items.len() == 2));
    }

    #[tokio::test]
    async fn test_create_assigns_max_plus_one() {
        let store = three_users();
        let created = store.create(&request("A")).await.unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_create_on_empty_store_starts_at_one() {
        let store = UserStore::default();
        assert_eq!(store.create(&request("A")).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_create_reports_exhausted_ids() {
        let store = UserStore::new(vec![user(u64::MAX, "Max")]);
        let err = store.create(&request("B")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let store = three_users();
        let mut bad = request("A");
        bad.gender = Some("unknown".to_string());
        assert!(matches!(
            store.create(&bad).await,
            Err(AppError::Validation(_))
        ));

        bad = request("A");
        bad.email = None;
        assert!(matches!(
            store.create(&bad).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = three_users();
        let removed = store.delete(Some("2")).await.unwrap();
        assert_eq!(removed.id, 2);
        assert_eq!(store.len().await, 2);

        assert!(matches!(
            store.delete(Some("999")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.delete(None).await, Err(AppError::BadRequest(_))));
        assert!(matches!(
            store.delete(Some("0")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            store.delete(Some("abc")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_replaces_users() {
        let store = three_users();
        store.reset(vec![user(10, "Dee")]).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.create(&request("E")).await.unwrap().id, 11);
    }
}
