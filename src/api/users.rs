//! User API endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::simulate_latency;
use crate::errors::AppError;
use crate::models::{
    clamp_limit, CreateUserRequest, DeleteUserResponse, ListParams, ListUsersResponse, User,
    DEFAULT_LIMIT,
};
use crate::AppState;

/// Raw list query parameters.
///
/// Parsed leniently: a non-numeric `limit` falls back to the default and a
/// non-numeric `cursor` behaves like no cursor. Either key being present
/// selects the paginated response.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ListUsersQuery {
    pub fn into_params(self) -> ListParams {
        let paginated = self.limit.is_some() || self.cursor.is_some();

        // An unparseable cursor still selects the paginated response.
        let limit = paginated.then(|| {
            self.limit
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .map_or(DEFAULT_LIMIT, clamp_limit)
        });
        let cursor = self
            .cursor
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|c| *c > 0);

        ListParams {
            q: self.q.filter(|q| !q.trim().is_empty()),
            limit,
            cursor,
        }
    }
}

/// Delete query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/users - List users, optionally filtered and paginated.
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<ListUsersResponse>, AppError> {
    let Query(query) = query?;
    simulate_latency(&state).await;

    let params = query.into_params();
    Ok(Json(state.store.list(&params).await))
}

/// POST /api/users - Create a new user.
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(request) = body?;
    simulate_latency(&state).await;

    let user = state.store.create(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/users?id= - Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    query: Result<Query<DeleteUserQuery>, QueryRejection>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    let Query(query) = query?;
    simulate_latency(&state).await;

    let removed = state.store.delete(query.id.as_deref()).await?;
    Ok(Json(DeleteUserResponse { ok: true, removed }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(q: Option<&str>, limit: Option<&str>, cursor: Option<&str>) -> ListUsersQuery {
        ListUsersQuery {
            q: q.map(String::from),
            limit: limit.map(String::from),
            cursor: cursor.map(String::from),
        }
    }

    #[test]
    fn test_no_limit_or_cursor_is_legacy() {
        let params = query(Some("lee"), None, None).into_params();
        assert!(!params.is_paginated());
        assert_eq!(params.q.as_deref(), Some("lee"));
    }

    #[test]
    fn test_lenient_limit() {
        assert_eq!(query(None, Some("abc"), None).into_params().limit, Some(20));
        assert_eq!(query(None, Some("0"), None).into_params().limit, Some(1));
        assert_eq!(query(None, Some("80"), None).into_params().limit, Some(50));
        assert_eq!(query(None, Some("5"), None).into_params().limit, Some(5));
    }

    #[test]
    fn test_lenient_cursor() {
        let params = query(None, None, Some("nope")).into_params();
        assert!(params.is_paginated());
        assert_eq!(params.cursor, None);

        assert_eq!(query(None, None, Some("12")).into_params().cursor, Some(12));
    }

    #[test]
    fn test_blank_filter_is_dropped() {
        assert_eq!(query(Some("  "), None, None).into_params().q, None);
    }
}
