//! Pagination models for list queries.

use serde::{Deserialize, Serialize};

use super::User;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 20;
/// Smallest accepted page size.
pub const MIN_LIMIT: usize = 1;
/// Largest accepted page size.
pub const MAX_LIMIT: usize = 50;

/// Clamp a requested page size into the accepted range.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// One window of a filtered, id-ordered user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    pub items: Vec<User>,
    /// Id to pass as `cursor` for the following page, if any remain.
    pub next_cursor: Option<u64>,
    /// Number of users matching the filter, independent of the window.
    pub total: usize,
}

/// Body of `GET /api/users`.
///
/// Callers that send neither `limit` nor `cursor` receive the bare array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListUsersResponse {
    Page(UsersPage),
    All(Vec<User>),
}

/// Parsed parameters of a list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<u64>,
}

impl ListParams {
    /// Whether the caller asked for a paginated response.
    pub fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.cursor.is_some()
    }
}
