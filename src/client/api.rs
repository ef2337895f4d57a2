//! Request/response boundary between the cache and the users service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::{CreateUserRequest, User, UsersPage};
use crate::store::UserStore;

/// Operations the cache needs from the users service.
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Fetch one page of users matching `q`, starting after `cursor`.
    async fn list_page(
        &self,
        q: Option<&str>,
        limit: usize,
        cursor: Option<u64>,
    ) -> Result<UsersPage, ClientError>;

    /// Create a user and return the stored record.
    async fn create(&self, request: &CreateUserRequest) -> Result<User, ClientError>;

    /// Delete a user and return the removed record.
    async fn delete(&self, id: u64) -> Result<User, ClientError>;
}

#[async_trait]
impl<T: UsersApi + ?Sized> UsersApi for Arc<T> {
    async fn list_page(
        &self,
        q: Option<&str>,
        limit: usize,
        cursor: Option<u64>,
    ) -> Result<UsersPage, ClientError> {
        (**self).list_page(q, limit, cursor).await
    }

    async fn create(&self, request: &CreateUserRequest) -> Result<User, ClientError> {
        (**self).create(request).await
    }

    async fn delete(&self, id: u64) -> Result<User, ClientError> {
        (**self).delete(id).await
    }
}

/// In-process access to a [`UserStore`], skipping HTTP.
#[derive(Debug, Clone)]
pub struct LocalUsersApi {
    store: Arc<UserStore>,
}

impl LocalUsersApi {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<UserStore> {
        &self.store
    }
}

#[async_trait]
impl UsersApi for LocalUsersApi {
    async fn list_page(
        &self,
        q: Option<&str>,
        limit: usize,
        cursor: Option<u64>,
    ) -> Result<UsersPage, ClientError> {
        Ok(self.store.page(q, limit, cursor).await)
    }

    async fn create(&self, request: &CreateUserRequest) -> Result<User, ClientError> {
        Ok(self.store.create(request).await?)
    }

    async fn delete(&self, id: u64) -> Result<User, ClientError> {
        Ok(self.store.delete_id(id).await?)
    }
}
