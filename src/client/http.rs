//! HTTP transport for [`UsersApi`].

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::UsersApi;
use crate::errors::{ClientError, ErrorResponse};
use crate::models::{CreateUserRequest, DeleteUserResponse, ListUsersResponse, User, UsersPage};

/// Talks to the users endpoints of a running roster server.
#[derive(Debug, Clone)]
pub struct HttpUsersApi {
    client: Client,
    base_url: String,
}

impl HttpUsersApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn users_url(&self) -> String {
        format!("{}/api/users", self.base_url)
    }
}

/// Decode a success body, or classify the error response.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.json::<ErrorResponse>().await.ok();
    Err(ClientError::from_response(status.as_u16(), body))
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    async fn list_page(
        &self,
        q: Option<&str>,
        limit: usize,
        cursor: Option<u64>,
    ) -> Result<UsersPage, ClientError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(q) = q {
            params.push(("q", q.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let response = self
            .client
            .get(self.users_url())
            .query(&params)
            .send()
            .await?;

        match decode::<ListUsersResponse>(response).await? {
            ListUsersResponse::Page(page) => Ok(page),
            ListUsersResponse::All(items) => Ok(UsersPage {
                total: items.len(),
                items,
                next_cursor: None,
            }),
        }
    }

    async fn create(&self, request: &CreateUserRequest) -> Result<User, ClientError> {
        let response = self
            .client
            .post(self.users_url())
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, id: u64) -> Result<User, ClientError> {
        let response = self
            .client
            .delete(self.users_url())
            .query(&[("id", id)])
            .send()
            .await?;

        let body: DeleteUserResponse = decode(response).await?;
        if !body.ok {
            return Err(ClientError::Network("Delete failed".to_string()));
        }
        Ok(body.removed)
    }
}
