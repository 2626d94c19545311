//! Remote gateway - the HTTP boundary to the user record service.
//!
//! Stateless: no retries, no caching, no timeouts. Every failure is reported
//! as a [`GatewayError`] and left for the caller to handle.

use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use roster_engine::{User, UserId, UserPayload};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// CRUD calls against the remote user service.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /users`
    async fn fetch_all(&self) -> Result<Vec<User>, GatewayError>;

    /// `GET /users/{id}`
    async fn fetch_one(&self, id: UserId) -> Result<User, GatewayError>;

    /// `POST /users`
    async fn create(&self, payload: &UserPayload) -> Result<User, GatewayError>;

    /// `PUT /users/{id}`
    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, GatewayError>;

    /// `DELETE /users/{id}`
    async fn remove(&self, id: UserId) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn fetch_all(&self) -> Result<Vec<User>, GatewayError> {
        (**self).fetch_all().await
    }

    async fn fetch_one(&self, id: UserId) -> Result<User, GatewayError> {
        (**self).fetch_one(id).await
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, GatewayError> {
        (**self).create(payload).await
    }

    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, GatewayError> {
        (**self).update(id, payload).await
    }

    async fn remove(&self, id: UserId) -> Result<(), GatewayError> {
        (**self).remove(id).await
    }
}

/// `PUT` body: the form payload plus the id being updated.
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    id: UserId,
    #[serde(flatten)]
    payload: &'a UserPayload,
}

/// [`Gateway`] over HTTP/JSON.
///
/// `reqwest::Client` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a gateway that reuses an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: UserId) -> String {
        format!("{}/users/{}", self.base_url, id)
    }

    /// Send a request and check its status.
    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "service responded");

        if !status.is_success() {
            return Err(GatewayError::Service {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        Ok(response)
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, GatewayError> {
        self.send(request, endpoint)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    GatewayError::Decode(e.to_string())
                } else {
                    GatewayError::Network(e.to_string())
                }
            })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip_all, fields(base_url = %self.base_url))]
    async fn fetch_all(&self) -> Result<Vec<User>, GatewayError> {
        let request = self.client.get(self.users_url());
        self.send_json(request, "GET /users").await
    }

    #[instrument(skip_all, fields(base_url = %self.base_url, user_id = id))]
    async fn fetch_one(&self, id: UserId) -> Result<User, GatewayError> {
        let request = self.client.get(self.user_url(id));
        self.send_json(request, &format!("GET /users/{id}")).await
    }

    #[instrument(skip_all, fields(base_url = %self.base_url))]
    async fn create(&self, payload: &UserPayload) -> Result<User, GatewayError> {
        let request = self.client.post(self.users_url()).json(payload);
        self.send_json(request, "POST /users").await
    }

    #[instrument(skip_all, fields(base_url = %self.base_url, user_id = id))]
    async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, GatewayError> {
        let request = self
            .client
            .put(self.user_url(id))
            .json(&UpdateBody { id, payload });
        self.send_json(request, &format!("PUT /users/{id}")).await
    }

    #[instrument(skip_all, fields(base_url = %self.base_url, user_id = id))]
    async fn remove(&self, id: UserId) -> Result<(), GatewayError> {
        let request = self.client.delete(self.user_url(id));
        self.send(request, &format!("DELETE /users/{id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_ignore_trailing_slash() {
        let gateway = HttpGateway::with_client(Client::new(), "http://localhost:9/");
        assert_eq!(gateway.base_url(), "http://localhost:9");
        assert_eq!(gateway.users_url(), "http://localhost:9/users");
        assert_eq!(gateway.user_url(7), "http://localhost:9/users/7");
    }

    #[test]
    fn update_body_flattens_payload() {
        let payload = UserPayload::new("B", "a@x.com", "555", "Acme");
        let body = serde_json::to_value(UpdateBody {
            id: 1,
            payload: &payload,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"id": 1, "name": "B", "email": "a@x.com", "phone": "555", "company": "Acme"})
        );
    }
}
