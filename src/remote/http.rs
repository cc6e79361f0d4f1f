//! HTTP Authority
//!
//! JSON client for the board server's `/todos` routes.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::RemoteAuthority;
use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::models::{Item, ItemId, ItemPatch, NewItem, RepositionBatch};

/// Error body returned by the server
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpAuthority {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAuthority {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.api_url.clone(), config.token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> BoardResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BoardError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BoardResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BoardError::Network(format!("Response error: {}", e)))
    }
}

/// Map a failed response to a board error, preferring the server's message
fn error_for_status(status: StatusCode, body: &str) -> BoardError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BoardError::Unauthorized(message),
        StatusCode::NOT_FOUND => BoardError::NotFound(message),
        StatusCode::BAD_REQUEST => BoardError::InvalidInput(message),
        _ => BoardError::Network(message),
    }
}

fn todos_path(project_id: Option<u32>) -> String {
    match project_id {
        Some(id) => format!("/todos?projectId={}", id),
        None => "/todos".to_string(),
    }
}

#[async_trait(?Send)]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_items(&self, project_id: Option<u32>) -> BoardResult<Vec<Item>> {
        let request = self.client.get(self.url(&todos_path(project_id)));
        self.send_json(request).await
    }

    async fn create_item(&self, item: &NewItem) -> BoardResult<Item> {
        let request = self.client.post(self.url("/todos")).json(item);
        self.send_json(request).await
    }

    async fn update_item(&self, id: ItemId, patch: &ItemPatch) -> BoardResult<Item> {
        let request = self.client.put(self.url(&format!("/todos/{}", id))).json(patch);
        self.send_json(request).await
    }

    async fn delete_item(&self, id: ItemId) -> BoardResult<()> {
        let request = self.client.delete(self.url(&format!("/todos/{}", id)));
        self.send(request).await.map(|_| ())
    }

    async fn reposition(&self, batch: &RepositionBatch) -> BoardResult<()> {
        let request = self.client.patch(self.url("/todos/reorder")).json(batch);
        self.send(request).await.map(|_| ())
    }

    async fn toggle_important(&self, id: ItemId) -> BoardResult<Item> {
        let request = self.client.patch(self.url(&format!("/todos/{}/important", id)));
        self.send_json(request).await
    }
}
