use crate::config::WidgetSettings;
use crate::model::{ChatReply, ChatRequest, WidgetConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("base url {0} cannot carry path segments")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Remote backend the widget talks to.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /config/{businessId}`.
    async fn fetch_config(&self, business_id: &str) -> Result<WidgetConfig, ApiError>;
    /// `POST /chat`.
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;
}

/// reqwest-backed client. Single attempt per call; no retries, no caching.
#[derive(Clone)]
pub struct HttpChatApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpChatApi {
    pub fn new(settings: &WidgetSettings) -> Result<Self, ApiError> {
        if settings.api_base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(settings.api_base_url.to_string()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Transport)?;
        Ok(Self {
            base_url: settings.api_base_url.clone(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status(status));
    }
    let bytes = resp.bytes().await.map_err(ApiError::Transport)?;
    serde_json::from_slice(&bytes).map_err(ApiError::Decode)
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_config(&self, business_id: &str) -> Result<WidgetConfig, ApiError> {
        let url = self.endpoint(&["config", business_id])?;
        debug!(%url, "fetching widget config");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        read_json(resp).await
    }

    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let url = self.endpoint(&["chat"])?;
        debug!(%url, business_id = %request.business_id, "sending question");
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        read_json(resp).await
    }
}
