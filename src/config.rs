use anyhow::Context;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://chatbot-backend-ayze.onrender.com";
pub const DEFAULT_CONTAINER_ID: &str = "chatbot-container";
pub const DEFAULT_SCRIPT_NAME: &str = "chatbot.js";

/// Attribute on the embedding `<script>` tag that carries the business identifier.
pub const BUSINESS_ID_ATTR: &str = "data-business-id";

/// Settings the widget is constructed with. Lives from page load to page unload.
#[derive(Debug, Clone)]
pub struct WidgetSettings {
    pub api_base_url: Url,
    /// Id of the host element the widget injects itself into.
    pub container_id: String,
    /// File name the embedding script is served under; used to find the including tag.
    pub script_name: String,
    /// `None` means requests may hang indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default api url is valid"),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            request_timeout: None,
        }
    }
}

impl WidgetSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = std::env::var("CHATBOT_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url =
            Url::parse(&api_base_url).context("failed to parse CHATBOT_API_BASE_URL")?;

        let container_id = std::env::var("CHATBOT_CONTAINER_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string());

        let script_name = std::env::var("CHATBOT_SCRIPT_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());

        let request_timeout = std::env::var("CHATBOT_REQUEST_TIMEOUT_MS")
            .ok()
            .map(|v| {
                v.parse::<u64>()
                    .context("failed to parse CHATBOT_REQUEST_TIMEOUT_MS")
            })
            .transpose()?
            .map(Duration::from_millis);

        Ok(Self {
            api_base_url,
            container_id,
            script_name,
            request_timeout,
        })
    }

    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }
}
