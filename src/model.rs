use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

pub const DEFAULT_BRAND_COLOR: &str = "#4f46e5";
pub const DEFAULT_AGENT_NAME: &str = "Assistant";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hi there! How can I help you today?";
pub const TYPING_TEXT: &str = "Typing...";
/// Shown in place of an answer whenever the chat call fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

static CSS_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|(rgb|rgba|hsl|hsla)\(\s*[0-9.,%\s/deg]+\)|[a-zA-Z]{3,20})$",
    )
    .expect("color pattern compiles")
});

/// Per-business configuration served by `GET /config/{businessId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default)]
    pub brand_color: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

/// Configuration with every fallback applied. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub brand_color: String,
    pub agent_name: String,
    pub welcome_message: String,
}

impl Theme {
    pub fn from_config(config: &WidgetConfig) -> Self {
        let brand_color = non_blank(config.brand_color.as_deref())
            .filter(|c| is_safe_css_color(c))
            .unwrap_or(DEFAULT_BRAND_COLOR);
        Self {
            brand_color: brand_color.to_string(),
            agent_name: non_blank(config.agent_name.as_deref())
                .unwrap_or(DEFAULT_AGENT_NAME)
                .to_string(),
            welcome_message: non_blank(config.welcome_message.as_deref())
                .unwrap_or(DEFAULT_WELCOME_MESSAGE)
                .to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// True when `value` can be dropped into a CSS declaration without escaping it.
pub fn is_safe_css_color(value: &str) -> bool {
    CSS_COLOR.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn css_class(self) -> &'static str {
        match self {
            Sender::User => "user-message",
            Sender::Bot => "bot-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    /// Typing placeholders are transient and get removed when their request resolves.
    pub transient: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, false)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, false)
    }

    pub fn typing() -> Self {
        Self::new(TYPING_TEXT, Sender::Bot, true)
    }

    fn new(text: impl Into<String>, sender: Sender, transient: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            transient,
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(rename = "businessId")]
    pub business_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}
