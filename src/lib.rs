pub mod bootstrap;
pub mod client;
pub mod config;
pub mod conversation;
pub mod embed;
pub mod model;
pub mod page;
pub mod ui;
pub mod widget;

pub use client::{ApiError, ChatApi, HttpChatApi};
pub use config::WidgetSettings;
pub use model::{Message, Sender, Theme, WidgetConfig};
pub use page::HostPage;
pub use widget::{ChatWidget, EventOutcome, WidgetError, WidgetEvent};
