use crate::config::WidgetSettings;
use crate::model::Theme;
use crate::page::{self, HostPage, PageError};
use kuchiki::NodeRef;
use thiserror::Error;

pub const BUBBLE_ID: &str = "chat-bubble";
pub const WINDOW_ID: &str = "chat-window";
pub const AGENT_NAME_ID: &str = "chat-agent-name";
pub const CLOSE_ID: &str = "close-btn";
pub const MESSAGES_ID: &str = "chat-messages";
pub const INPUT_ID: &str = "chat-input";
pub const SEND_ID: &str = "send-btn";

/// Class on `#chat-window` mirroring [`PanelState::Open`].
pub const OPEN_CLASS: &str = "open";

const WIDGET_MARKUP: &str = r#"<div id="chat-bubble" role="button" aria-label="Open chat">&#128172;</div>
<div id="chat-window" aria-live="polite">
  <div id="chat-header"><span id="chat-agent-name"></span><button id="close-btn" type="button" aria-label="Close chat">&times;</button></div>
  <div id="chat-messages"></div>
  <div id="chat-input-container"><input id="chat-input" type="text" placeholder="Type a message..." autocomplete="off" value=""><button id="send-btn" type="button">Send</button></div>
</div>"#;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("host container #{0} not found")]
    MissingContainer(String),
    #[error("widget markup incomplete: #{0} missing")]
    Markup(&'static str),
    #[error(transparent)]
    Page(#[from] PageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

impl PanelState {
    pub fn toggled(self) -> Self {
        match self {
            PanelState::Closed => PanelState::Open,
            PanelState::Open => PanelState::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        self == PanelState::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TogglePanel,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    Key(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Handler {
    pub target: &'static str,
    pub trigger: Trigger,
    pub action: Action,
}

/// The four interaction handlers the widget binds.
pub const HANDLERS: [Handler; 4] = [
    Handler {
        target: BUBBLE_ID,
        trigger: Trigger::Click,
        action: Action::TogglePanel,
    },
    Handler {
        target: CLOSE_ID,
        trigger: Trigger::Click,
        action: Action::TogglePanel,
    },
    Handler {
        target: SEND_ID,
        trigger: Trigger::Click,
        action: Action::Submit,
    },
    Handler {
        target: INPUT_ID,
        trigger: Trigger::Key("Enter"),
        action: Action::Submit,
    },
];

/// Handles to the injected nodes the widget keeps mutating after build.
#[derive(Clone, Debug)]
pub struct WidgetView {
    pub(crate) window: NodeRef,
    pub(crate) messages: NodeRef,
    pub(crate) input: NodeRef,
}

impl WidgetView {
    pub fn render_panel(&self, state: PanelState) {
        page::toggle_class(&self.window, OPEN_CLASS, state.is_open());
    }

    pub fn input_value(&self) -> String {
        page::attr(&self.input, "value").unwrap_or_default()
    }

    pub fn set_input_value(&self, value: &str) {
        page::set_attr(&self.input, "value", value);
    }
}

pub fn stylesheet(theme: &Theme) -> String {
    format!(
        r#"
:root {{ --brand-color: {color}; }}
#chat-bubble {{ position: fixed; bottom: 20px; right: 20px; width: 60px; height: 60px; border-radius: 50%; display: flex; align-items: center; justify-content: center; color: #fff; font-size: 28px; cursor: pointer; box-shadow: 0 4px 12px rgba(0,0,0,0.2); z-index: 9999; }}
#chat-window {{ position: fixed; bottom: 90px; right: 20px; width: 350px; max-height: 500px; display: none; flex-direction: column; background: #fff; border-radius: 12px; box-shadow: 0 8px 24px rgba(0,0,0,0.2); overflow: hidden; z-index: 9999; font-family: sans-serif; }}
#chat-window.open {{ display: flex; }}
#chat-header {{ color: #fff; padding: 12px 16px; display: flex; justify-content: space-between; align-items: center; font-weight: 600; }}
#close-btn {{ background: none; border: none; color: #fff; font-size: 20px; cursor: pointer; }}
#chat-messages {{ flex: 1; padding: 12px; overflow-y: auto; display: flex; flex-direction: column; gap: 8px; }}
.message {{ max-width: 80%; padding: 8px 12px; border-radius: 12px; line-height: 1.4; word-wrap: break-word; }}
.user-message {{ align-self: flex-end; color: #fff; }}
.bot-message {{ align-self: flex-start; background: #f1f1f1; color: #333; }}
.typing-indicator {{ font-style: italic; color: #888; }}
#chat-input-container {{ display: flex; border-top: 1px solid #eee; }}
#chat-input {{ flex: 1; border: 1px solid transparent; padding: 12px; outline: none; }}
#send-btn {{ border: none; color: #fff; padding: 0 16px; cursor: pointer; }}
#chat-bubble, #chat-header, #send-btn {{ background-color: var(--brand-color); }}
.user-message {{ background-color: var(--brand-color); }}
#chat-input:focus {{ border-color: var(--brand-color); }}
"#,
        color = theme.brand_color
    )
}

/// Injects the style block and widget markup into the page.
///
/// The host container is checked before anything is written, so a missing
/// container leaves the page untouched. Not guarded against repeat calls.
pub fn build(
    page: &HostPage,
    theme: &Theme,
    settings: &WidgetSettings,
) -> Result<WidgetView, BuildError> {
    let container = page
        .element_by_id(&settings.container_id)
        .ok_or_else(|| BuildError::MissingContainer(settings.container_id.clone()))?;

    let widget_nodes = page::parse_fragment(WIDGET_MARKUP)?;
    let style = page::parse_element("<style data-chatbot-widget=\"\"></style>")?;
    page::set_text(&style, &stylesheet(theme));

    // Resolve handles before anything is attached so a bad template fails clean.
    let find = |id: &'static str| {
        widget_nodes
            .iter()
            .find_map(|root| {
                root.inclusive_descendants()
                    .find(|n| page::attr(n, "id").as_deref() == Some(id))
            })
            .ok_or(BuildError::Markup(id))
    };
    find(BUBBLE_ID)?;
    let window = find(WINDOW_ID)?;
    let agent_name = find(AGENT_NAME_ID)?;
    let messages = find(MESSAGES_ID)?;
    let input = find(INPUT_ID)?;
    page::set_text(&agent_name, &theme.agent_name);

    page::clear_children(&container);
    match page.head() {
        Some(head) => head.append(style.clone()),
        None => container.append(style.clone()),
    }
    for node in widget_nodes {
        container.append(node);
    }

    let view = WidgetView {
        window,
        messages,
        input,
    };
    view.render_panel(PanelState::Closed);
    Ok(view)
}
