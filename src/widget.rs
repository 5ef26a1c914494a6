use crate::bootstrap::{self, BootstrapError, Embed};
use crate::client::{ApiError, ChatApi};
use crate::config::WidgetSettings;
use crate::conversation::Conversation;
use crate::model::{ChatRequest, Message, Theme};
use crate::page::{HostPage, PageError};
use crate::ui::{self, Action, BuildError, HANDLERS, PanelState, Trigger, WidgetView};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("failed to load chatbot configuration: {0}")]
    Config(#[source] ApiError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Page(#[from] PageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyPress(String),
}

/// A DOM event aimed at one of the widget's elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetEvent {
    pub target: String,
    pub kind: EventKind,
}

impl WidgetEvent {
    pub fn click(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: EventKind::Click,
        }
    }

    pub fn key_press(target: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind: EventKind::KeyPress(key.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No handler is bound for this target and event.
    Ignored,
    Toggled(PanelState),
    /// Blank input; nothing appended, nothing sent.
    Rejected,
    Answered(Message),
}

/// A mounted widget: configuration loaded, markup injected, handlers live.
pub struct ChatWidget {
    page: HostPage,
    embed: Embed,
    theme: Theme,
    view: WidgetView,
    panel: PanelState,
    conversation: Conversation,
    api: Arc<dyn ChatApi>,
}

impl ChatWidget {
    /// Bootstrap, load config, build the UI and show the welcome message.
    ///
    /// On any error the page is left exactly as it was. A missing business id
    /// fails before any request is made.
    pub async fn mount(
        page: &HostPage,
        settings: &WidgetSettings,
        api: Arc<dyn ChatApi>,
    ) -> Result<Self, WidgetError> {
        let embed = bootstrap::locate_embed(page, settings).inspect_err(|err| {
            error!(error = %err, "chatbot bootstrap failed; widget not shown");
        })?;

        let config = api
            .fetch_config(&embed.business_id)
            .await
            .map_err(WidgetError::Config)
            .inspect_err(|err| {
                error!(
                    business_id = %embed.business_id,
                    error = %err,
                    "failed to load chatbot configuration"
                );
            })?;
        let theme = Theme::from_config(&config);

        let view = ui::build(page, &theme, settings).inspect_err(|err| {
            error!(
                business_id = %embed.business_id,
                error = %err,
                "failed to build chatbot ui"
            );
        })?;

        let mut conversation = Conversation::new(view.messages.clone(), view.input.clone());
        conversation.append(Message::bot(theme.welcome_message.clone()))?;
        info!(
            business_id = %embed.business_id,
            agent = %theme.agent_name,
            "chatbot widget mounted"
        );

        Ok(Self {
            page: page.clone(),
            embed,
            theme,
            view,
            panel: PanelState::Closed,
            conversation,
            api,
        })
    }

    pub fn page(&self) -> &HostPage {
        &self.page
    }

    pub fn embed(&self) -> &Embed {
        &self.embed
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Types into the input box.
    pub fn set_input(&self, text: &str) {
        self.view.set_input_value(text);
    }

    pub fn input(&self) -> String {
        self.view.input_value()
    }

    /// Dispatches an event to whichever of the bound handlers matches it.
    pub async fn handle(&mut self, event: &WidgetEvent) -> Result<EventOutcome, WidgetError> {
        let Some(action) = bound_action(event) else {
            return Ok(EventOutcome::Ignored);
        };
        debug!(element = %event.target, ?action, "widget event");
        match action {
            Action::TogglePanel => Ok(EventOutcome::Toggled(self.toggle())),
            Action::Submit => self.send().await,
        }
    }

    pub fn toggle(&mut self) -> PanelState {
        self.panel = self.panel.toggled();
        self.view.render_panel(self.panel);
        self.panel
    }

    /// Submits the current input and waits for the reply.
    ///
    /// Awaiting here serializes submissions made through one widget.
    pub async fn send(&mut self) -> Result<EventOutcome, WidgetError> {
        let raw = self.view.input_value();
        let Some(pending) = self.conversation.submit(&raw)? else {
            return Ok(EventOutcome::Rejected);
        };
        let request = ChatRequest {
            question: pending.question.clone(),
            business_id: self.embed.business_id.clone(),
        };
        debug!(
            business_id = %request.business_id,
            pending = self.conversation.pending_count(),
            "question submitted"
        );
        let result = self.api.ask(&request).await;
        let message = self.conversation.resolve(&pending, result)?;
        Ok(EventOutcome::Answered(message.clone()))
    }

    /// Convenience for typing a question and clicking send.
    pub async fn ask(&mut self, question: &str) -> Result<EventOutcome, WidgetError> {
        self.set_input(question);
        self.handle(&WidgetEvent::click(ui::SEND_ID)).await
    }
}

fn bound_action(event: &WidgetEvent) -> Option<Action> {
    HANDLERS
        .iter()
        .find(|h| {
            h.target == event.target
                && match (&h.trigger, &event.kind) {
                    (Trigger::Click, EventKind::Click) => true,
                    (Trigger::Key(key), EventKind::KeyPress(pressed)) => {
                        *key == pressed.as_str()
                    }
                    _ => false,
                }
        })
        .map(|h| h.action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChatReply, DEFAULT_WELCOME_MESSAGE, FALLBACK_REPLY, Sender, WidgetConfig,
    };
    use crate::page;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const HOST: &str = r#"<html><head><script src="/static/chatbot.js" data-business-id="joes-pizza"></script></head><body><h1>Joe's</h1><div id="chatbot-container"></div></body></html>"#;

    /// Records every call and answers from canned results.
    #[derive(Default)]
    struct FakeApi {
        config: Option<WidgetConfig>,
        answer: Option<String>,
        calls: Mutex<Vec<String>>,
        questions: Mutex<Vec<ChatRequest>>,
    }

    impl FakeApi {
        fn answering(answer: &str) -> Self {
            Self {
                config: Some(WidgetConfig {
                    brand_color: Some("#123456".into()),
                    agent_name: Some("Ava".into()),
                    welcome_message: Some("Welcome to Joe's!".into()),
                }),
                answer: Some(answer.to_string()),
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn fetch_config(&self, business_id: &str) -> Result<WidgetConfig, ApiError> {
            self.calls.lock().unwrap().push(format!("config:{business_id}"));
            self.config
                .clone()
                .ok_or(ApiError::Status(reqwest::StatusCode::NOT_FOUND))
        }

        async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
            self.calls.lock().unwrap().push("chat".to_string());
            self.questions.lock().unwrap().push(request.clone());
            self.answer
                .clone()
                .map(|answer| ChatReply { answer })
                .ok_or(ApiError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }
    }

    async fn mounted(api: Arc<FakeApi>) -> ChatWidget {
        let page = HostPage::parse(HOST);
        ChatWidget::mount(&page, &WidgetSettings::default(), api)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn mount_shows_welcome_first() {
        let widget = mounted(Arc::new(FakeApi::answering("ok"))).await;
        let messages = widget.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Welcome to Joe's!");
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(widget.embed().business_id, "joes-pizza");
        assert_eq!(widget.panel(), PanelState::Closed);
    }

    #[tokio::test]
    async fn welcome_falls_back_when_absent() {
        let api = Arc::new(FakeApi {
            config: Some(WidgetConfig::default()),
            ..Default::default()
        });
        let widget = mounted(api).await;
        assert_eq!(widget.messages()[0].text, DEFAULT_WELCOME_MESSAGE);
        let log = widget.page().element_by_id(ui::MESSAGES_ID).unwrap();
        assert_eq!(log.text_contents(), DEFAULT_WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn missing_business_id_touches_nothing() {
        let page = HostPage::parse(
            r#"<html><head><script src="/chatbot.js"></script></head><body><div id="chatbot-container"></div></body></html>"#,
        );
        let before = page.to_html();
        let api = Arc::new(FakeApi::answering("ok"));
        let err = ChatWidget::mount(&page, &WidgetSettings::default(), api.clone())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            WidgetError::Bootstrap(BootstrapError::MissingBusinessId)
        ));
        assert_eq!(page.to_html(), before);
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn config_failure_touches_nothing() {
        let page = HostPage::parse(HOST);
        let before = page.to_html();
        let api = Arc::new(FakeApi::default());
        let err = ChatWidget::mount(&page, &WidgetSettings::default(), api.clone())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WidgetError::Config(ApiError::Status(_))));
        assert_eq!(page.to_html(), before);
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_container_after_config_touches_nothing() {
        let page = HostPage::parse(
            r#"<html><head><script src="/chatbot.js" data-business-id="b"></script></head><body></body></html>"#,
        );
        let before = page.to_html();
        let err = ChatWidget::mount(
            &page,
            &WidgetSettings::default(),
            Arc::new(FakeApi::answering("ok")),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            WidgetError::Build(BuildError::MissingContainer(_))
        ));
        assert_eq!(page.to_html(), before);
    }

    #[tokio::test]
    async fn blank_submission_sends_nothing() {
        let api = Arc::new(FakeApi::answering("ok"));
        let mut widget = mounted(api.clone()).await;
        let outcome = widget.ask("   ").await.unwrap();
        assert_eq!(outcome, EventOutcome::Rejected);
        assert_eq!(widget.messages().len(), 1);
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn question_is_answered_and_placeholder_removed() {
        let api = Arc::new(FakeApi::answering("9–5"));
        let mut widget = mounted(api.clone()).await;

        let outcome = widget.ask("What are your hours?").await.unwrap();
        let EventOutcome::Answered(reply) = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(reply.text, "9–5");

        let texts: Vec<_> = widget.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Welcome to Joe's!", "What are your hours?", "9–5"]);
        assert!(widget.messages().iter().all(|m| !m.transient));
        assert!(widget.page().select_all(".typing-indicator").unwrap().is_empty());
        assert_eq!(widget.input(), "");

        let sent = api.questions.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![ChatRequest {
                question: "What are your hours?".into(),
                business_id: "joes-pizza".into(),
            }]
        );
    }

    #[tokio::test]
    async fn enter_key_submits_other_keys_do_not() {
        let api = Arc::new(FakeApi::answering("sure"));
        let mut widget = mounted(api.clone()).await;
        widget.set_input("hello");

        let outcome = widget
            .handle(&WidgetEvent::key_press(ui::INPUT_ID, "a"))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);

        let outcome = widget
            .handle(&WidgetEvent::key_press(ui::INPUT_ID, "Enter"))
            .await
            .unwrap();
        assert!(matches!(outcome, EventOutcome::Answered(m) if m.text == "sure"));
    }

    #[tokio::test]
    async fn chat_failure_shows_fallback() {
        let api = Arc::new(FakeApi {
            answer: None,
            ..FakeApi::answering("unused")
        });
        let mut widget = mounted(api).await;
        widget.ask("hello").await.unwrap();
        let last = widget.messages().last().unwrap();
        assert_eq!(last.text, FALLBACK_REPLY);
        assert!(widget.page().select_all(".typing-indicator").unwrap().is_empty());

        // Still usable afterwards.
        widget.ask("again").await.unwrap();
        assert_eq!(widget.messages().len(), 5);
    }

    #[tokio::test]
    async fn toggle_parity() {
        let mut widget = mounted(Arc::new(FakeApi::answering("ok"))).await;
        let window = widget.page().element_by_id(ui::WINDOW_ID).unwrap();
        let initial = widget.panel();

        for clicks in 1..=6 {
            let target = if clicks % 3 == 0 { ui::CLOSE_ID } else { ui::BUBBLE_ID };
            widget.handle(&WidgetEvent::click(target)).await.unwrap();
            let expect_flipped = clicks % 2 == 1;
            assert_eq!(widget.panel() != initial, expect_flipped);
            assert_eq!(
                page::has_class(&window, ui::OPEN_CLASS),
                widget.panel().is_open()
            );
        }
    }

    #[tokio::test]
    async fn unbound_targets_are_ignored() {
        let mut widget = mounted(Arc::new(FakeApi::answering("ok"))).await;
        let outcome = widget
            .handle(&WidgetEvent::click(ui::MESSAGES_ID))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(widget.panel(), PanelState::Closed);
    }
}
