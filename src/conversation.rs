use crate::client::ApiError;
use crate::model::{ChatReply, FALLBACK_REPLY, Message};
use crate::page::{self, PageError};
use kuchiki::NodeRef;
use tracing::warn;
use uuid::Uuid;

/// A question that has been shown to the user and is waiting on the backend.
///
/// Carries the id of its own typing placeholder so the reply lands in the
/// right place even when several questions are in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub question: String,
    pub placeholder_id: Uuid,
}

/// Message log plus the input it reads from.
pub struct Conversation {
    log: NodeRef,
    input: NodeRef,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(log: NodeRef, input: NodeRef) -> Self {
        Self {
            log,
            input,
            messages: Vec::new(),
        }
    }

    /// Visible messages in display order, placeholders included.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.transient).count()
    }

    pub fn append(&mut self, message: Message) -> Result<&Message, PageError> {
        let node = render_message(&message)?;
        self.log.append(node);
        let index = self.messages.len();
        self.messages.push(message);
        Ok(&self.messages[index])
    }

    /// Shows the question and a typing placeholder, clearing the input.
    ///
    /// Blank input is rejected: nothing is appended and `None` is returned.
    pub fn submit(&mut self, raw: &str) -> Result<Option<PendingQuestion>, PageError> {
        let question = raw.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let question = question.to_string();
        self.append(Message::user(question.clone()))?;
        page::set_attr(&self.input, "value", "");
        let placeholder_id = self.append(Message::typing())?.id;
        Ok(Some(PendingQuestion {
            question,
            placeholder_id,
        }))
    }

    /// Removes the pending question's placeholder and appends the answer, or
    /// the fallback apology when the request failed.
    pub fn resolve(
        &mut self,
        pending: &PendingQuestion,
        result: Result<ChatReply, ApiError>,
    ) -> Result<&Message, PageError> {
        self.remove_placeholder(pending.placeholder_id);
        let text = match result {
            Ok(reply) => reply.answer,
            Err(err) => {
                warn!(error = %err, "chat request failed; showing fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };
        self.append(Message::bot(text))
    }

    fn remove_placeholder(&mut self, id: Uuid) {
        let id_str = id.to_string();
        if let Some(node) = self
            .log
            .children()
            .find(|n| page::attr(n, "data-message-id").as_deref() == Some(id_str.as_str()))
        {
            node.detach();
        }
        self.messages.retain(|m| !(m.transient && m.id == id));
    }
}

fn render_message(message: &Message) -> Result<NodeRef, PageError> {
    let node = page::parse_element("<div class=\"message\"></div>")?;
    let mut class = format!("message {}", message.sender.css_class());
    if message.transient {
        class.push_str(" typing-indicator");
    }
    page::set_attr(&node, "class", &class);
    page::set_attr(&node, "data-message-id", &message.id.to_string());
    page::set_text(&node, &message.text);
    Ok(node)
}
