//! Chat messages and per-agent conversation logs.

use openai::Role;

/// A single (role, content) entry in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// An ordered, append-only message history owned by one agent.
///
/// Invariant: at most one system message, and if present it is the first
/// entry. The whole log is replayed to the completion endpoint on every
/// call, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the system message as the first log entry.
    ///
    /// Only the first non-empty prompt takes effect; later calls are ignored
    /// so an agent's persona cannot be swapped mid-conversation.
    pub fn set_system(&mut self, prompt: &str) {
        if prompt.is_empty() {
            return;
        }
        if self.has_system() {
            tracing::warn!("system message already set, ignoring replacement");
            return;
        }
        self.messages.insert(0, ChatMessage::system(prompt));
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Whether a system message has been installed.
    pub fn has_system(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.role == Role::System)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Render the full log, in order, into the wire message format.
    pub fn to_wire(&self) -> Vec<openai::Message> {
        self.messages
            .iter()
            .map(|m| openai::Message {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}
