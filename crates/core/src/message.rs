//! The local conversation shown to the user.
use chrono::{DateTime, Local};

use crate::api::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle of a message. Only an assistant placeholder is ever `Composing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Composing,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub sources: Vec<Source>,
    pub timestamp: DateTime<Local>,
    pub state: MessageState,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), MessageState::Resolved)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text.into(), MessageState::Resolved)
    }

    fn new(role: Role, text: String, state: MessageState) -> Self {
        Self {
            role,
            text,
            sources: Vec::new(),
            timestamp: Local::now(),
            state,
        }
    }
}

/// Handle to the composing placeholder of the turn in flight.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingReply {
    index: usize,
}

/// Ordered messages of a conversation.
///
/// Holds at most one composing placeholder at a time: [`Conversation::begin_turn`]
/// refuses to start a turn until the previous [`PendingReply`] has been
/// resolved or failed.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a single assistant greeting, unless `greeting` is blank.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self::new();
        if !greeting.trim().is_empty() {
            conversation.messages.push(Message::assistant(greeting));
        }
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends the user message and a composing placeholder.
    ///
    /// Returns `None` when a turn is already in flight.
    pub fn begin_turn(&mut self, user_text: &str, composing_text: &str) -> Option<PendingReply> {
        if self.pending.is_some() {
            return None;
        }
        self.messages.push(Message::user(user_text));
        self.messages.push(Message::new(
            Role::Assistant,
            composing_text.to_string(),
            MessageState::Composing,
        ));
        let index = self.messages.len() - 1;
        self.pending = Some(index);
        Some(PendingReply { index })
    }

    /// Replaces the placeholder with the reply and its sources.
    pub fn resolve(&mut self, pending: PendingReply, text: String, sources: Vec<Source>) {
        self.settle(pending, text, sources, MessageState::Resolved);
    }

    /// Replaces the placeholder with an error description.
    pub fn fail(&mut self, pending: PendingReply, text: String) {
        self.settle(pending, text, Vec::new(), MessageState::Failed);
    }

    fn settle(
        &mut self,
        pending: PendingReply,
        text: String,
        sources: Vec<Source>,
        state: MessageState,
    ) {
        if self.pending != Some(pending.index) {
            return;
        }
        if let Some(message) = self.messages.get_mut(pending.index) {
            message.text = text;
            message.sources = sources;
            message.state = state;
            message.timestamp = Local::now();
        }
        self.pending = None;
    }

    /// Drops every message. Refused while a turn is in flight.
    pub fn clear(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.messages.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_greeting() {
        let conversation = Conversation::with_greeting("Hello!");
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::Assistant);
        assert_eq!(conversation.messages()[0].text, "Hello!");

        assert!(Conversation::with_greeting("  ").messages().is_empty());
    }

    #[test]
    fn test_begin_turn_appends_user_and_placeholder() {
        let mut conversation = Conversation::new();
        let pending = conversation.begin_turn("question", "Typing...").unwrap();

        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(conversation.messages()[0].text, "question");
        let placeholder = conversation.last().unwrap();
        assert_eq!(placeholder.role, Role::Assistant);
        assert_eq!(placeholder.state, MessageState::Composing);
        assert_eq!(placeholder.text, "Typing...");
        assert!(conversation.begin_turn("again", "Typing...").is_none());

        conversation.resolve(pending, "answer".to_string(), vec![Source::new("/a/b.txt")]);
        let reply = conversation.last().unwrap();
        assert_eq!(reply.text, "answer");
        assert_eq!(reply.state, MessageState::Resolved);
        assert_eq!(reply.sources.len(), 1);
        assert!(conversation.clear());
    }

    #[test]
    fn test_only_one_placeholder_in_flight() {
        let mut conversation = Conversation::new();
        let pending = conversation.begin_turn("first", "Typing...").unwrap();
        assert!(conversation.begin_turn("second", "Typing...").is_none());
        assert_eq!(conversation.messages().len(), 2);
        assert!(!conversation.clear());

        conversation.fail(pending, "Error: boom".to_string());
        assert_eq!(conversation.last().unwrap().state, MessageState::Failed);
        assert!(conversation.begin_turn("second", "Typing...").is_some());
        assert_eq!(conversation.messages().len(), 4);
    }
}
