//! UI-agnostic conversation state
//!
//! The chat log is an owned value: every update consumes a log and hands back
//! the next one, so a front end only ever renders snapshots it was given.

use serde::{Deserialize, Serialize};

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Ordered conversation log with a version counter bumped on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    #[serde(default)]
    version: u64,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            version: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.version += 1;
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// Replace the trailing assistant message, or append one if the log does
    /// not end with an assistant message.
    pub fn merge_assistant(&mut self, content: impl Into<String>) {
        if let Some(last) = self.messages.last_mut().filter(|m| m.is_assistant()) {
            last.content = content.into();
            self.version += 1;
            return;
        }
        self.push_assistant(content);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_appends_after_user() {
        let mut log = ChatLog::new();
        log.push_user("hi");
        log.merge_assistant("A");
        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(&ChatMessage::assistant("A")));
    }

    #[test]
    fn test_merge_replaces_trailing_assistant() {
        let mut log = ChatLog::new();
        log.push_user("hi");
        log.merge_assistant("A");
        log.merge_assistant("AB");
        log.merge_assistant("ABC");
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[1].content, "ABC");
    }

    #[test]
    fn test_every_mutation_bumps_version() {
        let mut log = ChatLog::new();
        assert_eq!(log.version(), 0);
        log.push_user("hi");
        log.merge_assistant("A");
        log.merge_assistant("AB");
        assert_eq!(log.version(), 3);
        log.clear();
        assert_eq!(log.version(), 4);
        assert!(log.is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
