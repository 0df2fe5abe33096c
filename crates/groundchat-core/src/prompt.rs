//! Flattens a conversation into the single text prompt sent upstream.

use std::fmt;

use crate::state::ChatMessage;

const HISTORY_HEADER: &str = "Conversation so far:";

/// Speaker label used on each history line of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerLabel {
    User,
    Assistant,
    Other(String),
}

impl SpeakerLabel {
    /// Map a free-text role onto a label. Unknown roles pass through as-is.
    pub fn from_role(role: &str) -> Self {
        let lower = role.to_lowercase();
        if lower.starts_with("user") || lower.starts_with("you") {
            SpeakerLabel::User
        } else if lower.starts_with("assistant") || lower.starts_with("ai") {
            SpeakerLabel::Assistant
        } else {
            SpeakerLabel::Other(role.to_string())
        }
    }
}

impl fmt::Display for SpeakerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerLabel::User => f.write_str("User"),
            SpeakerLabel::Assistant => f.write_str("Assistant"),
            SpeakerLabel::Other(role) => f.write_str(role),
        }
    }
}

/// One prior turn of a conversation, as seen by the prompt builder.
pub trait PromptTurn {
    fn role(&self) -> &str;
    fn content(&self) -> &str;
}

impl PromptTurn for ChatMessage {
    fn role(&self) -> &str {
        self.role.as_str()
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// Legacy `(role, text)` pairs.
impl<R: AsRef<str>, C: AsRef<str>> PromptTurn for (R, C) {
    fn role(&self) -> &str {
        self.0.as_ref()
    }

    fn content(&self) -> &str {
        self.1.as_ref()
    }
}

pub fn build_prompt<T: PromptTurn>(question: &str, history: &[T]) -> String {
    if history.is_empty() {
        return question.to_string();
    }

    let mut lines = Vec::with_capacity(history.len() + 2);
    lines.push(HISTORY_HEADER.to_string());
    for turn in history {
        let label = SpeakerLabel::from_role(turn.role());
        lines.push(format!("{}: {}", label, turn.content()));
    }
    lines.push(format!("User: {}", question));
    lines.join("\n")
}
