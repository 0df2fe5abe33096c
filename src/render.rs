use std::io::{self, Write};

use colored::*;
use groundchat_core::{ChatLog, ChatMessage, ChatRole};

/// Prints successive snapshots of a chat log, writing only what changed since
/// the previous snapshot.
pub struct TranscriptPrinter<W: Write> {
    out: W,
    echo_user: bool,
    shown: usize,
    tail: String,
    line_open: bool,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            echo_user: true,
            shown: 0,
            tail: String::new(),
            line_open: false,
        }
    }

    /// Skip user messages (the interactive loop already shows what was typed).
    pub fn without_user_echo(mut self) -> Self {
        self.echo_user = false;
        self
    }

    pub fn reset(&mut self) {
        self.shown = 0;
        self.tail.clear();
        self.line_open = false;
    }

    pub fn render(&mut self, log: &ChatLog) -> io::Result<()> {
        let messages = log.messages();
        if messages.len() < self.shown {
            self.finish()?;
            self.reset();
        }

        if self.shown > 0 {
            let current = &messages[self.shown - 1];
            if current.content != self.tail {
                if self.is_visible(current) {
                    match current.content.strip_prefix(self.tail.as_str()) {
                        Some(suffix) => write!(self.out, "{}", suffix)?,
                        None => self.write_message(current)?,
                    }
                }
                self.tail = current.content.clone();
            }
        }

        for message in &messages[self.shown..] {
            if self.is_visible(message) {
                self.write_message(message)?;
            }
            self.shown += 1;
            self.tail = message.content.clone();
        }

        self.out.flush()
    }

    /// Terminate the current line, if any.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn is_visible(&self, message: &ChatMessage) -> bool {
        self.echo_user || message.role != ChatRole::User
    }

    fn write_message(&mut self, message: &ChatMessage) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
        }
        let label = match message.role {
            ChatRole::User => "You:".bold().green(),
            ChatRole::Assistant => "Assistant:".bold().cyan(),
        };
        write!(self.out, "{} {}", label, message.content)?;
        self.line_open = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(printer: TranscriptPrinter<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).unwrap()
    }

    fn log(messages: &[ChatMessage]) -> ChatLog {
        ChatLog::from_messages(messages.to_vec())
    }

    #[test]
    fn test_streamed_snapshots_print_suffixes() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(Vec::new());

        let q = ChatMessage::user("spell it");
        printer.render(&log(&[q.clone(), ChatMessage::assistant("A")])).unwrap();
        printer.render(&log(&[q.clone(), ChatMessage::assistant("AB")])).unwrap();
        printer.render(&log(&[q.clone(), ChatMessage::assistant("ABC")])).unwrap();
        printer.render(&log(&[q.clone(), ChatMessage::assistant("ABC")])).unwrap();
        printer
            .render(&log(&[
                q,
                ChatMessage::assistant("ABC"),
                ChatMessage::assistant("Web Search Results:\n<div/>"),
            ]))
            .unwrap();
        printer.finish().unwrap();

        assert_eq!(
            rendered(printer),
            "You: spell it\nAssistant: ABC\nAssistant: Web Search Results:\n<div/>\n"
        );
    }

    #[test]
    fn test_replaced_message_is_reprinted() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(Vec::new()).without_user_echo();

        let q = ChatMessage::user("q");
        printer.render(&log(&[q.clone(), ChatMessage::assistant("Par")])).unwrap();
        printer
            .render(&log(&[q, ChatMessage::assistant("Error: HTTP error: reset")]))
            .unwrap();
        printer.finish().unwrap();

        assert_eq!(
            rendered(printer),
            "Assistant: Par\nAssistant: Error: HTTP error: reset\n"
        );
    }

    #[test]
    fn test_cleared_log_starts_over() {
        colored::control::set_override(false);
        let mut printer = TranscriptPrinter::new(Vec::new());

        printer
            .render(&log(&[ChatMessage::user("a"), ChatMessage::assistant("b")]))
            .unwrap();
        printer.render(&ChatLog::new()).unwrap();
        printer.render(&log(&[ChatMessage::user("c")])).unwrap();
        printer.finish().unwrap();

        assert_eq!(rendered(printer), "You: a\nAssistant: b\nYou: c\n");
    }
}
