use std::io::{self, Write};

use anyhow::Result;
use colored::*;
use futures_util::StreamExt;
use groundchat_core::{ChatLog, ConversationUpdater, Settings, Submission, Temperature};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::TranscriptPrinter;

/// Per-session toggles, the terminal counterpart of the checkboxes and sliders
/// a graphical front end would offer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub web_search: bool,
    pub model_id: String,
    pub temperature: Temperature,
    pub stream: bool,
}

impl SessionOptions {
    pub fn submission(&self, question: &str) -> Submission {
        Submission {
            question: question.to_string(),
            web_search: self.web_search,
            model_id: self.model_id.clone(),
            temperature: self.temperature,
            stream: self.stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    WebSearch(bool),
    Stream(bool),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let toggle = |arg: Option<&str>| match arg {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    };

    match name {
        "web" => toggle(arg)
            .map(ChatCommand::WebSearch)
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /web on|off".to_string())),
        "stream" => toggle(arg)
            .map(ChatCommand::Stream)
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /stream on|off".to_string())),
        "clear" => ChatCommand::Clear,
        "help" => ChatCommand::Help,
        "quit" | "exit" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("unknown command: /{}", other)),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /web on|off     enhance answers with Google Search");
    println!("  /stream on|off  stream answers as they are generated");
    println!("  /clear          start a new conversation");
    println!("  /quit           leave");
}

fn on_off(flag: bool) -> ColoredString {
    if flag {
        "on".green()
    } else {
        "off".dimmed()
    }
}

fn print_status(options: &SessionOptions) {
    println!(
        "{} {}  {} {}  {} {}  {} {}",
        "model".dimmed(),
        options.model_id.magenta(),
        "temperature".dimmed(),
        options.temperature,
        "web search".dimmed(),
        on_off(options.web_search),
        "stream".dimmed(),
        on_off(options.stream),
    );
}

/// Feed one submission through the updater, rendering every snapshot.
pub async fn submit<W: Write>(
    updater: &ConversationUpdater,
    printer: &mut TranscriptPrinter<W>,
    submission: Submission,
    log: Option<ChatLog>,
) -> Result<ChatLog> {
    let fallback = log.clone().unwrap_or_default();
    let mut snapshots = updater.submit(submission, log);

    let mut latest = None;
    while let Some(snapshot) = snapshots.next().await {
        printer.render(&snapshot)?;
        latest = Some(snapshot);
    }
    printer.finish()?;

    Ok(latest.unwrap_or(fallback))
}

pub async fn run(settings: &Settings, updater: ConversationUpdater, mut options: SessionOptions) -> Result<()> {
    println!("\n{}", format!("💬 {}", settings.model_name).bold().blue());
    println!("{}", "=".repeat(40).dimmed());
    print_status(&options);
    println!("{}\n", "Type a question, or /help for commands.".dimmed());

    let mut printer = TranscriptPrinter::new(io::stdout()).without_user_echo();
    let mut log: Option<ChatLog> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".bold().green());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_line(&line) {
            ChatCommand::Ask(question) if question.is_empty() => continue,
            ChatCommand::Ask(question) => {
                let submission = options.submission(&question);
                log = Some(submit(&updater, &mut printer, submission, log.take()).await?);
                println!();
            }
            ChatCommand::WebSearch(flag) => {
                options.web_search = flag;
                print_status(&options);
            }
            ChatCommand::Stream(flag) => {
                options.stream = flag;
                print_status(&options);
            }
            ChatCommand::Clear => {
                log = None;
                printer.reset();
                println!("{}", "Conversation cleared.".dimmed());
            }
            ChatCommand::Help => print_help(),
            ChatCommand::Quit => break,
            ChatCommand::Invalid(message) => println!("{}", message.red()),
        }
    }

    tracing::debug!(turns = log.as_ref().map_or(0, |l| l.len()), "chat session ended");
    Ok(())
}
