use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use groundchat_core::{
    is_known_model, Config, ConversationUpdater, GeminiConnector, ModelOption, SearchAssistant, Settings,
    Temperature,
};

mod chat;
mod render;

use chat::SessionOptions;
use render::TranscriptPrinter;

#[derive(Parser)]
#[command(name = "groundchat")]
#[command(about = "Chat with Gemini, optionally grounded in Google Search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Interactive chat (default)
    Chat {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the offered models
    Models {
        /// Save this model as the default in the config file
        #[arg(long, value_name = "MODEL")]
        set_default: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct QueryArgs {
    /// Enhance answers with Google Search
    #[arg(short, long)]
    web_search: bool,
    /// Model to use (defaults to MODEL_ID or gemini-2.5-flash)
    #[arg(short, long)]
    model: Option<String>,
    /// Sampling temperature between 0.0 and 2.0
    #[arg(short, long, value_parser = parse_temperature)]
    temperature: Option<Temperature>,
    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    no_stream: bool,
}

impl QueryArgs {
    fn session_options(&self, settings: &Settings) -> SessionOptions {
        SessionOptions {
            web_search: self.web_search,
            model_id: self.model.clone().unwrap_or_else(|| settings.model_id.clone()),
            temperature: self.temperature.unwrap_or(settings.temperature),
            stream: !self.no_stream,
        }
    }
}

fn parse_temperature(raw: &str) -> std::result::Result<Temperature, String> {
    Temperature::parse(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring config file");
        Config::new()
    });
    let settings = Settings::resolve(config)?;
    tracing::debug!(model = %settings.model_id, base_url = %settings.base_url, "settings resolved");

    let command = cli.command.unwrap_or(Commands::Chat {
        query: QueryArgs::default(),
    });

    match command {
        Commands::Ask { question, query } => {
            ask_once(&settings, &question, query.session_options(&settings)).await?
        }
        Commands::Chat { query } => {
            chat::run(&settings, build_updater(&settings), query.session_options(&settings)).await?
        }
        Commands::Models { set_default: Some(model) } => set_default_model(&model)?,
        Commands::Models { set_default: None } => list_models(&settings),
    }

    Ok(())
}

fn build_updater(settings: &Settings) -> ConversationUpdater {
    let connector = Arc::new(GeminiConnector::from_settings(settings));
    ConversationUpdater::new(SearchAssistant::new(connector), settings.system_instruction.clone())
}

async fn ask_once(settings: &Settings, question: &str, options: SessionOptions) -> Result<()> {
    if settings.api_key.is_none() {
        tracing::warn!("no API key found in GEMINI_API_KEY or GOOGLE_API_KEY");
    }

    let updater = build_updater(settings);
    let mut printer = TranscriptPrinter::new(io::stdout());
    chat::submit(&updater, &mut printer, options.submission(question), None).await?;
    Ok(())
}

fn set_default_model(model: &str) -> Result<()> {
    if !is_known_model(model) {
        println!("{} {} is not in the offered list", "Note:".yellow(), model);
    }

    Config::save_default_model(model)?;
    println!("{} Default model set to {}", "✓".green(), model.bold());
    if std::env::var("MODEL_ID").is_ok_and(|v| !v.trim().is_empty()) {
        println!("{}", "MODEL_ID is set in the environment and still takes precedence.".dimmed());
    }
    Ok(())
}

fn list_models(settings: &Settings) {
    println!("\n{}", "🤖 Available Models".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    for model in ModelOption::all() {
        let marker = if model.as_str() == settings.model_id {
            " (default)".green()
        } else {
            "".normal()
        };
        println!("  • {} {}{}", model.as_str(), model.display_name().dimmed(), marker);
    }

    if ModelOption::from_str(&settings.model_id).is_none() {
        println!("  • {} {}", settings.model_id, "(default, from MODEL_ID)".green());
    }
}
