//! rag-chat cli definition and entrypoint.
mod chat;
mod ops;
pub mod ux;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rag_chat_core::api::HttpRagApi;
use rag_chat_core::client::ChatClient;
use rag_chat_core::config::get_settings;
use rag_chat_core::store::{FileStore, MemoryStore, Store};

use crate::log::setup_logging;

/// rag-chat - chat with your documents through a RAG backend.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show verbose logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep API base and session in memory only.
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Settings file to use instead of the default rag-chat.yml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat interactively (default).
    Chat,
    /// Show or save the API base.
    Config {
        /// New API base to save.
        #[arg(long)]
        api_base: Option<String>,
    },
    /// Check that the backend is up.
    Health,
    /// List sessions known to the backend.
    Sessions {
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
    /// Show the backend history of the current session.
    History {
        #[arg(short, long, default_value_t = 200)]
        limit: u32,
    },
    /// Delete the current session on the backend and start fresh.
    Reset,
    /// Ask the backend to ingest documents from a path on its side.
    Ingest {
        /// Path to ingest, as seen by the backend.
        #[arg(default_value = "data/docs")]
        path: String,
        /// Drop the existing collection first.
        #[arg(long)]
        reset: bool,
    },
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    let client = build_client(&cli)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat::execute(Arc::new(client)).await,
        Commands::Config { api_base } => ops::config(&client, api_base.as_deref()).await,
        Commands::Health => ops::health(&client).await,
        Commands::Sessions { limit } => ops::sessions(&client, limit).await,
        Commands::History { limit } => ops::history(&client, limit).await,
        Commands::Reset => ops::reset(&client).await,
        Commands::Ingest { path, reset } => ops::ingest(&client, &path, reset).await,
    }
}

fn build_client(cli: &Cli) -> Result<ChatClient> {
    let settings = get_settings(cli.config.clone()).context("Failed to load settings")?;
    let store: Arc<dyn Store> = if cli.ephemeral {
        Arc::new(MemoryStore::default())
    } else {
        Arc::new(FileStore::open_default().context("Failed to open state store")?)
    };
    Ok(ChatClient::new(
        Arc::new(HttpRagApi::new()),
        store,
        settings,
    ))
}
