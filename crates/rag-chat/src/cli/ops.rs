//! One-shot subcommands.
use anyhow::{Context, Result};
use rag_chat_core::api::StoredMessage;
use rag_chat_core::client::ChatClient;
use rag_chat_core::handlers::{Notice, on_save};
use rag_chat_core::render::render_sources;

use crate::cli::ux::{ChatMessageType, format_sources, style_chat_text};

pub async fn config(client: &ChatClient, api_base: Option<&str>) -> Result<()> {
    if let Some(base) = api_base {
        match on_save(client, base).await {
            Notice::Info(text) => println!("{text}"),
            Notice::Error(text) => anyhow::bail!(text),
        }
        return Ok(());
    }

    let context = client.context().await;
    println!("API base: {}", context.api_base);
    println!(
        "Session:  {}",
        context.session_id.as_deref().unwrap_or("(none)")
    );
    println!("k:        {}", client.settings().k);
    Ok(())
}

pub async fn health(client: &ChatClient) -> Result<()> {
    let health = client.health().await.context("Health check failed")?;
    println!("{}", health.status);
    Ok(())
}

pub async fn sessions(client: &ChatClient, limit: u32) -> Result<()> {
    let sessions = client
        .sessions(limit)
        .await
        .context("Failed to list sessions")?;
    if sessions.is_empty() {
        println!("No sessions.");
    }
    for session in sessions {
        println!("{}  {}", session.created_at, session.session_id);
    }
    Ok(())
}

pub async fn history(client: &ChatClient, limit: u32) -> Result<()> {
    let messages = client
        .history(limit)
        .await
        .context("Failed to fetch session history")?;
    println!("{}", format_history(&messages));
    Ok(())
}

pub async fn reset(client: &ChatClient) -> Result<()> {
    match client.reset_session().await.context("Failed to reset session")? {
        Some(deleted) => println!("Session {deleted} deleted."),
        None => println!("No session to reset."),
    }
    Ok(())
}

pub async fn ingest(client: &ChatClient, path: &str, reset: bool) -> Result<()> {
    let summary = client
        .ingest(path, reset)
        .await
        .with_context(|| format!("Failed to ingest '{path}'"))?;
    println!(
        "Ingested {} chunks into '{}'.",
        summary.ingested_chunks, summary.collection
    );
    Ok(())
}

/// Formats backend-side messages, one block per message.
pub fn format_history(messages: &[StoredMessage]) -> String {
    if messages.is_empty() {
        return "No messages.".to_string();
    }
    messages
        .iter()
        .map(|m| {
            let mut block = format!(
                "{} {}",
                style_chat_text(&format!("{}:", m.role), ChatMessageType::Speaker),
                m.content
            );
            let links = render_sources(m.sources.as_deref().unwrap_or_default());
            if let Some(line) = format_sources(&links) {
                block.push('\n');
                block.push_str(&style_chat_text(&line, ChatMessageType::Sources).to_string());
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
