use anyhow::Result;
use rag_chat_core::client::ChatClient;
use std::sync::Arc;

mod commands;
mod repl;

/// Executes the chat command, starting an interactive REPL session.
pub async fn execute(client: Arc<ChatClient>) -> Result<()> {
    repl::run(client).await
}
