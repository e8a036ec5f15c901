use crate::cli::ops::format_history;
use crate::cli::ux::{ChatMessageType, style_chat_text};
use anyhow::Result;
use clap::{Parser, Subcommand};
use rag_chat_core::client::ChatClient;
use rag_chat_core::handlers::{Notice, on_save};

// -------------
// REPL commands
// -------------
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct CliCommand {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Hash, PartialEq, Eq)]
pub enum Command {
    /// Show the API base, or save a new one.
    Api {
        /// New API base
        base: Option<String>,
    },
    /// Clear the local transcript
    Clear,
    /// Show the backend history of this session
    #[command(alias = "h")]
    History {
        #[arg(default_value_t = 200)]
        limit: u32,
    },
    /// Delete this session on the backend and start a new one on the next message
    Reset,
    /// Exit the chat session
    #[command(alias = "q", alias = "quit")]
    Exit,
}

impl Command {
    /// Executes a REPL command.
    ///
    /// Returns `Ok(false)` if the REPL should exit.
    pub async fn execute(self, client: &ChatClient) -> Result<bool> {
        match self {
            Command::Api { base } => execute_api(client, base.as_deref()).await,
            Command::Clear => {
                if client.clear_messages() {
                    println!("Transcript cleared");
                }
                Ok(true)
            }
            Command::History { limit } => {
                match client.history(limit).await {
                    Ok(messages) => println!("{}", format_history(&messages)),
                    Err(e) => eprintln!(
                        "{}",
                        style_chat_text(&format!("Error: {e}"), ChatMessageType::Error)
                    ),
                }
                Ok(true)
            }
            Command::Reset => {
                match client.reset_session().await {
                    Ok(Some(deleted)) => println!("Session {deleted} deleted."),
                    Ok(None) => println!("No session to reset."),
                    Err(e) => eprintln!(
                        "{}",
                        style_chat_text(&format!("Error: {e}"), ChatMessageType::Error)
                    ),
                }
                Ok(true)
            }
            Command::Exit => Ok(false),
        }
    }
}

async fn execute_api(client: &ChatClient, base: Option<&str>) -> Result<bool> {
    match base {
        None => println!("API base: {}", client.context().await.api_base),
        Some(base) => match on_save(client, base).await {
            Notice::Info(text) => {
                println!("{}", style_chat_text(&text, ChatMessageType::Footer))
            }
            Notice::Error(text) => {
                eprintln!("{}", style_chat_text(&text, ChatMessageType::Error))
            }
        },
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_chat_core::api::HttpRagApi;
    use rag_chat_core::config::Settings;
    use rag_chat_core::store::{MemoryStore, Store};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn parse(args: &[&str]) -> Command {
        CliCommand::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(
            parse(&["/api", "http://localhost:9000"]),
            Command::Api {
                base: Some("http://localhost:9000".to_string())
            }
        );
        assert_eq!(parse(&["/api"]), Command::Api { base: None });
        assert_eq!(parse(&["/h"]), Command::History { limit: 200 });
        assert_eq!(parse(&["/history", "5"]), Command::History { limit: 5 });
        assert_eq!(parse(&["/q"]), Command::Exit);
        assert!(CliCommand::try_parse_from(["/nope"]).is_err());
    }

    #[tokio::test]
    async fn test_api_command_saves_base() -> Result<()> {
        let store = Arc::new(MemoryStore::default());
        let client = ChatClient::new(
            Arc::new(HttpRagApi::new()),
            store.clone(),
            Settings::default(),
        );

        let keep_going = Command::Api {
            base: Some("http://saved:1234".to_string()),
        }
        .execute(&client)
        .await?;

        assert!(keep_going);
        assert_eq!(client.context().await.api_base, "http://saved:1234");
        assert_eq!(store.get("rag.apiBase").as_deref(), Some("http://saved:1234"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_and_exit_commands() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/session/s-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": "s-1"})))
            .expect(1)
            .mount(&server)
            .await;
        let store = Arc::new(MemoryStore::default());
        store.set("rag.sessionId", "s-1")?;
        let client = ChatClient::new(
            Arc::new(HttpRagApi::new()),
            store.clone(),
            Settings {
                api_base: server.uri(),
                ..Default::default()
            },
        );

        assert!(Command::Reset.execute(&client).await?);
        assert_eq!(store.get("rag.sessionId"), None);
        assert!(!Command::Exit.execute(&client).await?);
        Ok(())
    }
}
