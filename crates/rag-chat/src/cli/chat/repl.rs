use crate::cli::chat::commands::CliCommand;
use crate::cli::ux::{ChatMessageType, GenerationSpinner, format_message, style_chat_text};
use anyhow::Result;
use clap::{CommandFactory, Parser};
use rag_chat_core::client::{ChatClient, SendOutcome};
use rag_chat_core::handlers::on_send;
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{CompletionType, Editor, Helper, Highlighter, Validator};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

// -------------
// REPL completion
// -------------
#[derive(Helper, Validator, Highlighter)]
struct Repl {
    command_names: Vec<String>,
}

#[derive(Debug)]
struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    fn new(text: &str) -> Self {
        let display_string = style_chat_text(text, ChatMessageType::Footer).to_string();
        Self {
            text: text.to_owned(),
            display_string,
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

impl Completer for Repl {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, Vec::new()));
        }

        let candidates = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line))
            .map(|name| CompletionCandidate::new(name))
            .collect();

        Ok((0, candidates))
    }
}

impl Hinter for Repl {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.is_empty() || pos < line.len() || !line.starts_with('/') {
            return None;
        }
        self.command_names
            .iter()
            .find(|&cmd_name| cmd_name.starts_with(line))
            .map(|cmd_name| cmd_name[line.len()..].into())
    }
}

/// Runs the interactive REPL for the chat session.
pub async fn run(client: Arc<ChatClient>) -> Result<()> {
    println!(
        "Welcome to rag-chat! Talking to {}. Type '/help' for commands, '/q' to exit.",
        client.context().await.api_base
    );
    for message in client.messages() {
        println!("\n{}", format_message(&message));
    }

    let config = rustyline::Config::builder()
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let command_names = CliCommand::command()
        .get_subcommands()
        .flat_map(|c| c.get_name_and_visible_aliases())
        .map(|s| format!("/{s}"))
        .collect::<Vec<_>>();

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(Repl { command_names }));

    let prompt = format!("\n{}", style_chat_text("> ", ChatMessageType::Prompt));
    let mut stdout = std::io::stdout();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(&line)?;
                let trimmed_line = line.trim();

                if trimmed_line.is_empty() {
                    continue;
                }

                if trimmed_line.starts_with('/') {
                    let args = shlex::split(trimmed_line).unwrap_or_default();
                    match CliCommand::try_parse_from(args) {
                        Ok(cli_command) => {
                            if !cli_command.command.execute(&client).await? {
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            e.print()?;
                        }
                    }
                } else {
                    process_message(&client, trimmed_line, &mut stdout).await?;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type /quit to exit.");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nBye!");
                return Ok(());
            }
            Err(err) => {
                return Err(err.into());
            }
        }
    }
}

/// Sends one message and writes the assistant's answer to `out`.
async fn process_message(client: &ChatClient, text: &str, out: &mut impl Write) -> Result<()> {
    let spinner = GenerationSpinner::new(client.settings().composing.clone());
    let outcome = on_send(client, text).await;
    spinner.clear();

    match outcome {
        SendOutcome::Replied(message) | SendOutcome::Failed(message) => {
            writeln!(out, "\n{}", format_message(&message))?;
        }
        SendOutcome::Busy => {
            writeln!(
                out,
                "{}",
                style_chat_text("Still waiting for the previous reply.", ChatMessageType::Footer)
            )?;
        }
        SendOutcome::Ignored => {}
    }
    out.flush()?;

    if client.input().take_focus_request() {
        debug!("Input re-enabled");
    }
    Ok(())
}
