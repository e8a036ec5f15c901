use thiserror::Error;

use crate::config::ConfigError;

/// Failures of calls against the RAG backend.
///
/// A chat turn only distinguishes session bootstrap failures from everything
/// else; transport and decode failures on either call count as chat request
/// failures.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not create session: {status}")]
    SessionCreation { status: u16 },
    #[error("Could not create session: backend returned an empty session id")]
    EmptySessionId,
    #[error("{status} {body}")]
    ChatRequest { status: u16, body: String },
    #[error("{endpoint} failed with status {status}: {body}")]
    Request {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid API base '{base}': {reason}")]
    InvalidApiBase { base: String, reason: String },
    #[error("No active session")]
    NoSession,
    #[error("Failed to persist client state: {0}")]
    Persist(#[from] ConfigError),
}
