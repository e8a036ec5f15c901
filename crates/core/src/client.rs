//! Chat client: one turn at a time against the RAG backend.
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, instrument, warn};

use crate::{
    api::{
        ChatReply, ChatRequest, Health, IngestRequest, IngestSummary, RagApi, SessionSummary,
        StoredMessage,
    },
    config::{ClientContext, ConfigError, Settings, load_configuration, save_configuration},
    error::ClientError,
    message::{Conversation, PendingReply},
    render::{RenderedMessage, render_message},
    session::ensure_session,
    store::{Store, keys},
};

/// Where the current chat turn is. Terminal states fall back to `Idle` once
/// the input is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingSession,
    AwaitingReply,
    Resolved,
    Failed,
}

/// Result of [`ChatClient::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Another turn is in flight; nothing happened.
    Busy,
    Replied(RenderedMessage),
    Failed(RenderedMessage),
}

/// Enabled flag of the host's input control.
#[derive(Debug)]
pub struct InputLatch {
    enabled: AtomicBool,
    focus_requested: AtomicBool,
}

impl Default for InputLatch {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            focus_requested: AtomicBool::new(false),
        }
    }
}

impl InputLatch {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Returns whether focus should go back to the input, clearing the request.
    pub fn take_focus_request(&self) -> bool {
        self.focus_requested.swap(false, Ordering::SeqCst)
    }

    fn try_disable(&self) -> Option<InputGuard<'_>> {
        self.enabled
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InputGuard { latch: self })
    }
}

/// Re-enables input and asks for focus when dropped, whatever the turn's outcome.
struct InputGuard<'a> {
    latch: &'a InputLatch,
}

impl Drop for InputGuard<'_> {
    fn drop(&mut self) {
        self.latch.enabled.store(true, Ordering::SeqCst);
        self.latch.focus_requested.store(true, Ordering::SeqCst);
    }
}

/// Owns the composing placeholder of the turn in flight.
///
/// Dropping it unsettled, e.g. when the send future is cancelled, fails the
/// placeholder so the next turn can start.
struct TurnGuard<'a> {
    client: &'a ChatClient,
    pending: Option<PendingReply>,
}

impl TurnGuard<'_> {
    fn settle(mut self, result: Result<ChatReply, ClientError>) -> Option<SendOutcome> {
        let pending = self.pending.take()?;
        let client = self.client;
        let mut conversation = lock(&client.conversation);
        match result {
            Ok(reply) => {
                let text = reply
                    .reply
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| client.settings.no_reply.clone());
                conversation.resolve(pending, text, reply.sources.unwrap_or_default());
                client.set_turn(TurnState::Resolved);
                conversation.last().map(render_message).map(SendOutcome::Replied)
            }
            Err(e) => {
                warn!(error = %e, "Chat turn failed");
                conversation.fail(pending, format!("Error: {e}"));
                client.set_turn(TurnState::Failed);
                conversation.last().map(render_message).map(SendOutcome::Failed)
            }
        }
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            warn!("Chat turn cancelled");
            lock(&self.client.conversation).fail(pending, "Error: request cancelled".to_string());
        }
        self.client.set_turn(TurnState::Idle);
    }
}

/// Client for a RAG chat backend.
pub struct ChatClient {
    api: Arc<dyn RagApi>,
    store: Arc<dyn Store>,
    settings: Settings,
    context: tokio::sync::Mutex<ClientContext>,
    conversation: Mutex<Conversation>,
    turn: Mutex<TurnState>,
    input: InputLatch,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChatClient {
    /// Creates a client seeded from `store`; the conversation starts with the greeting.
    pub fn new(api: Arc<dyn RagApi>, store: Arc<dyn Store>, settings: Settings) -> Self {
        let context = load_configuration(store.as_ref(), &settings);
        let conversation = Conversation::with_greeting(&settings.greeting);
        Self {
            api,
            store,
            settings,
            context: tokio::sync::Mutex::new(context),
            conversation: Mutex::new(conversation),
            turn: Mutex::new(TurnState::Idle),
            input: InputLatch::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn input(&self) -> &InputLatch {
        &self.input
    }

    pub fn turn_state(&self) -> TurnState {
        *lock(&self.turn)
    }

    fn set_turn(&self, state: TurnState) {
        debug!(?state, "Turn state");
        *lock(&self.turn) = state;
    }

    pub async fn context(&self) -> ClientContext {
        self.context.lock().await.clone()
    }

    /// Rendered view of every message, in order.
    pub fn messages(&self) -> Vec<RenderedMessage> {
        lock(&self.conversation)
            .messages()
            .iter()
            .map(render_message)
            .collect()
    }

    /// Saves a new API base; see [`save_configuration`].
    pub async fn save_api_base(&self, new_base: &str) -> Result<String, ConfigError> {
        let mut context = self.context.lock().await;
        save_configuration(self.store.as_ref(), &mut context, new_base)?;
        Ok(context.api_base.clone())
    }

    /// Returns the current session, creating one on the backend if none is held.
    pub async fn ensure_session(&self) -> Result<String, ClientError> {
        let mut context = self.context.lock().await;
        ensure_session(self.api.as_ref(), self.store.as_ref(), &mut context).await
    }

    /// Runs one chat turn.
    ///
    /// Blank text is ignored and a call made while another turn is in flight
    /// returns [`SendOutcome::Busy`]; neither touches the conversation.
    /// Otherwise the user message and a composing placeholder are appended
    /// and the placeholder ends up holding either the reply or an error.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_input) = self.input.try_disable() else {
            debug!("Send rejected, turn in flight");
            return SendOutcome::Busy;
        };

        let pending = {
            let mut conversation = lock(&self.conversation);
            match conversation.begin_turn(text, &self.settings.composing) {
                Some(pending) => pending,
                None => return SendOutcome::Busy,
            }
        };
        let turn = TurnGuard {
            client: self,
            pending: Some(pending),
        };

        let result = self.run_turn(text).await;
        turn.settle(result).unwrap_or(SendOutcome::Ignored)
    }

    async fn run_turn(&self, text: &str) -> Result<ChatReply, ClientError> {
        self.set_turn(TurnState::AwaitingSession);
        let (api_base, session_id) = {
            let mut context = self.context.lock().await;
            let session_id =
                ensure_session(self.api.as_ref(), self.store.as_ref(), &mut context).await?;
            (context.api_base.clone(), session_id)
        };

        self.set_turn(TurnState::AwaitingReply);
        let request = ChatRequest {
            session_id: &session_id,
            message: text,
            k: self.settings.k,
        };
        self.api.chat(&api_base, &request).await
    }

    /// Deletes the held session on the backend and forgets it locally.
    ///
    /// Returns the deleted id, or `None` when no session was held. On a
    /// backend failure the local session is kept.
    pub async fn reset_session(&self) -> Result<Option<String>, ClientError> {
        let mut context = self.context.lock().await;
        let Some(session_id) = context.session_id.clone() else {
            return Ok(None);
        };
        let deleted = self
            .api
            .delete_session(&context.api_base, &session_id)
            .await?;
        context.session_id = None;
        self.store.remove(keys::SESSION_ID)?;
        debug!(%deleted, "Session reset");
        Ok(Some(deleted))
    }

    /// Backend-side history of the held session.
    pub async fn history(&self, limit: u32) -> Result<Vec<StoredMessage>, ClientError> {
        let context = self.context().await;
        let session_id = context.session_id.ok_or(ClientError::NoSession)?;
        self.api
            .session_messages(&context.api_base, &session_id, limit)
            .await
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let api_base = self.context().await.api_base;
        self.api.health(&api_base).await
    }

    pub async fn sessions(&self, limit: u32) -> Result<Vec<SessionSummary>, ClientError> {
        let api_base = self.context().await.api_base;
        self.api.list_sessions(&api_base, limit).await
    }

    pub async fn ingest(&self, path: &str, reset: bool) -> Result<IngestSummary, ClientError> {
        let api_base = self.context().await.api_base;
        self.api
            .ingest(&api_base, &IngestRequest { path, reset })
            .await
    }

    /// Clears the local conversation. Refused while a turn is in flight.
    pub fn clear_messages(&self) -> bool {
        lock(&self.conversation).clear()
    }
}
