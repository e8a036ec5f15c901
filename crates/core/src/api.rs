//! Wire types and the HTTP client for the RAG backend.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::ClientError;

/// A retrieved document attached to an assistant reply.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    /// Origin of the document, usually a path.
    #[serde(default)]
    pub source: Option<String>,
}

impl Source {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }
}

#[derive(Deserialize, Debug)]
struct SessionCreated {
    session_id: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
    pub k: u32,
}

/// Body of a successful `/chat` response. Both fields may be absent.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: String,
}

#[derive(Deserialize, Debug)]
struct SessionDeleted {
    deleted: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: String,
}

/// A chat message as stored by the backend.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub standalone_question: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    pub created_at: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IngestRequest<'a> {
    pub path: &'a str,
    pub reset: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub ingested_chunks: u64,
    pub collection: String,
}

/// Operations the RAG backend offers. Every call takes the API base so a
/// saved base takes effect on the next request.
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Creates a backend session and returns its id.
    async fn create_session(&self, api_base: &str) -> Result<String, ClientError>;

    /// Sends one chat turn.
    async fn chat(&self, api_base: &str, request: &ChatRequest<'_>)
    -> Result<ChatReply, ClientError>;

    async fn health(&self, api_base: &str) -> Result<Health, ClientError>;

    /// Deletes the backend history of `session_id` and returns the deleted id.
    async fn delete_session(&self, api_base: &str, session_id: &str)
    -> Result<String, ClientError>;

    async fn list_sessions(
        &self,
        api_base: &str,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, ClientError>;

    async fn session_messages(
        &self,
        api_base: &str,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, ClientError>;

    async fn ingest(
        &self,
        api_base: &str,
        request: &IngestRequest<'_>,
    ) -> Result<IngestSummary, ClientError>;
}

/// [`RagApi`] over HTTP JSON.
#[derive(Debug, Clone, Default)]
pub struct HttpRagApi {
    client: Client,
}

impl HttpRagApi {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds `{api_base}/{segments...}`, tolerating a trailing slash on the base.
pub fn endpoint(api_base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidApiBase {
        base: api_base.to_string(),
        reason,
    };

    let mut url = Url::parse(api_base.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be used as a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}

async fn expect_success(
    response: Response,
    endpoint: &'static str,
) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ClientError::Request {
        endpoint,
        status: status.as_u16(),
        body: error_body(response).await,
    })
}

#[async_trait]
impl RagApi for HttpRagApi {
    #[instrument(skip(self))]
    async fn create_session(&self, api_base: &str) -> Result<String, ClientError> {
        let url = endpoint(api_base, &["session"])?;
        let response = self.client.post(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Session creation rejected");
            return Err(ClientError::SessionCreation {
                status: status.as_u16(),
            });
        }

        let created: SessionCreated = response.json().await?;
        debug!(session_id = %created.session_id, "Session created");
        Ok(created.session_id)
    }

    #[instrument(skip(self, request), fields(session_id = request.session_id, k = request.k))]
    async fn chat(
        &self,
        api_base: &str,
        request: &ChatRequest<'_>,
    ) -> Result<ChatReply, ClientError> {
        let url = endpoint(api_base, &["chat"])?;
        let response = self.client.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            debug!(%status, %body, "Chat request rejected");
            return Err(ClientError::ChatRequest {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn health(&self, api_base: &str) -> Result<Health, ClientError> {
        let url = endpoint(api_base, &["health"])?;
        let response = self.client.get(url).send().await?;
        Ok(expect_success(response, "health").await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete_session(
        &self,
        api_base: &str,
        session_id: &str,
    ) -> Result<String, ClientError> {
        let url = endpoint(api_base, &["session", session_id])?;
        let response = self.client.delete(url).send().await?;
        let deleted: SessionDeleted = expect_success(response, "delete session")
            .await?
            .json()
            .await?;
        Ok(deleted.deleted)
    }

    #[instrument(skip(self))]
    async fn list_sessions(
        &self,
        api_base: &str,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, ClientError> {
        let url = endpoint(api_base, &["sessions"])?;
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        Ok(expect_success(response, "list sessions").await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn session_messages(
        &self,
        api_base: &str,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, ClientError> {
        let url = endpoint(api_base, &["session", session_id, "messages"])?;
        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        Ok(expect_success(response, "session messages")
            .await?
            .json()
            .await?)
    }

    #[instrument(skip(self, request), fields(path = request.path, reset = request.reset))]
    async fn ingest(
        &self,
        api_base: &str,
        request: &IngestRequest<'_>,
    ) -> Result<IngestSummary, ClientError> {
        let url = endpoint(api_base, &["ingest"])?;
        let response = self.client.post(url).json(request).send().await?;
        Ok(expect_success(response, "ingest").await?.json().await?)
    }
}
