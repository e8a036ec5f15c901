//! Lazy bootstrap of the backend session.
use tracing::{debug, instrument, warn};

use crate::{
    api::RagApi,
    config::ClientContext,
    error::ClientError,
    store::{Store, keys},
};

/// Returns the session held by `context`, creating one on the backend first if needed.
///
/// A held id is returned as-is without any network call; an empty one counts
/// as absent. A freshly created id is kept in `context` and persisted; failing
/// to persist it is logged only, since the id is still usable for this run.
#[instrument(skip_all, fields(api_base = %context.api_base))]
pub async fn ensure_session(
    api: &dyn RagApi,
    store: &dyn Store,
    context: &mut ClientContext,
) -> Result<String, ClientError> {
    if let Some(session_id) = context.session_id.as_ref().filter(|id| !id.is_empty()) {
        return Ok(session_id.clone());
    }

    let session_id = api.create_session(&context.api_base).await?;
    if session_id.is_empty() {
        context.session_id = None;
        return Err(ClientError::EmptySessionId);
    }
    context.session_id = Some(session_id.clone());
    if let Err(e) = store.set(keys::SESSION_ID, &session_id) {
        warn!(error = %e, "Failed to persist session id");
    }
    debug!(%session_id, "Using new session");
    Ok(session_id)
}
