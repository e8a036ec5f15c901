//! Entry points a host UI calls in response to user actions.
use crate::client::{ChatClient, SendOutcome};

/// A short-lived message for the user, e.g. a toast or status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Keys the host forwards from its input control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// Save button: persists the typed API base.
pub async fn on_save(client: &ChatClient, raw_base: &str) -> Notice {
    match client.save_api_base(raw_base).await {
        Ok(base) => Notice::Info(format!("API base saved: {base}")),
        Err(e) => Notice::Error(format!("API base not saved: {e}")),
    }
}

/// Send button.
pub async fn on_send(client: &ChatClient, text: &str) -> SendOutcome {
    client.send_message(text).await
}

/// Key press in the input. Enter without Shift sends; everything else is left
/// to the input control and returns `None`.
pub async fn on_submit_key(
    client: &ChatClient,
    key: Key,
    shift: bool,
    text: &str,
) -> Option<SendOutcome> {
    match (key, shift) {
        (Key::Enter, false) => Some(on_send(client, text).await),
        _ => None,
    }
}
