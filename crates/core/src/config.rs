use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    assets::{get_config_dir, get_default_config},
    store::{Store, keys},
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_K: u32 = 4;
pub const DEFAULT_NO_REPLY: &str = "(no reply)";
pub const DEFAULT_COMPOSING: &str = "Typing...";

/// Client settings read from `rag-chat.yml`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Fallback API base used until one is saved.
    pub api_base: String,
    /// Result-count hint sent with every chat turn.
    pub k: u32,
    /// Text shown in place of an empty reply.
    pub no_reply: String,
    /// Placeholder text while a reply is pending.
    pub composing: String,
    /// First assistant message of a conversation. Empty disables it.
    pub greeting: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            k: DEFAULT_K,
            no_reply: DEFAULT_NO_REPLY.to_string(),
            composing: DEFAULT_COMPOSING.to_string(),
            greeting: String::new(),
        }
    }
}

impl Settings {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::Config("'k' must be at least 1".to_string()));
        }
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Config("'api_base' must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// Working state of the chat client: where to send requests and which
/// backend session they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub api_base: String,
    pub session_id: Option<String>,
}

/// Seeds a [`ClientContext`] from the persisted store.
///
/// Missing values fall back to `settings.api_base` and no session; this never fails.
pub fn load_configuration(store: &dyn Store, settings: &Settings) -> ClientContext {
    let api_base = store
        .get(keys::API_BASE)
        .filter(|base| !base.trim().is_empty())
        .unwrap_or_else(|| settings.api_base.clone());
    let session_id = store
        .get(keys::SESSION_ID)
        .filter(|id| !id.is_empty());
    debug!(%api_base, ?session_id, "Loaded client configuration");
    ClientContext {
        api_base,
        session_id,
    }
}

/// Trims and persists `new_base`, then makes it the working API base.
///
/// The working base is updated even when persisting fails so the current run
/// keeps using what the user typed.
pub fn save_configuration(
    store: &dyn Store,
    context: &mut ClientContext,
    new_base: &str,
) -> Result<(), ConfigError> {
    let base = new_base.trim().to_string();
    context.api_base = base.clone();
    store.set(keys::API_BASE, &base)?;
    debug!(api_base = %base, "Saved API base");
    Ok(())
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ConfigError> {
    let actual_path = config_path.unwrap_or_else(|| get_config_dir().join("rag-chat.yml"));

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_settings(config_path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    parse_settings(&content)
}

fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    // A file of only comments is a null document
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if value.is_null() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_value(value)?;
    settings.validate()
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write, path::PathBuf};

    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::store::MemoryStore;

    fn create_temp_config(dir: &TempDir, content: &str) -> PathBuf {
        let config_path = dir.path().join("rag-chat.yml");
        File::create(&config_path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        config_path
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.api_base, "http://localhost:8000");
        assert_eq!(settings.k, 4);
        assert_eq!(settings.no_reply, "(no reply)");
        assert_eq!(settings.composing, "Typing...");
    }

    #[test]
    fn test_get_settings_creates_default_file() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join("nested").join("rag-chat.yml");

        let (exists, path) = create_or_get_config_file(Some(config_file.clone())).unwrap();
        assert!(!exists);
        assert_eq!(path, config_file);
        assert!(path.exists());

        let settings = get_settings(Some(config_file)).unwrap();
        assert_eq!(settings.api_base, "http://localhost:8000");
        assert_eq!(settings.k, 4);
        assert!(settings.greeting.starts_with("Hi! I'm your RAG assistant."));
    }

    #[test]
    fn test_get_settings_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_file = create_temp_config(&dir, "api_base: https://rag.example.com\nk: 8\n");

        let settings = get_settings(Some(config_file)).unwrap();
        assert_eq!(settings.api_base, "https://rag.example.com");
        assert_eq!(settings.k, 8);
        assert_eq!(settings.no_reply, "(no reply)");
    }

    #[test]
    fn test_get_settings_comment_only_file() {
        let dir = tempdir().unwrap();
        let config_file = create_temp_config(&dir, "# nothing here\n");
        assert_eq!(get_settings(Some(config_file)).unwrap(), Settings::default());
    }

    #[test]
    fn test_get_settings_throws_for_invalid_yaml() {
        let dir = tempdir().unwrap();
        let config_file = create_temp_config(&dir, "invalid yaml content: - [");
        let err = get_settings(Some(config_file)).unwrap_err();
        assert!(matches!(err, ConfigError::YAMLError(_)));
        assert!(format!("{err}").contains("YAML parsing error"));
    }

    #[test]
    fn test_get_settings_rejects_zero_k() {
        let dir = tempdir().unwrap();
        let config_file = create_temp_config(&dir, "k: 0\n");
        let err = get_settings(Some(config_file)).unwrap_err();
        assert!(matches!(err, ConfigError::Config(msg) if msg.contains("'k'")));
    }

    #[test]
    fn test_load_configuration_defaults() {
        let store = MemoryStore::default();
        let context = load_configuration(&store, &Settings::default());
        assert_eq!(context.api_base, "http://localhost:8000");
        assert_eq!(context.session_id, None);
    }

    #[test]
    fn test_load_configuration_reads_persisted_values() {
        let store = MemoryStore::default();
        store.set(keys::API_BASE, "http://rag:9000").unwrap();
        store.set(keys::SESSION_ID, "abc").unwrap();

        let context = load_configuration(&store, &Settings::default());
        assert_eq!(context.api_base, "http://rag:9000");
        assert_eq!(context.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_save_configuration_trims_and_persists() {
        let store = MemoryStore::default();
        let mut context = load_configuration(&store, &Settings::default());

        save_configuration(&store, &mut context, "  http://new-base:8080  ").unwrap();
        assert_eq!(context.api_base, "http://new-base:8080");

        let reloaded = load_configuration(&store, &Settings::default());
        assert_eq!(reloaded.api_base, "http://new-base:8080");
    }
}
