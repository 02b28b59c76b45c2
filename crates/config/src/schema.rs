use std::path::PathBuf;

use {
    fieldex_extract::{DEFAULT_DELIMITER, DEFAULT_FIELD_INDEX},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Largest file the Bot API lets a bot download (20 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

/// Root of `fieldex.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldexConfig {
    pub telegram: TelegramConfig,
    pub defaults: DefaultsConfig,
    pub files: FilesConfig,
}

impl FieldexConfig {
    /// Replace the bot token when one was given on the command line or in
    /// the environment. Empty overrides are ignored.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.telegram.token = Secret::new(token);
        }
    }
}

/// Telegram bot connection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Bot API base URL, for self-hosted API servers.
    pub api_url: Option<String>,
}

impl TelegramConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            api_url: None,
        }
    }
}

/// Settings given to a user's session on first contact and on `/start`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub field_index: i64,
    pub delimiter: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            field_index: DEFAULT_FIELD_INDEX as i64,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

/// Upload handling.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory for per-request temporary input and output files.
    pub temp_dir: PathBuf,

    /// Uploads larger than this are rejected before download.
    pub max_file_bytes: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("fieldex"),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}
