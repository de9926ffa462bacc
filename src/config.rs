//! Gateway Settings
//!
//! Environment-driven configuration, constructed once in `main` and passed
//! down explicitly. No cached globals: every component that needs a setting
//! receives it at construction time.

use std::path::PathBuf;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.chatanywhere.tech/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-2024-08-06";
pub const DEFAULT_DATABASE_PATH: &str = "translations.db";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Key for the OpenAI-compatible endpoint. Translation calls fail
    /// without it; the task lifecycle does not need it.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// SQLite file holding both the tasks table and the translations log.
    pub database_path: PathBuf,
    /// Shared secret for the internal task endpoints. Unset means those
    /// endpoints refuse every call as unconfigured.
    pub internal_api_key: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            database_path: std::env::var("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH)),
            internal_api_key: env_non_empty("INTERNAL_API_KEY"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            internal_api_key: None,
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
