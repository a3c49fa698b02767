use anyhow::{Context, Result};

use crate::llm::provider::Provider;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    /// Explicit provider selection. `None` means auto-detect from the key prefix.
    pub provider_override: Option<Provider>,
    /// Sent as `HTTP-Referer` on OpenRouter requests (app attribution).
    pub http_referer: String,
    /// Sent as `X-Title` on OpenRouter requests.
    pub app_title: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider_override = match std::env::var("LLM_PROVIDER") {
            Ok(value) => Some(
                value
                    .parse::<Provider>()
                    .context("LLM_PROVIDER must be 'gemini' or 'openrouter'")?,
            ),
            Err(_) => None,
        };

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            provider_override,
            http_referer: std::env::var("APP_REFERER")
                .unwrap_or_else(|_| "https://monday2friday.app".to_string()),
            app_title: std::env::var("APP_TITLE")
                .unwrap_or_else(|_| "Monday2Friday Agent".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
