//! LLM Client — the single point of entry for all hosted-model calls.
//!
//! ARCHITECTURAL RULE: no other module may call a provider API directly.
//! All LLM interactions MUST go through this module.

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub mod provider;

use crate::agent::AgentProfile;
use provider::{
    ChatCompletionRequest, ChatCompletionResponse, ChatTurn, GeminiContent, GeminiPart,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, Provider,
    ProviderErrorEnvelope, ThinkingConfig, GEMINI_API_BASE, OPENROUTER_API_URL,
};

/// Sampling temperature for every call. Balanced creativity.
pub const TEMPERATURE: f64 = 0.7;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Retries exhausted after {retries} attempts")]
    RetriesExhausted { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Rate limits, server errors, and transport failures are worth retrying;
    /// everything else surfaces immediately.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// The single LLM client shared by all services. Wraps the active provider's
/// REST API with retry logic and structured-output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    provider: Provider,
    http_referer: String,
    app_title: String,
}

impl LlmClient {
    pub fn new(api_key: String, provider: Provider, http_referer: String, app_title: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            provider,
            http_referer,
            app_title,
        }
    }

    /// Makes a raw call and returns the reply text.
    /// Retries on 429, 5xx, and transport errors with exponential backoff.
    pub async fn call(
        &self,
        profile: &AgentProfile,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let result = match self.provider {
                Provider::OpenRouter => self.call_openrouter(profile, prompt, system).await,
                Provider::Gemini => self.call_gemini(profile, prompt, system).await,
            };

            match result {
                Ok(text) => {
                    debug!(
                        "LLM call succeeded via {} ({} chars)",
                        self.provider,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() => {
                    warn!("LLM call via {} failed: {e}", self.provider);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM with the persona's system instruction extended by a JSON
    /// shape constraint, and deserializes the reply. Markdown code fences are
    /// stripped before parsing since models sometimes add them regardless of
    /// instructions.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        profile: &AgentProfile,
        prompt: &str,
        schema: &str,
    ) -> Result<T, LlmError> {
        let system = json_system(profile.system_instruction, schema);
        let text = self.call(profile, prompt, &system).await?;
        let cleaned = strip_json_fences(&text);
        serde_json::from_str(cleaned).map_err(LlmError::Parse)
    }

    /// Plain-text call in the persona's voice, for chat.
    pub async fn call_text(
        &self,
        profile: &AgentProfile,
        prompt: &str,
    ) -> Result<String, LlmError> {
        self.call(profile, prompt, profile.system_instruction).await
    }

    async fn call_openrouter(
        &self,
        profile: &AgentProfile,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model: profile.openrouter_model,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: system,
                },
                ChatTurn {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        debug!("Dispatching request to {} (openrouter)", profile.openrouter_model);

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.http_referer)
            .header("X-Title", &self.app_title)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        let reply: ChatCompletionResponse = response.json().await?;
        reply
            .text()
            .map(|s| s.to_string())
            .ok_or(LlmError::EmptyContent)
    }

    async fn call_gemini(
        &self,
        profile: &AgentProfile,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                thinking_config: profile
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, profile.gemini_model);
        debug!("Dispatching request to {} (gemini)", profile.gemini_model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response.text().await.unwrap_or_default()));
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply.text().ok_or(LlmError::EmptyContent)
    }
}

/// Builds an API error, preferring the message from the provider's JSON error
/// envelope over the raw body.
fn api_error(status: u16, body: String) -> LlmError {
    let message = serde_json::from_str::<ProviderErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}

/// Extends a persona's system instruction with the JSON shape constraint for
/// structured calls.
fn json_system(system_instruction: &str, schema: &str) -> String {
    format!(
        "{system_instruction}\n\n\
        [CRITICAL JSON INSTRUCTION]\n\
        You are a JSON Generation Machine. You must output VALID, PARSABLE JSON.\n\
        Do not include markdown code blocks. Do not include introductory text.\n\n\
        Your output structure must strictly match:\n{schema}"
    )
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
