//! Hosted LLM providers and their wire formats.
//!
//! Two backends are supported: the OpenRouter chat-completions API and the
//! Gemini generateContent API. The active provider is normally auto-detected
//! from the API key's prefix, with an explicit `LLM_PROVIDER` override.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenRouter,
}

impl Provider {
    /// Detects the provider from the API key shape: Google issues `AIza...`
    /// keys, OpenRouter issues `sk-or-...` keys. Anything else is treated as
    /// OpenRouter, the catch-all chat-completions endpoint.
    pub fn detect(api_key: &str) -> Self {
        if api_key.starts_with("AIza") {
            Provider::Gemini
        } else {
            Provider::OpenRouter
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown provider '{0}'")]
pub struct ParseProviderError(String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openrouter" => Ok(Provider::OpenRouter),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenRouter wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatTurn<'a>>,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ChatTurn<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Extracts the reply text from the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub system_instruction: GeminiContent<'a>,
    pub contents: Vec<GeminiContent<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct GeminiPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiTextPart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Joins the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let joined: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

/// Error envelope shared by both providers: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ProviderErrorEnvelope {
    pub error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ProviderErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_gemini_key() {
        assert_eq!(Provider::detect("AIzaSyD-example"), Provider::Gemini);
    }

    #[test]
    fn test_detect_openrouter_key() {
        assert_eq!(Provider::detect("sk-or-v1-example"), Provider::OpenRouter);
    }

    #[test]
    fn test_unknown_key_falls_back_to_openrouter() {
        assert_eq!(Provider::detect("sk-something-else"), Provider::OpenRouter);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(
            "OpenRouter".parse::<Provider>().unwrap(),
            Provider::OpenRouter
        );
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn test_chat_completion_request_shape() {
        let request = ChatCompletionRequest {
            model: "google/gemini-2.5-flash",
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: "You are concise.",
                },
                ChatTurn {
                    role: "user",
                    content: "Hello",
                },
            ],
            temperature: 0.7,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "google/gemini-2.5-flash");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["temperature"], 0.7);
    }

    #[test]
    fn test_chat_completion_response_text() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "Done."}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Done."));
    }

    #[test]
    fn test_chat_completion_response_empty_choices() {
        let response: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_generation_config_omits_absent_thinking_budget() {
        let config = GenerationConfig {
            temperature: 0.7,
            thinking_config: None,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("thinkingConfig").is_none());

        let config = GenerationConfig {
            temperature: 0.7,
            thinking_config: Some(ThinkingConfig {
                thinking_budget: 1024,
            }),
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["thinkingConfig"]["thinkingBudget"], 1024);
    }

    #[test]
    fn test_generate_content_response_joins_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Hello world".to_string()));
    }

    #[test]
    fn test_generate_content_response_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_provider_error_envelope() {
        let json = r#"{"error": {"message": "model not found", "code": 404}}"#;
        let envelope: ProviderErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.message, "model not found");
    }
}
