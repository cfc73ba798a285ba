//! Generation client: one chat request per non-empty prompt, every outcome a value.

use ai_client::{AiError, ChatCompletion, Message, OpenAi};
use nutriquery_common::AppConfig;
use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::{Assembled, Prompt};

pub const SYSTEM_ROLE: &str = "You are a helpful assistant analyzing food product datasets.";
pub const DEFAULT_MAX_TOKENS: u32 = 300;

pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key. Please check your API key and try again.";
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Check your usage and billing details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    AuthError,
    RateLimited,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::AuthError => write!(f, "auth_error"),
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GenerationOutcome {
    Answered(String),
    Empty(String),
    Failed { kind: FailureKind, message: String },
}

impl GenerationOutcome {
    /// The single user-facing string for this outcome.
    pub fn render(&self) -> &str {
        match self {
            GenerationOutcome::Answered(text) => text,
            GenerationOutcome::Empty(reason) => reason,
            GenerationOutcome::Failed { message, .. } => message,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            GenerationOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<AiError> for GenerationOutcome {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Auth(_) => GenerationOutcome::Failed {
                kind: FailureKind::AuthError,
                message: INVALID_API_KEY_MESSAGE.to_string(),
            },
            AiError::RateLimited(_) => GenerationOutcome::Failed {
                kind: FailureKind::RateLimited,
                message: RATE_LIMIT_MESSAGE.to_string(),
            },
            other => GenerationOutcome::Failed {
                kind: FailureKind::Other,
                message: format!("An error occurred: {}", other),
            },
        }
    }
}

/// Sends assembled prompts to a chat backend. No retries.
pub struct GenerationClient<C> {
    backend: C,
    max_tokens: u32,
}

impl GenerationClient<OpenAi> {
    /// OpenAI backend wired from startup configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut ai = OpenAi::new(&config.openai_api_key, &config.openai_model)
            .with_timeout(config.request_timeout);
        if let Some(ref url) = config.openai_base_url {
            ai = ai.with_base_url(url);
        }
        Self::new(ai).with_max_tokens(config.max_tokens)
    }
}

impl<C: ChatCompletion> GenerationClient<C> {
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    pub async fn generate(&self, prompt: &Prompt) -> GenerationOutcome {
        let messages = [Message::system(SYSTEM_ROLE), Message::user(&prompt.text)];

        match self.backend.complete(&messages, self.max_tokens).await {
            Ok(text) => {
                info!(rows = prompt.included_rows, chars = text.len(), "Generation answered");
                GenerationOutcome::Answered(text)
            }
            Err(err) => {
                let outcome = GenerationOutcome::from(err);
                if let GenerationOutcome::Failed { kind, ref message } = outcome {
                    warn!(kind = %kind, message = %message, "Generation failed");
                }
                outcome
            }
        }
    }

    /// Empty results never reach the backend.
    pub async fn respond(&self, assembled: &Assembled) -> GenerationOutcome {
        match assembled {
            Assembled::Empty(reason) => GenerationOutcome::Empty(reason.to_string()),
            Assembled::Prompt(prompt) => self.generate(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_maps_to_fixed_message() {
        let outcome = GenerationOutcome::from(AiError::Auth("Incorrect API key".into()));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::AuthError));
        assert_eq!(outcome.render(), INVALID_API_KEY_MESSAGE);
    }

    #[test]
    fn test_rate_limit_maps_to_fixed_message() {
        let outcome = GenerationOutcome::from(AiError::RateLimited("quota".into()));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::RateLimited));
        assert_eq!(outcome.render(), RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn test_other_errors_are_stringified() {
        let outcome = GenerationOutcome::from(AiError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Other));
        assert_eq!(outcome.render(), "An error occurred: API error (500): boom");

        let outcome = GenerationOutcome::from(AiError::Timeout("after 60s".into()));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Other));
        assert!(outcome.render().starts_with("An error occurred: Request timed out"));

        let outcome = GenerationOutcome::from(AiError::EmptyResponse);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Other));
    }

    #[test]
    fn test_render_answered_and_empty() {
        assert_eq!(GenerationOutcome::Answered("hi".into()).render(), "hi");
        assert_eq!(GenerationOutcome::Empty("none".into()).render(), "none");
        assert_eq!(GenerationOutcome::Answered("hi".into()).failure_kind(), None);
    }

    #[test]
    fn test_from_config_uses_model_and_budget() {
        let config = AppConfig::from_sources(Default::default(), |key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        let client = GenerationClient::from_config(&config);
        assert_eq!(client.max_tokens(), 300);
        assert_eq!(client.backend().model(), "gpt-4");
    }
}
