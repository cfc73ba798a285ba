mod client;
pub(crate) mod types;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AiError, AiResult};
use crate::traits::{ChatCompletion, Message};

use client::OpenAiClient;
use types::{ChatRequest, WireMessage};

// =============================================================================
// OpenAi Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("api_key", &crate::util::redact_secret(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Bound every request to `timeout`. Without it a request may wait forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> AiResult<OpenAiClient> {
        let client = OpenAiClient::new(&self.api_key, self.timeout)?;
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }
}

// =============================================================================
// ChatCompletion Implementation
// =============================================================================

#[async_trait]
impl ChatCompletion for OpenAi {
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> AiResult<String> {
        let request = ChatRequest::new(&self.model)
            .messages(messages.iter().map(WireMessage::from))
            .output_budget(max_tokens);

        let response = self.client()?.chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4");
        assert_eq!(ai.model, "gpt-4");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.timeout, None);
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[test]
    fn test_openai_with_timeout() {
        let ai = OpenAi::new("sk-test", "gpt-4").with_timeout(Duration::from_secs(5));
        assert_eq!(ai.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let ai = OpenAi::new("sk-supersecretvalue", "gpt-4");
        let printed = format!("{ai:?}");
        assert!(!printed.contains("supersecretvalue"));
        assert!(printed.contains("sk-su"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let ai = OpenAi::new("sk-test", "gpt-4")
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));

        let messages = [Message::system("sys"), Message::user("hi")];
        let err = ai.complete(&messages, 10).await.unwrap_err();
        assert!(matches!(err, AiError::Network(_) | AiError::Timeout(_)));
    }
}
