use async_trait::async_trait;

use crate::error::AiResult;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// ChatCompletion Trait
// =============================================================================

/// One-shot chat completion against a provider.
///
/// Implementations send exactly one request and return the first choice's
/// content verbatim. Retries are the caller's business.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[Message], max_tokens: u32) -> AiResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;

    struct Echo;

    #[async_trait]
    impl ChatCompletion for Echo {
        async fn complete(&self, messages: &[Message], max_tokens: u32) -> AiResult<String> {
            if max_tokens == 0 {
                return Err(AiError::EmptyResponse);
            }
            Ok(messages
                .iter()
                .filter(|m| m.role == MessageRole::User)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("|"))
        }
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("a").role, MessageRole::System);
        assert_eq!(Message::user("b").role, MessageRole::User);
        assert_eq!(Message::user("c").content, "c");
    }

    #[test]
    fn test_trait_object_dispatch() {
        let backend: Box<dyn ChatCompletion> = Box::new(Echo);
        let messages = [Message::system("sys"), Message::user("one"), Message::user("two")];

        let text = tokio_test::block_on(backend.complete(&messages, 300)).unwrap();
        assert_eq!(text, "one|two");

        let err = tokio_test::block_on(backend.complete(&messages, 0)).unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse));
    }
}
