use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use super::types::*;
use crate::error::{AiError, AiResult};
use crate::util::truncate_to_char_boundary;

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Longest slice of a raw error body carried into an `AiError`.
const MAX_ERROR_BODY_BYTES: usize = 500;

pub(crate) struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, timeout: Option<Duration>) -> AiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            http,
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> AiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiError::Config(format!("Invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> AiResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, messages = request.messages.len(), "OpenAI chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(classify_error_response(status, &error_text));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a non-success HTTP response onto the typed error taxonomy.
///
/// A body code of `invalid_api_key` is an auth failure even when a proxy
/// rewrites the status.
pub(crate) fn classify_error_response(status: StatusCode, body: &str) -> AiError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let message = match &parsed {
        Some(envelope) if !envelope.error.message.is_empty() => envelope.error.message.clone(),
        _ => truncate_to_char_boundary(body.trim(), MAX_ERROR_BODY_BYTES).to_string(),
    };
    let code = parsed.as_ref().and_then(|e| e.error.code_str());

    if status == StatusCode::UNAUTHORIZED || code == Some("invalid_api_key") {
        return AiError::Auth(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return AiError::RateLimited(message);
    }

    AiError::Api {
        status: status.as_u16(),
        message,
    }
}
