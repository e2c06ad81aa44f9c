//! Anthropic Messages API client for listing copy generation.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::SuggestConfig;

use super::error::{ApiErrorResponse, SuggestError};
use super::types::{ChatRequest, ChatResponse, ContentBlock, Message, SuggestionInput, SuggestionOutput};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

const SYSTEM_PROMPT: &str = "You are an expert copywriter for e-commerce product listings. \
    Respond with a single JSON object containing exactly two string fields: \
    \"product_description\" (a compelling description of a few sentences) and \
    \"product_tagline\" (a catchy one-liner). Do not wrap the JSON in markdown fences \
    or add any other text.";

/// Client for generating listing copy.
#[derive(Clone)]
pub struct SuggestionClient {
    inner: Arc<SuggestionClientInner>,
}

struct SuggestionClientInner {
    client: reqwest::Client,
    model: String,
}

impl SuggestionClient {
    /// Create a new suggestion client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: &SuggestConfig) -> Self {
        let api_key = config.api_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).expect("Invalid API key for header"),
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(SuggestionClientInner {
                client,
                model: config.model.clone(),
            }),
        }
    }

    /// Generate a description and tagline for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, returns an error
    /// response, or answers with something that is not the expected JSON.
    #[instrument(skip(self, input), fields(model = %self.inner.model, product = %input.product_name))]
    pub async fn generate(&self, input: &SuggestionInput) -> Result<SuggestionOutput, SuggestError> {
        let prompt = format!(
            "Template: {}\nProduct name: {}\nProduct category: {}",
            input.template_name, input.product_name, input.product_category
        );

        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
        };

        let response = self
            .inner
            .client
            .post(ANTHROPIC_API_URL)
            .json(&request)
            .send()
            .await?;

        let response = Self::handle_response(response).await?;

        let text = response
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<String>();

        parse_output(&text)
    }

    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, SuggestError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body)
                .map_err(|e| SuggestError::Parse(format!("Failed to parse response: {e}")));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(SuggestError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SuggestError::Unauthorized("Invalid API key".to_string()));
        }

        match response.text().await {
            Ok(body) => {
                if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                    Err(SuggestError::Api {
                        error_type: api_error.error.error_type,
                        message: api_error.error.message,
                    })
                } else {
                    Err(SuggestError::Api {
                        error_type: "unknown".to_string(),
                        message: body,
                    })
                }
            }
            Err(e) => Err(SuggestError::Http(e)),
        }
    }
}

/// Parse the model's answer, tolerating markdown code fences it was asked
/// not to emit.
fn parse_output(text: &str) -> Result<SuggestionOutput, SuggestError> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    serde_json::from_str(trimmed)
        .map_err(|e| SuggestError::Parse(format!("Failed to parse suggestion: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_plain_json() {
        let output = parse_output(
            r#"{"product_description": "A lovely jar.", "product_tagline": "Jar of joy"}"#,
        )
        .expect("parse");
        assert_eq!(output.product_tagline, "Jar of joy");
    }

    #[test]
    fn test_parse_output_fenced_json() {
        let text = "```json\n{\"product_description\": \"d\", \"product_tagline\": \"t\"}\n```";
        let output = parse_output(text).expect("parse");
        assert_eq!(output.product_description, "d");
    }

    #[test]
    fn test_parse_output_rejects_prose() {
        assert!(parse_output("Sure! Here is your copy.").is_err());
    }

    #[test]
    fn test_suggestion_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<SuggestionClient>();
    }

    #[test]
    fn test_suggestion_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SuggestionClient>();
    }
}
