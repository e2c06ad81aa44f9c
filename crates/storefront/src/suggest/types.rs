//! Types for the suggestion API.
//!
//! The wire types match the Anthropic Messages API format, reduced to the
//! non-streaming text-only subset this feature needs.

use serde::{Deserialize, Serialize};

/// What the merchant provides when asking for listing copy.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionInput {
    /// Name of the storefront template the listing will appear in.
    pub template_name: String,
    /// Product name.
    pub product_name: String,
    /// Product category.
    pub product_category: String,
}

/// Generated listing copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionOutput {
    /// Compelling product description, a few sentences.
    pub product_description: String,
    /// Catchy one-line tagline.
    pub product_tagline: String,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// The role of the message sender ("user" or "assistant").
    pub role: String,
    /// Plain text content.
    pub content: String,
}

/// Request body for the Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Response from the Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Response content blocks.
    pub content: Vec<ContentBlock>,
}

/// A content block within a response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
}
