// LLM Gateway
// Feature: LLM Gateway
//
// Wraps the LLM provider behind four operations used by the engine and the
// chat service. The provider is built explicitly from configuration and
// shared as `Arc<dyn LlmProvider>`.

pub mod error;
pub mod openai;
pub mod stream;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{LlmError, LlmErrorCode, LlmResult};
pub use openai::OpenAIProvider;

use crate::models::{LlmConfig, OutputItem, OutputMessage};
use crate::services::context::ConversationContext;

/// Finite, single-pass stream of text chunks
pub type TextStream = BoxStream<'static, LlmResult<String>>;

/// Named JSON schema the provider output is constrained to
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFormat {
    pub name: String,
    pub schema: Value,
}

impl StructuredFormat {
    pub fn of<T: JsonSchema>() -> Self {
        let mut schema = Value::from(schemars::schema_for!(T));
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
        }
        Self {
            name: T::schema_name().to_string(),
            schema,
        }
    }
}

/// Result of a structured completion.
///
/// `text` is the raw JSON text of the first message item, if the model
/// produced one. Function calls (and any items that must be replayed with
/// them) are surfaced separately in `tool_items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredOutput {
    pub text: Option<String>,
    pub tool_items: Vec<OutputItem>,
}

impl StructuredOutput {
    pub fn has_function_calls(&self) -> bool {
        self.tool_items.iter().any(OutputItem::is_function_call)
    }

    /// Decode the message text; `Ok(None)` when no message was produced
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.text
            .as_deref()
            .map(serde_json::from_str::<T>)
            .transpose()
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// One call with instruction, transcript and tool schemas.
    /// Returns the raw output items, messages and function calls mixed.
    async fn propose_tool_calls(&self, ctx: &ConversationContext) -> LlmResult<Vec<OutputItem>>;

    /// One call without tools; the first message item, if any
    async fn complete_chat(&self, ctx: &ConversationContext) -> LlmResult<Option<OutputMessage>>;

    /// Streaming call without tools. Yields "" when the response starts,
    /// then each text delta, and ends on completion.
    async fn stream_chat(&self, ctx: &ConversationContext) -> LlmResult<TextStream>;

    /// One call whose output is constrained to `format`
    async fn structured_complete(
        &self,
        ctx: &ConversationContext,
        format: &StructuredFormat,
        with_tools: bool,
    ) -> LlmResult<StructuredOutput>;
}

/// Shared provider handle
pub type SharedLlmProvider = Arc<dyn LlmProvider>;

/// Build the provider from configuration.
///
/// # Arguments
/// * `config` - LLM settings (endpoint, model, temperature, timeout)
/// * `api_key` - The API key, required for OpenAI
pub fn create_provider(config: &LlmConfig, api_key: Option<String>) -> LlmResult<SharedLlmProvider> {
    let key = api_key
        .ok_or_else(|| LlmError::InvalidConfig("OpenAI requires an API key".to_string()))?;
    if key.is_empty() {
        return Err(LlmError::InvalidConfig("OpenAI API key cannot be empty".to_string()));
    }
    Ok(Arc::new(OpenAIProvider::new(config.clone(), key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Response};

    #[test]
    fn test_create_provider_requires_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            create_provider(&config, None),
            Err(LlmError::InvalidConfig(_))
        ));
        assert!(matches!(
            create_provider(&config, Some(String::new())),
            Err(LlmError::InvalidConfig(_))
        ));

        let provider = create_provider(&config, Some("sk-test".to_string())).unwrap();
        assert_eq!(provider.name(), "OpenAI");
        assert_eq!(provider.model(), "gpt-5-mini");
    }

    #[test]
    fn test_structured_format_of_response() {
        let format = StructuredFormat::of::<Response>();
        assert_eq!(format.name, "Response");
        assert!(format.schema.get("$schema").is_none());
        assert_eq!(format.schema["type"], "object");
        assert!(format.schema["properties"].get("message").is_some());
    }

    #[test]
    fn test_structured_output_decode() {
        let output = StructuredOutput {
            text: Some(r#"{"response":{"type":"response","message":"done"}}"#.to_string()),
            tool_items: Vec::new(),
        };
        let action: Option<Action> = output.decode().unwrap();
        assert_eq!(action, Some(Action::respond("done")));

        let empty = StructuredOutput::default();
        assert_eq!(empty.decode::<Action>().unwrap(), None);

        let broken = StructuredOutput {
            text: Some("not json".to_string()),
            tool_items: Vec::new(),
        };
        assert!(broken.decode::<Action>().is_err());
    }
}
