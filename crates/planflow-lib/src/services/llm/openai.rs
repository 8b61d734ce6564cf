// OpenAI Provider Implementation
// Feature: LLM Gateway
//
// Talks to the OpenAI Responses API (`POST {endpoint}/responses`).
// Requires API key.
// Default endpoint: https://api.openai.com/v1

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use reqwest_eventsource::RequestBuilderExt;

use super::stream::into_text_stream;
use super::types::{ApiErrorBody, ResponsesRequest, ResponsesResponse, TextConfig, TextFormat};
use super::{LlmError, LlmProvider, LlmResult, StructuredFormat, StructuredOutput, TextStream};
use crate::models::{LlmConfig, OutputItem, OutputMessage};
use crate::services::context::ConversationContext;

/// OpenAI Provider
pub struct OpenAIProvider {
    config: LlmConfig,
    client: Client,
    api_key: String,
}

impl OpenAIProvider {
    pub fn new(config: LlmConfig, api_key: String) -> LlmResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::InvalidConfig(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        format!("{}{}", base, path)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn build_request(
        &self,
        ctx: &ConversationContext,
        with_tools: bool,
        format: Option<&StructuredFormat>,
        stream: bool,
    ) -> ResponsesRequest {
        ResponsesRequest {
            model: self.config.model.clone(),
            instructions: ctx.instruction().map(str::to_string),
            input: ctx.to_wire_format(),
            tools: if with_tools {
                ctx.available_tool_schemas()
            } else {
                Vec::new()
            },
            temperature: self.config.temperature,
            text: format.map(|format| TextConfig {
                format: TextFormat {
                    kind: "json_schema",
                    name: format.name.clone(),
                    schema: format.schema.clone(),
                    strict: false,
                },
            }),
            stream,
        }
    }

    /// Map a non-success response body onto the gateway error kinds
    fn map_error_response(&self, status: StatusCode, body: &str) -> LlmError {
        if let Ok(error) = serde_json::from_str::<ApiErrorBody>(body) {
            let error_type = error.error.error_type.as_deref().unwrap_or("");
            let code = error.error.code.as_deref().unwrap_or("");

            if status.as_u16() == 401 || error_type == "invalid_api_key" || code == "invalid_api_key" {
                return LlmError::AuthFailed(error.error.message);
            }

            if status.as_u16() == 429 || code == "rate_limit_exceeded" {
                return LlmError::RateLimited;
            }

            if code == "model_not_found" || error.error.message.contains("does not exist") {
                return LlmError::ModelNotFound(self.config.model.clone());
            }

            if code == "context_length_exceeded" || error.error.message.contains("maximum context length") {
                return LlmError::TokenLimitExceeded(error.error.message);
            }

            return LlmError::ApiError(error.error.message);
        }

        match status.as_u16() {
            401 => LlmError::AuthFailed("Invalid API key".to_string()),
            429 => LlmError::RateLimited,
            _ => LlmError::ApiError(format!("OpenAI API error ({}): {}", status, body)),
        }
    }

    async fn send(&self, request: &ResponsesRequest) -> LlmResult<Vec<OutputItem>> {
        let response = self
            .client
            .post(self.api_url("/responses"))
            .headers(self.auth_headers())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_error_response(status, &body));
        }

        let body: ResponsesResponse = response.json().await?;
        parse_output(body)
    }
}

fn parse_output(body: ResponsesResponse) -> LlmResult<Vec<OutputItem>> {
    if let Some(error) = body.error {
        return Err(LlmError::ApiError(error.message));
    }
    Ok(body.output.into_iter().map(OutputItem::from_value).collect())
}

fn split_structured(items: Vec<OutputItem>) -> StructuredOutput {
    let mut output = StructuredOutput::default();
    for item in items {
        match item {
            OutputItem::Message(message) => {
                if output.text.is_none() {
                    output.text = Some(message.text());
                }
            }
            other => output.tool_items.push(other),
        }
    }
    // reasoning items only matter when replayed alongside function calls
    if !output.has_function_calls() {
        output.tool_items.clear();
    }
    output
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn propose_tool_calls(&self, ctx: &ConversationContext) -> LlmResult<Vec<OutputItem>> {
        let request = self.build_request(ctx, true, None, false);
        let items = self.send(&request).await?;
        log::debug!(
            "[llm] Proposal returned {} items ({} function calls)",
            items.len(),
            items.iter().filter(|item| item.is_function_call()).count()
        );
        Ok(items)
    }

    async fn complete_chat(&self, ctx: &ConversationContext) -> LlmResult<Option<OutputMessage>> {
        let request = self.build_request(ctx, false, None, false);
        let items = self.send(&request).await?;
        Ok(items
            .iter()
            .find_map(OutputItem::as_message)
            .map(OutputMessage::from))
    }

    async fn stream_chat(&self, ctx: &ConversationContext) -> LlmResult<TextStream> {
        let request = self.build_request(ctx, false, None, true);
        let source = self
            .client
            .post(self.api_url("/responses"))
            .headers(self.auth_headers())
            .json(&request)
            .eventsource()
            .map_err(|e| LlmError::Stream(e.to_string()))?;
        Ok(into_text_stream(source))
    }

    async fn structured_complete(
        &self,
        ctx: &ConversationContext,
        format: &StructuredFormat,
        with_tools: bool,
    ) -> LlmResult<StructuredOutput> {
        let request = self.build_request(ctx, with_tools, Some(format), false);
        let items = self.send(&request).await?;
        Ok(split_structured(items))
    }
}
