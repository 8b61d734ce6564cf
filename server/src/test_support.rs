// In-memory provider and tool gateway for route tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};

use planflow_lib::services::llm::{StructuredFormat, StructuredOutput, TextStream};
use planflow_lib::services::mcp_client::{filter_by_tags, ToolGatewayResult};
use planflow_lib::{
    AvailableTool, ConversationContext, LlmError, LlmProvider, LlmResult, OutputItem,
    OutputMessage, PromptTemplates, ToolGateway, ToolGatewayError, ToolInvocation,
};

use crate::state::AppState;

/// One scripted provider answer
pub enum Scripted {
    /// Structured output text
    Action(Value),
    /// Assistant message returned by a proposal turn
    Proposal(String),
}

struct ScriptLlm {
    script: Mutex<VecDeque<Scripted>>,
}

impl ScriptLlm {
    fn next(&self) -> LlmResult<Scripted> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::ApiError("script exhausted".to_string()))
    }
}

#[async_trait]
impl LlmProvider for ScriptLlm {
    fn name(&self) -> &str {
        "Script"
    }

    fn model(&self) -> &str {
        "script"
    }

    async fn propose_tool_calls(&self, _ctx: &ConversationContext) -> LlmResult<Vec<OutputItem>> {
        match self.next()? {
            Scripted::Proposal(text) => Ok(vec![OutputItem::assistant_message(text)]),
            Scripted::Action(_) => Err(LlmError::ApiError("expected a proposal".to_string())),
        }
    }

    async fn complete_chat(&self, _ctx: &ConversationContext) -> LlmResult<Option<OutputMessage>> {
        Ok(None)
    }

    async fn stream_chat(&self, _ctx: &ConversationContext) -> LlmResult<TextStream> {
        Ok(Box::pin(stream::empty()))
    }

    async fn structured_complete(
        &self,
        _ctx: &ConversationContext,
        _format: &StructuredFormat,
        _with_tools: bool,
    ) -> LlmResult<StructuredOutput> {
        match self.next()? {
            Scripted::Action(value) => Ok(StructuredOutput {
                text: Some(value.to_string()),
                tool_items: Vec::new(),
            }),
            Scripted::Proposal(_) => Err(LlmError::ApiError("expected an action".to_string())),
        }
    }
}

struct StaticTools {
    tools: Vec<AvailableTool>,
}

#[async_trait]
impl ToolGateway for StaticTools {
    async fn discover(&self, tags: &[String]) -> ToolGatewayResult<Vec<AvailableTool>> {
        Ok(filter_by_tags(self.tools.clone(), tags))
    }

    async fn invoke_all(&self, calls: &[ToolInvocation]) -> Vec<ToolGatewayResult<Vec<String>>> {
        calls
            .iter()
            .map(|call| Err(ToolGatewayError::UnknownTool(call.function_name.clone())))
            .collect()
    }
}

pub fn test_state(script: Vec<Scripted>) -> Arc<AppState> {
    let llm = Arc::new(ScriptLlm {
        script: Mutex::new(script.into()),
    });
    let tools = Arc::new(StaticTools {
        tools: vec![
            AvailableTool::new("add", "Add two numbers", json!({ "type": "object", "properties": {} }))
                .with_tags(["alpha"]),
            AvailableTool::new(
                "get_user_name",
                "Look up a user's name",
                json!({ "type": "object", "properties": { "user_id": { "type": "string" } } }),
            )
            .with_tags(["beta"]),
        ],
    });
    Arc::new(AppState::new(llm, tools, PromptTemplates::default(), Vec::new()))
}
