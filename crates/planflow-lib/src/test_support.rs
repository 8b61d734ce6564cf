// In-memory fakes of the LLM provider and the tool gateway

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::models::{Action, AvailableTool, OutputItem, OutputMessage, Response};
use crate::services::context::ConversationContext;
use crate::services::llm::{
    LlmError, LlmProvider, LlmResult, StructuredFormat, StructuredOutput, TextStream,
};
use crate::services::mcp_client::{
    ToolGateway, ToolGatewayError, ToolGatewayResult, ToolInvocation,
};

/// A provider call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum LlmCall {
    Propose {
        instruction: Option<String>,
        input_len: usize,
    },
    Complete,
    Stream,
    Structured {
        format: String,
        with_tools: bool,
        instruction: Option<String>,
    },
}

/// LLM provider replaying scripted outputs in order
#[derive(Default)]
pub struct ScriptedLlm {
    structured: Mutex<VecDeque<StructuredOutput>>,
    proposals: Mutex<VecDeque<Vec<OutputItem>>>,
    completions: Mutex<VecDeque<Option<OutputMessage>>>,
    calls: Mutex<Vec<LlmCall>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(self, action: Action) -> Self {
        let text = serde_json::to_string(&action).unwrap();
        self.with_structured(StructuredOutput {
            text: Some(text),
            tool_items: Vec::new(),
        })
    }

    pub fn with_response(self, message: &str) -> Self {
        let text = serde_json::to_string(&Response::new(message)).unwrap();
        self.with_structured(StructuredOutput {
            text: Some(text),
            tool_items: Vec::new(),
        })
    }

    pub fn with_structured(self, output: StructuredOutput) -> Self {
        self.structured.lock().unwrap().push_back(output);
        self
    }

    pub fn with_proposal(self, items: Vec<OutputItem>) -> Self {
        self.proposals.lock().unwrap().push_back(items);
        self
    }

    pub fn with_completion(self, text: Option<&str>) -> Self {
        self.completions
            .lock()
            .unwrap()
            .push_back(text.map(OutputMessage::new));
        self
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: LlmCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn exhausted(what: &str) -> LlmError {
        LlmError::ApiError(format!("script exhausted: no {} left", what))
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn propose_tool_calls(&self, ctx: &ConversationContext) -> LlmResult<Vec<OutputItem>> {
        self.record(LlmCall::Propose {
            instruction: ctx.instruction().map(str::to_string),
            input_len: ctx.to_wire_format().len(),
        });
        self.proposals
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("proposal"))
    }

    async fn complete_chat(&self, _ctx: &ConversationContext) -> LlmResult<Option<OutputMessage>> {
        self.record(LlmCall::Complete);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("completion"))
    }

    async fn stream_chat(&self, _ctx: &ConversationContext) -> LlmResult<TextStream> {
        self.record(LlmCall::Stream);
        let text = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .map(|message| message.text)
            .unwrap_or_default();
        Ok(Box::pin(stream::iter(vec![Ok(String::new()), Ok(text)])))
    }

    async fn structured_complete(
        &self,
        ctx: &ConversationContext,
        format: &StructuredFormat,
        with_tools: bool,
    ) -> LlmResult<StructuredOutput> {
        self.record(LlmCall::Structured {
            format: format.name.clone(),
            with_tools,
            instruction: ctx.instruction().map(str::to_string),
        });
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("structured output"))
    }
}

/// Tool gateway answering from a fixed table keyed by tool name
#[derive(Default)]
pub struct FakeToolGateway {
    tools: Vec<AvailableTool>,
    responses: HashMap<String, ToolGatewayResult<Vec<String>>>,
    invocations: Mutex<Vec<ToolInvocation>>,
    discover_calls: AtomicUsize,
    fail_discovery: bool,
}

impl FakeToolGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: AvailableTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_result(mut self, name: &str, fragments: &[&str]) -> Self {
        self.responses.insert(
            name.to_string(),
            Ok(fragments.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    pub fn with_failure(mut self, name: &str, error: ToolGatewayError) -> Self {
        self.responses.insert(name.to_string(), Err(error));
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn discover_calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolGateway for FakeToolGateway {
    async fn discover(&self, tags: &[String]) -> ToolGatewayResult<Vec<AvailableTool>> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_discovery {
            return Err(ToolGatewayError::Discovery("all servers unreachable".to_string()));
        }
        Ok(crate::services::mcp_client::filter_by_tags(
            self.tools.clone(),
            tags,
        ))
    }

    async fn invoke_all(&self, calls: &[ToolInvocation]) -> Vec<ToolGatewayResult<Vec<String>>> {
        self.invocations.lock().unwrap().extend(calls.iter().cloned());
        calls
            .iter()
            .map(|call| {
                self.responses
                    .get(&call.function_name)
                    .cloned()
                    .unwrap_or_else(|| Err(ToolGatewayError::UnknownTool(call.function_name.clone())))
            })
            .collect()
    }
}
