// Single-turn Chat Service
// Feature: Chat
//
// One proposal turn with tools attached; if the LLM asked for tool calls,
// they are executed and a tool-free completion produces the answer.

use std::sync::Arc;

use crate::error::{PneError, PneResult};
use crate::models::{ChatRequest, ChatResponse, OutputItem, PlainPrompt};
use crate::services::context::ConversationContext;
use crate::services::llm::LlmProvider;
use crate::services::mcp_client::ToolGateway;
use crate::services::pne::executor::execute_pending_tool_calls;
use crate::utils::prompt_template::PromptTemplates;

pub struct ChatService {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolGateway>,
    prompts: Arc<PromptTemplates>,
    tool_tags: Vec<String>,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolGateway>,
        prompts: Arc<PromptTemplates>,
        tool_tags: Vec<String>,
    ) -> Self {
        Self {
            llm,
            tools,
            prompts,
            tool_tags,
        }
    }

    pub async fn run(&self, request: &ChatRequest) -> PneResult<ChatResponse> {
        let room = request.room_id.as_str();
        log::info!("[chat:{}] Request received: {}", room, request.question);

        let tools = self
            .tools
            .discover(&self.tool_tags)
            .await
            .map_err(PneError::ToolDiscovery)?;

        let mut ctx = ConversationContext::new();
        ctx.extend(request.history.iter());
        ctx.append(PlainPrompt::system(self.prompts.chat_system.clone()));
        ctx.append(PlainPrompt::user(request.question.clone()));
        ctx.extend(tools);

        let items = self.llm.propose_tool_calls(&ctx).await?;

        let message = if items.iter().any(OutputItem::is_function_call) {
            ctx.extend(items);
            execute_pending_tool_calls(self.tools.as_ref(), &mut ctx, room).await?;
            self.llm
                .complete_chat(&ctx)
                .await?
                .map(|message| message.text)
        } else {
            items
                .iter()
                .find_map(OutputItem::as_message)
                .map(|message| message.text())
        };

        let message = message
            .filter(|text| !text.is_empty())
            .ok_or(PneError::MissingAssistantMessage)?;
        log::info!("[chat:{}] Answered", room);

        Ok(ChatResponse {
            room_id: request.room_id.clone(),
            message,
        })
    }
}
