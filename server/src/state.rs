// Shared server state
// Built once at startup from configuration and shared by every handler.

use std::sync::Arc;

use planflow_lib::{
    create_provider, AppConfig, ChatService, LlmProvider, McpToolGateway, PlanExecuteEngine,
    PneResult, PromptTemplates, ToolGateway,
};

pub struct AppState {
    pub engine: Arc<PlanExecuteEngine>,
    pub chat: ChatService,
    pub tools: Arc<dyn ToolGateway>,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolGateway>,
        prompts: PromptTemplates,
        tool_tags: Vec<String>,
    ) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            engine: Arc::new(PlanExecuteEngine::new(
                llm.clone(),
                tools.clone(),
                prompts.clone(),
                tool_tags.clone(),
            )),
            chat: ChatService::new(llm, tools.clone(), prompts, tool_tags),
            tools,
        }
    }

    /// Build the provider, tool gateway and prompts from configuration
    pub fn from_config(config: &AppConfig, api_key: String) -> PneResult<Self> {
        let prompts = PromptTemplates::from_config(&config.prompts)?;
        let llm = create_provider(&config.llm, Some(api_key))?;
        let tools: Arc<dyn ToolGateway> = Arc::new(McpToolGateway::new(config.tool_servers.clone()));

        log::info!(
            "[server] Using {} model {} with {} tool servers",
            llm.name(),
            llm.model(),
            config.tool_servers.len()
        );

        Ok(Self::new(llm, tools, prompts, config.engine.tool_tags.clone()))
    }
}
