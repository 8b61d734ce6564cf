// PlanFlow shared library
// Conversation context, LLM gateway, MCP tool gateway and the
// plan-execute-replan engine used by the PlanFlow server.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{PneError, PneErrorCode, PneResult, ToolCallFailure};
pub use models::*;
pub use services::chat::ChatService;
pub use services::context::{ContextError, ContextItem, ConversationContext, PromptEntry};
pub use services::llm::{create_provider, LlmError, LlmProvider, LlmResult, OpenAIProvider};
pub use services::mcp_client::{McpToolGateway, ToolGateway, ToolGatewayError, ToolInvocation};
pub use services::pne::{PlanExecuteEngine, PneEventStream, PneOutcome};
pub use utils::config::ConfigError;
pub use utils::prompt_template::PromptTemplates;
