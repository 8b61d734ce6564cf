// Request-level Error Types
// Feature: Plan-Execute-Replan Engine
//
// Every failure that aborts a chat request. Lower layers keep their own
// error enums and are wrapped here.

use std::fmt;

use thiserror::Error;

use crate::services::context::ContextError;
use crate::services::llm::LlmError;
use crate::services::mcp_client::ToolGatewayError;
use crate::utils::config::ConfigError;

/// A failed call of a tool batch, attributed to its call id
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallFailure {
    pub call_id: String,
    pub function_name: String,
    pub error: ToolGatewayError,
}

impl fmt::Display for ToolCallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.function_name, self.call_id, self.error)
    }
}

fn join_failures(failures: &[ToolCallFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum PneError {
    /// Tool servers could not be listed
    #[error("Tool discovery failed: {0}")]
    ToolDiscovery(ToolGatewayError),

    /// One or more calls of a batch failed
    #[error("Tool invocation failed: {}", join_failures(.0))]
    ToolInvocation(Vec<ToolCallFailure>),

    /// Provider output did not match the requested schema
    #[error("Structured output could not be parsed: {0}")]
    StructuredParse(String),

    #[error("No assistant message to use as step result")]
    MissingAssistantMessage,

    #[error("Unknown step kind: {0}")]
    UnknownStepKind(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ContextError> for PneError {
    fn from(_: ContextError) -> Self {
        PneError::MissingAssistantMessage
    }
}

pub type PneResult<T> = Result<T, PneError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PneErrorCode {
    ToolDiscovery,
    ToolInvocation,
    StructuredParse,
    MissingAssistantMessage,
    UnknownStepKind,
    Llm,
    Config,
}

impl PneErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PneErrorCode::ToolDiscovery => "PNE_TOOL_DISCOVERY",
            PneErrorCode::ToolInvocation => "PNE_TOOL_INVOCATION",
            PneErrorCode::StructuredParse => "PNE_STRUCTURED_PARSE",
            PneErrorCode::MissingAssistantMessage => "PNE_MISSING_ASSISTANT_MESSAGE",
            PneErrorCode::UnknownStepKind => "PNE_UNKNOWN_STEP_KIND",
            PneErrorCode::Llm => "PNE_LLM",
            PneErrorCode::Config => "PNE_CONFIG",
        }
    }
}

impl PneError {
    pub fn code(&self) -> PneErrorCode {
        match self {
            PneError::ToolDiscovery(_) => PneErrorCode::ToolDiscovery,
            PneError::ToolInvocation(_) => PneErrorCode::ToolInvocation,
            PneError::StructuredParse(_) => PneErrorCode::StructuredParse,
            PneError::MissingAssistantMessage => PneErrorCode::MissingAssistantMessage,
            PneError::UnknownStepKind(_) => PneErrorCode::UnknownStepKind,
            PneError::Llm(_) => PneErrorCode::Llm,
            PneError::Config(_) => PneErrorCode::Config,
        }
    }

    /// Whether the failure originated in an upstream service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PneError::ToolDiscovery(_) | PneError::ToolInvocation(_) | PneError::Llm(_)
        )
    }
}
