// Tool Gateway Error Types
// Feature: Remote Tool Gateway

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolGatewayError {
    /// Tool server could not be reached
    #[error("Cannot connect to tool server '{server}': {message}")]
    Connect { server: String, message: String },

    /// No tool server could be listed
    #[error("Tool discovery failed: {0}")]
    Discovery(String),

    /// No connected server advertises the tool
    #[error("No tool server hosts tool: {0}")]
    UnknownTool(String),

    /// The call itself failed (transport or protocol)
    #[error("Tool '{tool}' invocation failed: {message}")]
    Invocation { tool: String, message: String },

    /// The server ran the tool and flagged the result as an error
    #[error("Tool '{tool}' reported an error: {message}")]
    ToolReported { tool: String, message: String },
}

pub type ToolGatewayResult<T> = Result<T, ToolGatewayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolGatewayErrorCode {
    Connect,
    Discovery,
    UnknownTool,
    Invocation,
    ToolReported,
}

impl ToolGatewayErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolGatewayErrorCode::Connect => "TOOL_CONNECT_FAILED",
            ToolGatewayErrorCode::Discovery => "TOOL_DISCOVERY_FAILED",
            ToolGatewayErrorCode::UnknownTool => "TOOL_UNKNOWN",
            ToolGatewayErrorCode::Invocation => "TOOL_INVOCATION_FAILED",
            ToolGatewayErrorCode::ToolReported => "TOOL_REPORTED_ERROR",
        }
    }
}

impl ToolGatewayError {
    pub fn code(&self) -> ToolGatewayErrorCode {
        match self {
            ToolGatewayError::Connect { .. } => ToolGatewayErrorCode::Connect,
            ToolGatewayError::Discovery(_) => ToolGatewayErrorCode::Discovery,
            ToolGatewayError::UnknownTool(_) => ToolGatewayErrorCode::UnknownTool,
            ToolGatewayError::Invocation { .. } => ToolGatewayErrorCode::Invocation,
            ToolGatewayError::ToolReported { .. } => ToolGatewayErrorCode::ToolReported,
        }
    }
}
