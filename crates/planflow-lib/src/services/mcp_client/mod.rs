// Remote Tool Gateway
// Feature: Remote Tool Gateway
//
// Discovers and invokes tools hosted on remote MCP servers. The engine only
// sees the `ToolGateway` trait; `McpToolGateway` is the streamable HTTP
// implementation.

pub mod error;
pub mod mcp;

use std::slice;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use error::{ToolGatewayError, ToolGatewayErrorCode, ToolGatewayResult};
pub use mcp::McpToolGateway;

use crate::models::{AvailableTool, ToolCall};

/// A single tool call to run on a remote server
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub call_id: String,
    pub function_name: String,
    pub arguments: Map<String, Value>,
}

impl From<&ToolCall> for ToolInvocation {
    fn from(call: &ToolCall) -> Self {
        Self {
            call_id: call.call_id.clone(),
            function_name: call.function_name.clone(),
            arguments: call.arguments.clone(),
        }
    }
}

#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// List tools on every configured server, keeping those with at least
    /// one of `tags` (all of them when `tags` is empty)
    async fn discover(&self, tags: &[String]) -> ToolGatewayResult<Vec<AvailableTool>>;

    /// Run a batch concurrently. Results are index-aligned with `calls`;
    /// a failing call never affects its siblings.
    async fn invoke_all(&self, calls: &[ToolInvocation]) -> Vec<ToolGatewayResult<Vec<String>>>;

    /// Run a single call
    async fn invoke(&self, call: &ToolInvocation) -> ToolGatewayResult<Vec<String>> {
        self.invoke_all(slice::from_ref(call))
            .await
            .pop()
            .unwrap_or_else(|| Err(ToolGatewayError::UnknownTool(call.function_name.clone())))
    }
}

/// Keep tools carrying at least one of `tags`; empty `tags` keeps all
pub fn filter_by_tags(tools: Vec<AvailableTool>, tags: &[String]) -> Vec<AvailableTool> {
    if tags.is_empty() {
        return tools;
    }
    tools.into_iter().filter(|tool| tool.has_any_tag(tags)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tools() -> Vec<AvailableTool> {
        vec![
            AvailableTool::new("add", "", json!({})).with_tags(["alpha"]),
            AvailableTool::new("get_user_name", "", json!({})).with_tags(["beta", "users"]),
            AvailableTool::new("untagged", "", json!({})),
        ]
    }

    fn names(tools: &[AvailableTool]) -> Vec<&str> {
        tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    #[test]
    fn test_empty_tags_keep_everything() {
        assert_eq!(filter_by_tags(tools(), &[]).len(), 3);
    }

    #[test]
    fn test_tags_are_or_matched() {
        let filtered = filter_by_tags(tools(), &["alpha".to_string(), "users".to_string()]);
        assert_eq!(names(&filtered), vec!["add", "get_user_name"]);

        let filtered = filter_by_tags(tools(), &["gamma".to_string()]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_invocation_from_tool_call() {
        let mut arguments = Map::new();
        arguments.insert("user_id".to_string(), json!("M4386"));
        let call = ToolCall::new("call_1", "get_user_name", arguments.clone());

        let invocation = ToolInvocation::from(&call);
        assert_eq!(invocation.call_id, "call_1");
        assert_eq!(invocation.arguments, arguments);
    }
}
