// MCP Tool Gateway
// Feature: Remote Tool Gateway
//
// Streamable HTTP MCP client over every configured tool server.
// Sessions are opened per discovery or per batch and cancelled afterwards.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::future::join_all;
use rmcp::model::CallToolRequestParam;
use rmcp::service::RunningService;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;

use super::{filter_by_tags, ToolGateway, ToolGatewayError, ToolGatewayResult, ToolInvocation};
use crate::models::{AvailableTool, ToolServerConfig};

type McpSession = RunningService<RoleClient, ()>;

/// An open session plus the tools its server advertises
struct ConnectedServer {
    name: String,
    session: McpSession,
    tools: Vec<AvailableTool>,
}

pub struct McpToolGateway {
    servers: Vec<ToolServerConfig>,
}

impl McpToolGateway {
    pub fn new(servers: Vec<ToolServerConfig>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[ToolServerConfig] {
        &self.servers
    }

    async fn connect(server: &ToolServerConfig) -> ToolGatewayResult<ConnectedServer> {
        let transport = StreamableHttpClientTransport::from_uri(server.url.clone());
        let session = ().serve(transport).await.map_err(|e| ToolGatewayError::Connect {
            server: server.name.clone(),
            message: e.to_string(),
        })?;

        let listed = match session.list_all_tools().await {
            Ok(listed) => listed,
            Err(e) => {
                let _ = session.cancel().await;
                return Err(ToolGatewayError::Connect {
                    server: server.name.clone(),
                    message: format!("list_tools failed: {}", e),
                });
            }
        };

        let tools = listed
            .iter()
            .filter_map(|tool| serde_json::to_value(tool).ok())
            .filter_map(|value| AvailableTool::from_mcp_value(&value))
            .collect::<Vec<_>>();

        log::debug!(
            "[mcp] Connected to '{}' ({}), {} tools",
            server.name,
            server.url,
            tools.len()
        );

        Ok(ConnectedServer {
            name: server.name.clone(),
            session,
            tools,
        })
    }

    /// Connect to every server concurrently; unreachable servers are logged and skipped
    async fn connect_all(&self) -> (Vec<ConnectedServer>, Vec<ToolGatewayError>) {
        let results = join_all(self.servers.iter().map(Self::connect)).await;

        let mut connected = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(server) => connected.push(server),
                Err(e) => {
                    log::warn!("[mcp] {}", e);
                    failures.push(e);
                }
            }
        }
        (connected, failures)
    }

    async fn disconnect_all(servers: Vec<ConnectedServer>) {
        for server in servers {
            if let Err(e) = server.session.cancel().await {
                log::debug!("[mcp] Closing session for '{}' failed: {}", server.name, e);
            }
        }
    }

    async fn call(server: &ConnectedServer, call: &ToolInvocation) -> ToolGatewayResult<Vec<String>> {
        let params = CallToolRequestParam {
            name: call.function_name.clone().into(),
            arguments: Some(call.arguments.clone()),
        };

        let result = server
            .session
            .call_tool(params)
            .await
            .map_err(|e| ToolGatewayError::Invocation {
                tool: call.function_name.clone(),
                message: e.to_string(),
            })?;

        let envelope = serde_json::to_value(&result).map_err(|e| ToolGatewayError::Invocation {
            tool: call.function_name.clone(),
            message: e.to_string(),
        })?;
        let (fragments, is_error) = extract_text_fragments(&envelope);

        if is_error {
            return Err(ToolGatewayError::ToolReported {
                tool: call.function_name.clone(),
                message: fragments.join("\n"),
            });
        }

        log::debug!(
            "[mcp] {} ({}) on '{}' returned {} fragments",
            call.function_name,
            call.call_id,
            server.name,
            fragments.len()
        );
        Ok(fragments)
    }
}

/// Text fragments of a `CallToolResult` envelope and its `isError` flag
pub(crate) fn extract_text_fragments(envelope: &Value) -> (Vec<String>, bool) {
    let fragments = envelope
        .get("content")
        .and_then(Value::as_array)
        .map(|content| {
            content
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let is_error = envelope
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    (fragments, is_error)
}

/// Tool name to index of the first server advertising it
fn route_table<'a, I>(servers: I) -> HashMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a [AvailableTool]>,
{
    let mut routes = HashMap::new();
    for (index, tools) in servers.into_iter().enumerate() {
        for tool in tools {
            routes.entry(tool.name.as_str()).or_insert(index);
        }
    }
    routes
}

/// Tools of every server, one per name; the first server wins as in routing
fn merge_tools<'a, I>(servers: I) -> Vec<AvailableTool>
where
    I: IntoIterator<Item = &'a [AvailableTool]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for (index, tools) in servers.into_iter().enumerate() {
        for tool in tools {
            if seen.insert(tool.name.as_str()) {
                merged.push(tool.clone());
            } else {
                log::debug!(
                    "[mcp] '{}' on server #{} shadowed by an earlier server",
                    tool.name,
                    index
                );
            }
        }
    }
    merged
}

/// Server index for each call, index-aligned with `calls`
fn resolve_targets(
    calls: &[ToolInvocation],
    routes: &HashMap<&str, usize>,
    unreachable: usize,
) -> Vec<ToolGatewayResult<usize>> {
    calls
        .iter()
        .map(|call| match routes.get(call.function_name.as_str()) {
            Some(&index) => Ok(index),
            None if unreachable > 0 => Err(ToolGatewayError::Invocation {
                tool: call.function_name.clone(),
                message: format!("not found on reachable servers ({} unreachable)", unreachable),
            }),
            None => Err(ToolGatewayError::UnknownTool(call.function_name.clone())),
        })
        .collect()
}

#[async_trait]
impl ToolGateway for McpToolGateway {
    async fn discover(&self, tags: &[String]) -> ToolGatewayResult<Vec<AvailableTool>> {
        let (connected, failures) = self.connect_all().await;

        if connected.is_empty() && !failures.is_empty() {
            let reasons = failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolGatewayError::Discovery(reasons));
        }

        let tools = merge_tools(connected.iter().map(|server| server.tools.as_slice()));
        Self::disconnect_all(connected).await;

        let filtered = filter_by_tags(tools, tags);
        log::info!(
            "[mcp] Discovered {} tools (tags: {:?})",
            filtered.len(),
            tags
        );
        Ok(filtered)
    }

    async fn invoke_all(&self, calls: &[ToolInvocation]) -> Vec<ToolGatewayResult<Vec<String>>> {
        if calls.is_empty() {
            return Vec::new();
        }

        let (connected, failures) = self.connect_all().await;
        let targets = {
            let routes = route_table(connected.iter().map(|server| server.tools.as_slice()));
            resolve_targets(calls, &routes, failures.len())
        };

        let servers = &connected;
        let results = join_all(calls.iter().zip(targets).map(|(call, target)| async move {
            match target {
                Ok(index) => Self::call(&servers[index], call).await,
                Err(e) => Err(e),
            }
        }))
        .await;

        Self::disconnect_all(connected).await;
        results
    }
}
