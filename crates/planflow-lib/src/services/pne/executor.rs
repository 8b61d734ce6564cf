// Tool call execution
// Feature: Plan-Execute-Replan Engine
//
// Runs every pending tool call of a context as one concurrent batch and
// attaches the outputs by call id.

use crate::error::{PneError, PneResult, ToolCallFailure};
use crate::services::context::ConversationContext;
use crate::services::mcp_client::{ToolGateway, ToolGatewayError, ToolInvocation};

/// Execute the pending calls of `ctx`. Successful outputs are attached
/// before any failure is reported; all failures of the batch are returned
/// together. Returns the number of calls run.
pub(crate) async fn execute_pending_tool_calls(
    gateway: &dyn ToolGateway,
    ctx: &mut ConversationContext,
    room_id: &str,
) -> PneResult<usize> {
    let invocations: Vec<ToolInvocation> = ctx
        .pending_tool_calls()
        .into_iter()
        .map(ToolInvocation::from)
        .collect();

    if invocations.is_empty() {
        return Ok(0);
    }

    log::info!(
        "[pne:{}] Executing {} tool calls: {}",
        room_id,
        invocations.len(),
        invocations
            .iter()
            .map(|call| call.function_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut results = gateway.invoke_all(&invocations).await.into_iter();
    let mut failures = Vec::new();

    for invocation in &invocations {
        let result = results.next().unwrap_or_else(|| {
            Err(ToolGatewayError::Invocation {
                tool: invocation.function_name.clone(),
                message: "no result returned".to_string(),
            })
        });

        match result {
            Ok(fragments) => {
                log::info!(
                    "[pne:{}] Tool result {} ({}): {:?}",
                    room_id,
                    invocation.function_name,
                    invocation.call_id,
                    fragments
                );
                ctx.attach_output(&invocation.call_id, fragments);
            }
            Err(error) => {
                log::warn!(
                    "[pne:{}] Tool call {} ({}) failed: {}",
                    room_id,
                    invocation.function_name,
                    invocation.call_id,
                    error
                );
                failures.push(ToolCallFailure {
                    call_id: invocation.call_id.clone(),
                    function_name: invocation.function_name.clone(),
                    error,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(invocations.len())
    } else {
        Err(PneError::ToolInvocation(failures))
    }
}
