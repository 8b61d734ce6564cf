// Structured decisions
// Feature: Plan-Execute-Replan Engine

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::executor::execute_pending_tool_calls;
use crate::error::{PneError, PneResult};
use crate::services::context::ConversationContext;
use crate::services::llm::{LlmProvider, StructuredFormat};
use crate::services::mcp_client::ToolGateway;

/// Ask for a value of type `T` with tools attached.
///
/// Function calls surfaced by the first call are routed into `ctx` and
/// executed, then the call is re-issued without tools to obtain the value.
pub(crate) async fn decide<T>(
    llm: &dyn LlmProvider,
    gateway: &dyn ToolGateway,
    ctx: &mut ConversationContext,
    room_id: &str,
) -> PneResult<T>
where
    T: JsonSchema + DeserializeOwned,
{
    let format = StructuredFormat::of::<T>();
    let mut output = llm.structured_complete(ctx, &format, true).await?;

    if output.has_function_calls() {
        log::info!(
            "[pne:{}] {} decision requested tool calls, executing before retry",
            room_id,
            format.name
        );
        ctx.extend(std::mem::take(&mut output.tool_items));
        execute_pending_tool_calls(gateway, ctx, room_id).await?;
        output = llm.structured_complete(ctx, &format, false).await?;
    }

    match output.decode::<T>() {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(PneError::StructuredParse(format!(
            "{}: provider returned no message",
            format.name
        ))),
        Err(e) => Err(PneError::StructuredParse(format!("{}: {}", format.name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, OutputItem, Response};
    use crate::services::llm::StructuredOutput;
    use crate::test_support::{FakeToolGateway, LlmCall, ScriptedLlm};

    #[tokio::test]
    async fn test_function_calls_are_executed_then_retried_without_tools() {
        let llm = ScriptedLlm::new()
            .with_structured(StructuredOutput {
                text: None,
                tool_items: vec![OutputItem::function_call("call_1", "add", "{\"a\":1,\"b\":2}")],
            })
            .with_response("3");
        let gateway = FakeToolGateway::new().with_result("add", &["3"]);
        let mut ctx = ConversationContext::new();

        let response: Response = decide(&llm, &gateway, &mut ctx, "room").await.unwrap();
        assert_eq!(response.message, "3");
        assert_eq!(gateway.invocations().len(), 1);

        let flags: Vec<bool> = llm
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                LlmCall::Structured { with_tools, .. } => Some(with_tools),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![true, false]);
        assert_eq!(ctx.to_wire_format().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_message_is_parse_failure() {
        let llm = ScriptedLlm::new().with_structured(StructuredOutput::default());
        let gateway = FakeToolGateway::new();
        let mut ctx = ConversationContext::new();

        let err = decide::<Action>(&llm, &gateway, &mut ctx, "room").await.unwrap_err();
        assert!(matches!(err, PneError::StructuredParse(_)));
    }

    #[tokio::test]
    async fn test_unknown_discriminator_is_parse_failure() {
        let llm = ScriptedLlm::new().with_structured(StructuredOutput {
            text: Some(r#"{"response":{"type":"maybe","message":"?"}}"#.to_string()),
            tool_items: Vec::new(),
        });
        let gateway = FakeToolGateway::new();
        let mut ctx = ConversationContext::new();

        let err = decide::<Action>(&llm, &gateway, &mut ctx, "room").await.unwrap_err();
        assert!(matches!(err, PneError::StructuredParse(message) if message.starts_with("Action")));
    }
}
