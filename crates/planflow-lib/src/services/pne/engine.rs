// Plan-Execute-Replan Engine
// Feature: Plan-Execute-Replan Engine
//
// Drives one chat request:
// - Discovers tools and asks for an initial Action
// - Executes the first step of each plan (tool call or direct answer)
// - Replans after every step until the LLM returns a Response
// - Optionally forwards progress events to a streaming consumer

use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::mpsc;

use super::decision::decide;
use super::executor::execute_pending_tool_calls;
use crate::error::{PneError, PneResult};
use crate::models::{
    Action, AvailableTool, ChatRequest, Decision, PastStep, PlainPrompt, PneEvent, PneOutcome,
    Response, Step, StepKind,
};
use crate::services::context::ConversationContext;
use crate::services::llm::LlmProvider;
use crate::services::mcp_client::ToolGateway;
use crate::utils::prompt_template::{format_plan, PromptTemplates};

/// Buffered events between the engine task and the consumer
const EVENT_BUFFER: usize = 64;

/// Progress events of a streaming run; an `Err` item ends the stream
pub type PneEventStream = BoxStream<'static, PneResult<PneEvent>>;

/// Optional event channel. Send failures are ignored so a dropped
/// receiver never stops the run.
struct EventSink(Option<mpsc::Sender<PneResult<PneEvent>>>);

impl EventSink {
    fn none() -> Self {
        Self(None)
    }

    async fn emit(&self, event: PneEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(Ok(event)).await;
        }
    }
}

pub struct PlanExecuteEngine {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolGateway>,
    prompts: Arc<PromptTemplates>,
    tool_tags: Vec<String>,
}

impl PlanExecuteEngine {
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

    /// Run the request to completion and return the final message
    pub async fn complete(&self, request: &ChatRequest) -> PneResult<String> {
        Ok(self.complete_with_trace(request).await?.message)
    }

    /// Run the request to completion, keeping the executed steps
    pub async fn complete_with_trace(&self, request: &ChatRequest) -> PneResult<PneOutcome> {
        self.run(request, &EventSink::none()).await
    }

    /// Run the request on a spawned task and stream its progress.
    ///
    /// Emits `planning`, one `executing` per step, the final message one
    /// character per `stream` event, then `Done`. A failure is sent as the
    /// last item.
    pub fn stream(self: Arc<Self>, request: ChatRequest) -> PneEventStream {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            let sink = EventSink(Some(tx.clone()));
            match self.run(&request, &sink).await {
                Ok(outcome) => {
                    for ch in outcome.message.chars() {
                        sink.emit(PneEvent::Stream {
                            chunk: ch.to_string(),
                        })
                        .await;
                    }
                    sink.emit(PneEvent::Done {
                        message: outcome.message,
                    })
                    .await;
                }
                Err(e) => {
                    log::error!("[pne:{}] Request failed: {}", request.room_id, e);
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Box::pin(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                let failed = item.is_err();
                yield item;
                if failed {
                    break;
                }
            }
        })
    }

    async fn run(&self, request: &ChatRequest, events: &EventSink) -> PneResult<PneOutcome> {
        let room = request.room_id.as_str();
        log::info!("[pne:{}] Request received: {}", room, request.question);

        let tools = self
            .tools
            .discover(&self.tool_tags)
            .await
            .map_err(PneError::ToolDiscovery)?;
        log::info!("[pne:{}] {} tools available", room, tools.len());

        let mut ctx = ConversationContext::new();
        ctx.extend(request.history.iter());
        ctx.append(PlainPrompt::system(self.prompts.render_planning(&request.question)));
        ctx.append(PlainPrompt::user(request.question.clone()));
        ctx.extend(tools.iter().cloned());

        events.emit(PneEvent::Planning).await;
        let mut action: Action = decide(self.llm.as_ref(), self.tools.as_ref(), &mut ctx, room).await?;
        let mut past_steps: Vec<PastStep> = Vec::new();

        loop {
            let plan = match action.response {
                Decision::Response(response) => {
                    log::info!(
                        "[pne:{}] Done after {} steps",
                        room,
                        past_steps.len()
                    );
                    return Ok(PneOutcome {
                        message: response.message,
                        past_steps,
                    });
                }
                Decision::Plan(plan) => plan,
            };
            log::info!("[pne:{}] Current plan:\n{}", room, format_plan(&plan.steps));

            let step = plan
                .steps
                .first()
                .cloned()
                .ok_or_else(|| PneError::StructuredParse("plan contains no steps".to_string()))?;
            let remaining = &plan.steps[1..];
            let kind = step.step_kind().map_err(PneError::UnknownStepKind)?;

            events
                .emit(PneEvent::Executing {
                    task: step.task.clone(),
                })
                .await;
            log::info!("[pne:{}] Executing [{}] {}", room, kind, step.task);

            let result = match kind {
                StepKind::ToolCall => self.execute_tool_step(&mut ctx, &step, room).await?,
                StepKind::Assistant => {
                    self.execute_assistant_step(
                        &mut ctx,
                        request,
                        &plan.steps,
                        &past_steps,
                        &tools,
                        &step,
                    )
                    .await?
                }
            };
            log::debug!("[pne:{}] Step result: {}", room, result);
            past_steps.push(PastStep::new(step.task, result));

            ctx.append(PlainPrompt::system(self.prompts.render_replanning(
                &request.question,
                remaining,
                &past_steps,
            )));
            action = decide(self.llm.as_ref(), self.tools.as_ref(), &mut ctx, room).await?;
        }
    }

    /// Let the LLM pick tool calls for the task on the main context
    async fn execute_tool_step(
        &self,
        ctx: &mut ConversationContext,
        step: &Step,
        room: &str,
    ) -> PneResult<String> {
        ctx.append(PlainPrompt::user(step.task.clone()));
        let start = ctx.entries().len();

        let items = self.llm.propose_tool_calls(ctx).await?;
        ctx.extend(items);

        let executed = execute_pending_tool_calls(self.tools.as_ref(), ctx, room).await?;
        if executed > 0 {
            if let Some(message) = self.llm.complete_chat(ctx).await? {
                ctx.append(PlainPrompt::assistant(message.text));
            }
        }

        ctx.assistant_message_since(start)
            .map(|message| message.content.clone())
            .ok_or(PneError::MissingAssistantMessage)
    }

    /// Answer the task in a scoped context, then record it on the main one
    async fn execute_assistant_step(
        &self,
        ctx: &mut ConversationContext,
        request: &ChatRequest,
        plan: &[Step],
        past_steps: &[PastStep],
        tools: &[AvailableTool],
        step: &Step,
    ) -> PneResult<String> {
        let mut scoped = ConversationContext::new();
        scoped.append(PlainPrompt::system(self.prompts.render_execution(
            &request.question,
            plan,
            past_steps,
            &step.task,
        )));
        scoped.append(PlainPrompt::user(step.task.clone()));
        scoped.extend(tools.iter().cloned());

        let response: Response =
            decide(self.llm.as_ref(), self.tools.as_ref(), &mut scoped, &request.room_id).await?;

        ctx.append(PlainPrompt::user(step.task.clone()));
        ctx.append(PlainPrompt::assistant(response.message.clone()));
        Ok(response.message)
    }
}
