// Responses API streaming
// Feature: LLM Gateway
//
// Maps server-sent events of a streaming Responses call onto text chunks.

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde_json::Value;

use super::{LlmError, TextStream};

/// What a single provider event means for the text stream
#[derive(Debug, PartialEq)]
pub(crate) enum StreamSignal {
    Chunk(String),
    Finished,
    Ignore,
    Failed(String),
}

/// Classify one event by its `type`, falling back to the SSE event name
pub(crate) fn classify_event(event_name: &str, data: &str) -> StreamSignal {
    let payload: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(_) => return StreamSignal::Ignore,
    };
    let kind = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(event_name);

    match kind {
        "response.created" => StreamSignal::Chunk(String::new()),
        "response.output_text.delta" => StreamSignal::Chunk(
            payload
                .get("delta")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        "response.completed" => StreamSignal::Finished,
        "error" => StreamSignal::Failed(
            payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown stream error")
                .to_string(),
        ),
        "response.failed" => StreamSignal::Failed(
            payload
                .pointer("/response/error/message")
                .and_then(Value::as_str)
                .unwrap_or("response failed")
                .to_string(),
        ),
        _ => StreamSignal::Ignore,
    }
}

fn map_source_error(err: reqwest_eventsource::Error) -> LlmError {
    match err {
        reqwest_eventsource::Error::Transport(e) => LlmError::from(e),
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => match status.as_u16() {
            401 => LlmError::AuthFailed("Invalid API key".to_string()),
            429 => LlmError::RateLimited,
            _ => LlmError::ApiError(format!("OpenAI API error ({})", status)),
        },
        other => LlmError::Stream(other.to_string()),
    }
}

/// Drive an event source until the response completes or fails
pub(crate) fn into_text_stream(mut source: EventSource) -> TextStream {
    Box::pin(async_stream::stream! {
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => match classify_event(&message.event, &message.data) {
                    StreamSignal::Chunk(chunk) => yield Ok(chunk),
                    StreamSignal::Finished => break,
                    StreamSignal::Ignore => {}
                    StreamSignal::Failed(reason) => {
                        log::warn!("[llm] Stream failed: {}", reason);
                        yield Err(LlmError::Stream(reason));
                        break;
                    }
                },
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    yield Err(map_source_error(e));
                    break;
                }
            }
        }
        source.close();
    })
}
