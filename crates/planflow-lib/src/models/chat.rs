// Chat request/response and progress event models
// Feature: Plan-Execute-Replan Engine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::PastStep;
use super::prompt::Role;

fn new_room_id() -> String {
    Uuid::new_v4().to_string()
}

/// One prior turn of the conversation, serialized as a `[role, text]` pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn(pub Role, pub String);

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self(Role::Assistant, text.into())
    }

    pub fn role(&self) -> Role {
        self.0
    }

    pub fn text(&self) -> &str {
        &self.1
    }
}

/// Inbound chat request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    #[serde(default = "new_room_id")]
    pub room_id: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            room_id: new_room_id(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Final answer for a chat request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub room_id: String,
    pub message: String,
}

/// Result of a full engine run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PneOutcome {
    pub message: String,
    pub past_steps: Vec<PastStep>,
}

/// Progress event emitted by the streaming engine
#[derive(Debug, Clone, PartialEq)]
pub enum PneEvent {
    /// The initial plan is being produced
    Planning,
    /// A step is about to run
    Executing { task: String },
    /// One piece of the final answer
    Stream { chunk: String },
    /// Terminal event carrying the full answer
    Done { message: String },
}

/// Wire payload of a progress event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPayload {
    pub message: String,
    pub contents: Option<String>,
}

impl PneEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            PneEvent::Planning => "planning",
            PneEvent::Executing { .. } => "executing",
            PneEvent::Stream { .. } => "stream",
            PneEvent::Done { .. } => "Done",
        }
    }

    pub fn payload(&self) -> EventPayload {
        match self {
            PneEvent::Planning => EventPayload {
                message: "planning".to_string(),
                contents: None,
            },
            PneEvent::Executing { task } => EventPayload {
                message: "executing".to_string(),
                contents: Some(task.clone()),
            },
            PneEvent::Stream { chunk } => EventPayload {
                message: chunk.clone(),
                contents: None,
            },
            PneEvent::Done { message } => EventPayload {
                message: "Done".to_string(),
                contents: Some(message.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: ChatRequest = serde_json::from_value(json!({ "question": "hi" })).unwrap();
        assert!(Uuid::parse_str(&request.room_id).is_ok());
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_request_history_pairs() {
        let request: ChatRequest = serde_json::from_value(json!({
            "question": "and then?",
            "roomId": "room-1",
            "history": [["user", "hello"], ["assistant", "hi! how can i help you?"]]
        }))
        .unwrap();

        assert_eq!(request.room_id, "room-1");
        assert_eq!(request.history[1].role(), Role::Assistant);
        assert_eq!(request.history[1].text(), "hi! how can i help you?");
    }

    #[test]
    fn test_event_payloads() {
        let executing = PneEvent::Executing {
            task: "look up user".to_string(),
        };
        assert_eq!(executing.name(), "executing");
        assert_eq!(executing.payload().contents.as_deref(), Some("look up user"));

        let done = PneEvent::Done {
            message: "all set".to_string(),
        };
        assert_eq!(done.name(), "Done");
        assert_eq!(
            serde_json::to_value(done.payload()).unwrap(),
            json!({ "message": "Done", "contents": "all set" })
        );
    }
}
