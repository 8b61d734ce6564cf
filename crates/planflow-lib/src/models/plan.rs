// Plan-execute-replan data models
// Feature: Plan-Execute-Replan Engine
//
// The structured values the LLM is constrained to emit at every decision
// point. JSON schemas for them are generated with schemars.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a step is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    ToolCall,
    Assistant,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::ToolCall => "tool_call",
            StepKind::Assistant => "assistant",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool_call" => Ok(StepKind::ToolCall),
            "assistant" => Ok(StepKind::Assistant),
            other => Err(other.to_string()),
        }
    }
}

/// A single step in a multi-step plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Step {
    /// Detailed description of the task this step accomplishes
    pub task: String,
    /// How to carry out the step: `tool_call` when a tool must be invoked,
    /// `assistant` when the answer can be produced directly
    pub kind: String,
}

impl Step {
    pub fn new(task: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            kind: kind.into(),
        }
    }

    pub fn tool_call(task: impl Into<String>) -> Self {
        Self::new(task, StepKind::ToolCall.as_str())
    }

    pub fn assistant(task: impl Into<String>) -> Self {
        Self::new(task, StepKind::Assistant.as_str())
    }

    /// Validated kind; the raw string is returned on failure
    pub fn step_kind(&self) -> Result<StepKind, String> {
        self.kind.parse()
    }
}

/// Ordered list of steps, executed first to last
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Plan {
    /// Steps to execute in sequential order
    pub steps: Vec<Step>,
}

/// Final answer returned to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Response {
    /// The response message
    pub message: String,
}

impl Response {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Either a plan to follow or the final response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    Plan(Plan),
    Response(Response),
}

/// The LLM's structured decision at each planning checkpoint.
///
/// Use `Plan` when further steps are needed to answer, `Response` when the
/// answer can be returned to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Action {
    /// Plan or Response to this action
    pub response: Decision,
}

impl Action {
    pub fn plan(steps: Vec<Step>) -> Self {
        Self {
            response: Decision::Plan(Plan { steps }),
        }
    }

    pub fn respond(message: impl Into<String>) -> Self {
        Self {
            response: Decision::Response(Response::new(message)),
        }
    }
}

/// A completed step and the message it produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PastStep {
    pub task: String,
    pub result: String,
}

impl PastStep {
    pub fn new(task: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            result: result.into(),
        }
    }
}
