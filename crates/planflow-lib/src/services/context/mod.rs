// Conversation Context
// Feature: Conversation Context
//
// Ordered, append-only log of everything exchanged with the LLM and the tool
// servers during one request:
// - Classifies incoming prompts, provider output items and tools
// - Tracks pending tool calls until their output is attached
// - Serializes the transcript into the provider's `input` array

pub mod schema;

use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{
    AvailableTool, FunctionCallItem, FunctionToolSchema, HistoryTurn, OutputItem, OutputMessage,
    PlainPrompt, Role, ToolCall,
};

/// Context lookup error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Not found in conversation context: {0}")]
    NotFound(String),
}

/// One entry of the transcript, in replay order
#[derive(Debug, Clone, PartialEq)]
pub enum PromptEntry {
    Plain(PlainPrompt),
    /// Provider function-call item, replayed before its output
    FunctionCall(FunctionCallItem),
    ToolCall(ToolCall),
    Output(OutputMessage),
    /// Any other provider item, passed through unchanged
    Raw(Value),
}

/// Anything that can be appended to a context
#[derive(Debug, Clone, PartialEq)]
pub enum ContextItem {
    Prompt(PlainPrompt),
    ToolCall(ToolCall),
    Output(OutputItem),
    OutputMessage(OutputMessage),
    Tool(AvailableTool),
}

impl From<PlainPrompt> for ContextItem {
    fn from(prompt: PlainPrompt) -> Self {
        ContextItem::Prompt(prompt)
    }
}

impl From<ToolCall> for ContextItem {
    fn from(call: ToolCall) -> Self {
        ContextItem::ToolCall(call)
    }
}

impl From<OutputItem> for ContextItem {
    fn from(item: OutputItem) -> Self {
        ContextItem::Output(item)
    }
}

impl From<OutputMessage> for ContextItem {
    fn from(message: OutputMessage) -> Self {
        ContextItem::OutputMessage(message)
    }
}

impl From<AvailableTool> for ContextItem {
    fn from(tool: AvailableTool) -> Self {
        ContextItem::Tool(tool)
    }
}

impl From<&HistoryTurn> for ContextItem {
    fn from(turn: &HistoryTurn) -> Self {
        ContextItem::Prompt(PlainPrompt::new(turn.role(), turn.text()))
    }
}

/// Conversation context for a single request
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    entries: Vec<PromptEntry>,
    tools: Vec<AvailableTool>,
    instruction: Option<String>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn available_tools(&self) -> &[AvailableTool] {
        &self.tools
    }

    /// Append one item, classified by variant.
    ///
    /// System-role messages replace the instruction instead of entering the
    /// transcript. A function-call item is followed by its pending `ToolCall`.
    pub fn append(&mut self, item: impl Into<ContextItem>) {
        match item.into() {
            ContextItem::Prompt(prompt) => self.push_plain(prompt),
            ContextItem::ToolCall(call) => self.entries.push(PromptEntry::ToolCall(call)),
            ContextItem::OutputMessage(message) => self.entries.push(PromptEntry::Output(message)),
            ContextItem::Tool(tool) => self.push_tool(tool),
            ContextItem::Output(OutputItem::FunctionCall(call)) => {
                let pending = ToolCall::from_function_call(&call);
                self.entries.push(PromptEntry::FunctionCall(call));
                self.entries.push(PromptEntry::ToolCall(pending));
            }
            ContextItem::Output(OutputItem::Message(message)) => {
                self.push_plain(PlainPrompt::new(message.role, message.text()));
            }
            ContextItem::Output(OutputItem::Other(value)) => {
                self.entries.push(PromptEntry::Raw(value));
            }
        }
    }

    pub fn extend<I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<ContextItem>,
    {
        for item in items {
            self.append(item);
        }
    }

    /// Tools are keyed by name; a later tool replaces an earlier one
    fn push_tool(&mut self, tool: AvailableTool) {
        match self.tools.iter_mut().find(|existing| existing.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    fn push_plain(&mut self, prompt: PlainPrompt) {
        if prompt.role == Role::System {
            self.instruction = Some(prompt.content);
        } else {
            self.entries.push(PromptEntry::Plain(prompt));
        }
    }

    /// Provider `input` array. Pending tool calls are left out.
    pub fn to_wire_format(&self) -> Vec<Value> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                PromptEntry::Plain(prompt) => Some(json!({
                    "role": prompt.role.as_str(),
                    "content": prompt.content,
                })),
                PromptEntry::Output(message) => Some(json!({
                    "role": Role::Assistant.as_str(),
                    "content": message.text,
                })),
                PromptEntry::FunctionCall(call) => {
                    Some(OutputItem::FunctionCall(call.clone()).to_value())
                }
                PromptEntry::ToolCall(call) => call.output_json().map(|output| {
                    json!({
                        "type": "function_call_output",
                        "call_id": call.call_id,
                        "output": output,
                    })
                }),
                PromptEntry::Raw(value) => Some(value.clone()),
            })
            .collect()
    }

    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                PromptEntry::ToolCall(call) if call.is_pending() => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Resolve the pending call with `call_id`. Returns false if none matched.
    pub fn attach_output(&mut self, call_id: &str, fragments: Vec<String>) -> bool {
        let pending = self.entries.iter_mut().find_map(|entry| match entry {
            PromptEntry::ToolCall(call) if call.is_pending() && call.call_id == call_id => {
                Some(call)
            }
            _ => None,
        });

        match pending {
            Some(call) => {
                call.resolve(fragments);
                true
            }
            None => false,
        }
    }

    /// Most recent plain assistant entry
    pub fn last_assistant_message(&self) -> Result<&PlainPrompt, ContextError> {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| match entry {
                PromptEntry::Plain(prompt) if prompt.role == Role::Assistant => Some(prompt),
                _ => None,
            })
            .ok_or_else(|| ContextError::NotFound("assistant message".to_string()))
    }

    /// Most recent plain assistant entry at index `start` or later
    pub fn assistant_message_since(&self, start: usize) -> Option<&PlainPrompt> {
        self.entries
            .get(start..)?
            .iter()
            .rev()
            .find_map(|entry| match entry {
                PromptEntry::Plain(prompt) if prompt.role == Role::Assistant => Some(prompt),
                _ => None,
            })
    }

    pub fn available_tool_schemas(&self) -> Vec<FunctionToolSchema> {
        self.tools.iter().map(schema::to_function_tool_schema).collect()
    }
}

impl fmt::Display for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ConversationContext]")?;
        writeln!(f, "\t[instruction]: {}", self.instruction.as_deref().unwrap_or("-"))?;
        for item in self.to_wire_format() {
            writeln!(f, "\t{}", item)?;
        }
        let pending = self.pending_tool_calls();
        if !pending.is_empty() {
            writeln!(f, "\t[Pending Tool Calls]")?;
            for call in pending {
                writeln!(f, "\t{} {}", call.call_id, call.function_name)?;
            }
        }
        writeln!(f, "\t[Available Tools]")?;
        for tool in &self.tools {
            writeln!(f, "\t{}: {}", tool.name, tool.description)?;
        }
        Ok(())
    }
}
