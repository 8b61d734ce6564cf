// Prompt and transcript data models
// Feature: Conversation Context
//
// Everything that can be exchanged with the LLM provider or a tool server
// during one request: plain messages, provider output items, tool calls and
// the tools discovered on the MCP servers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain `{role, content}` message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlainPrompt {
    pub role: Role,
    pub content: String,
}

impl PlainPrompt {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A tool invocation requested by the LLM.
///
/// Pending while `output` is `None`. Once the tool server answered, the text
/// fragments it returned are attached and the call is replayed to the LLM as a
/// `function_call_output` item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub call_id: String,
    pub function_name: String,
    pub arguments: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
}

impl ToolCall {
    pub fn new(
        call_id: impl Into<String>,
        function_name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            function_name: function_name.into(),
            arguments,
            output: None,
        }
    }

    /// Derive a pending call from a provider function-call item.
    /// Arguments that are not a JSON object become an empty map.
    pub fn from_function_call(item: &FunctionCallItem) -> Self {
        let arguments = match serde_json::from_str::<Value>(&item.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                log::warn!(
                    "[context] Function call {} ({}) has non-object arguments: {}",
                    item.call_id,
                    item.name,
                    other
                );
                Map::new()
            }
            Err(e) => {
                log::warn!(
                    "[context] Function call {} ({}) has unparseable arguments: {}",
                    item.call_id,
                    item.name,
                    e
                );
                Map::new()
            }
        };
        Self::new(item.call_id.clone(), item.name.clone(), arguments)
    }

    pub fn is_pending(&self) -> bool {
        self.output.is_none()
    }

    pub fn resolve(&mut self, fragments: Vec<String>) {
        self.output = Some(fragments);
    }

    /// JSON encoding of the captured text fragments, `None` while pending
    pub fn output_json(&self) -> Option<String> {
        self.output.as_ref().map(|fragments| {
            Value::Array(fragments.iter().cloned().map(Value::String).collect()).to_string()
        })
    }
}

/// Raw `function_call` output item as produced by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub name: String,
    /// Arguments as the JSON-encoded string the provider emitted
    pub arguments: String,
}

/// One content part of a provider message item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
}

impl ContentPart {
    pub fn output_text(text: impl Into<String>) -> Self {
        Self {
            kind: "output_text".to_string(),
            text: Some(text.into()),
            refusal: None,
        }
    }
}

/// Raw `message` output item as produced by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl MessageItem {
    /// Concatenated text of all text-bearing content parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Refusal text, if the model refused to answer
    pub fn refusal(&self) -> Option<&str> {
        self.content.iter().find_map(|part| part.refusal.as_deref())
    }
}

/// Provider output item.
///
/// Items that are neither messages nor function calls (reasoning items and
/// the like) are kept verbatim so they can be replayed unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    Message(MessageItem),
    FunctionCall(FunctionCallItem),
    Other(Value),
}

impl OutputItem {
    /// Classify a raw provider item by its `type` field
    pub fn from_value(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "message" => match serde_json::from_value::<MessageItem>(value.clone()) {
                Ok(message) => OutputItem::Message(message),
                Err(_) => OutputItem::Other(value),
            },
            "function_call" => match serde_json::from_value::<FunctionCallItem>(value.clone()) {
                Ok(call) => OutputItem::FunctionCall(call),
                Err(_) => OutputItem::Other(value),
            },
            _ => OutputItem::Other(value),
        }
    }

    /// Provider wire shape of this item
    pub fn to_value(&self) -> Value {
        let (kind, inner) = match self {
            OutputItem::Message(message) => ("message", serde_json::to_value(message)),
            OutputItem::FunctionCall(call) => ("function_call", serde_json::to_value(call)),
            OutputItem::Other(value) => return value.clone(),
        };
        match inner {
            Ok(Value::Object(mut map)) => {
                map.insert("type".to_string(), Value::String(kind.to_string()));
                Value::Object(map)
            }
            _ => Value::Null,
        }
    }

    pub fn assistant_message(text: impl Into<String>) -> Self {
        OutputItem::Message(MessageItem {
            id: None,
            role: Role::Assistant,
            content: vec![ContentPart::output_text(text)],
        })
    }

    pub fn function_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        OutputItem::FunctionCall(FunctionCallItem {
            id: None,
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        })
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, OutputItem::FunctionCall(_))
    }

    pub fn as_message(&self) -> Option<&MessageItem> {
        match self {
            OutputItem::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Finalized assistant text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OutputMessage {
    pub text: String,
}

impl OutputMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&MessageItem> for OutputMessage {
    fn from(message: &MessageItem) -> Self {
        Self::new(message.text())
    }
}

/// A tool advertised by one of the MCP servers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: Value,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AvailableTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            tags: BTreeSet::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this tool carries at least one of `tags`
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// Build from the JSON form of an MCP `Tool`.
    ///
    /// Tags come from `_meta._fastmcp.tags` (FastMCP servers) or `_meta.tags`;
    /// the whole `_meta` object is kept as metadata.
    pub fn from_mcp_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let input_schema = value
            .get("inputSchema")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} }));
        let metadata = value
            .get("_meta")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let tags = metadata
            .get("_fastmcp")
            .and_then(|fastmcp| fastmcp.get("tags"))
            .or_else(|| metadata.get("tags"))
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            name,
            description,
            input_schema,
            tags,
            metadata,
        })
    }
}

/// Function-calling schema sent to the provider in the `tools` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub strict: bool,
}
