// Tool schema projection
// Feature: Conversation Context
//
// Projects an MCP tool input schema onto the flat function-calling schema the
// provider accepts. Nested constructs other than array `items` are dropped and
// `anyOf` unions without a `type` collapse to a comma-joined type name.

use serde_json::{json, Map, Value};

use crate::models::{AvailableTool, FunctionToolSchema};

pub fn to_function_tool_schema(tool: &AvailableTool) -> FunctionToolSchema {
    FunctionToolSchema {
        kind: "function".to_string(),
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: project_parameters(&tool.input_schema),
        strict: false,
    }
}

fn project_parameters(schema: &Value) -> Value {
    let mut properties = Map::new();

    if let Some(source) = schema.get("properties").and_then(Value::as_object) {
        for (key, property) in source {
            properties.insert(key.clone(), project_property(property));
        }
    }

    let required = schema
        .get("required")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": required,
    })
}

fn project_property(property: &Value) -> Value {
    let kind = match property.get("type") {
        Some(kind) => kind.clone(),
        None => flatten_any_of(property),
    };
    let description = property
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut projected = Map::new();
    projected.insert("type".to_string(), kind.clone());
    projected.insert("description".to_string(), Value::String(description.to_string()));

    if kind.as_str() == Some("array") {
        if let Some(items) = property.get("items") {
            projected.insert("items".to_string(), items.clone());
        }
    }

    Value::Object(projected)
}

fn flatten_any_of(property: &Value) -> Value {
    match property.get("anyOf").and_then(Value::as_array) {
        Some(variants) => {
            let names: Vec<&str> = variants
                .iter()
                .filter_map(|variant| variant.get("type").and_then(Value::as_str))
                .collect();
            Value::String(names.join(","))
        }
        None => Value::Null,
    }
}
