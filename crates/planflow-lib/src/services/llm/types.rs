// OpenAI Responses API types
// Feature: LLM Gateway

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::FunctionToolSchema;

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub input: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionToolSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextConfig {
    pub format: TextFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<Value>,
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
