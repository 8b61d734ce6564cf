// Application configuration models
// Feature: Configuration
//
// Deserialized from the TOML config file; every field has a default so an
// empty or missing file yields a runnable local setup.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-5-mini";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub tool_servers: Vec<ToolServerConfig>,
    pub engine: EngineConfig,
    pub prompts: PromptsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            tool_servers: default_tool_servers(),
            engine: EngineConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the Responses API
    pub endpoint: String,
    pub model: String,
    pub temperature: Option<f32>,
    /// Request timeout; unset means no client-side timeout
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: None,
            timeout_secs: None,
        }
    }
}

/// A remote MCP tool server reachable over streamable HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolServerConfig {
    pub name: String,
    pub url: String,
}

impl ToolServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

fn default_tool_servers() -> Vec<ToolServerConfig> {
    vec![
        ToolServerConfig::new("alpha", "http://localhost:9011/mcp"),
        ToolServerConfig::new("beta", "http://localhost:9012/mcp"),
    ]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Tags used to filter discovered tools; empty keeps every tool
    pub tool_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptsConfig {
    /// YAML prompt file; built-in prompts are used when unset
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.tool_servers.len(), 2);
        assert!(config.engine.tool_tags.is_empty());
        assert!(config.prompts.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [llm]
            model = "gpt-4o-mini"
            temperature = 0.1

            [[tool_servers]]
            name = "resource"
            url = "http://localhost:9013/mcp"

            [engine]
            tool_tags = ["alpha"]
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.endpoint, DEFAULT_LLM_ENDPOINT);
        assert_eq!(config.llm.temperature, Some(0.1));
        assert_eq!(config.tool_servers, vec![ToolServerConfig::new("resource", "http://localhost:9013/mcp")]);
        assert_eq!(config.engine.tool_tags, vec!["alpha".to_string()]);
    }
}
