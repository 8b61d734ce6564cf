// Prompt templates
// Feature: Configuration
//
// System prompts for planning, replanning, step execution and single-turn
// chat. Loaded from YAML when configured, otherwise the built-in texts are
// used. Placeholders use the `{name}` form.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, ConfigResult};
use crate::models::{PastStep, PromptsConfig, Step};

const PLANNING_PROMPT: &str = r#"You are a planner for a tool-using assistant.
For the user's request, decide whether you can answer directly or need a step by step plan.

If you can answer directly, respond with a `response` action containing the final message.
Otherwise respond with a `plan` action. Each step has:
- task: a self-contained description of what to do
- kind: `tool_call` if one of the available tools must be invoked, `assistant` if the step can be answered from what is already known

Do not add superfluous steps. The result of the final step should be the final answer.
Make sure each step has all the information it needs. Do not skip steps."#;

const REPLANNING_PROMPT: &str = r#"You are revising a step by step plan.

Your objective was this:
{input}

The remaining steps of your plan are:
{plan}

You have currently done the following steps:
{past_steps}

Update the plan accordingly. If no more steps are needed and you can return to the user,
respond with a `response` action. Otherwise respond with a `plan` action containing only
the steps that still need to be done. Do not return previously done steps as part of the plan."#;

const EXECUTION_PROMPT: &str = r#"You are executing one step of a plan.

The user's objective:
{input}

The plan:
{plan}

Steps already done:
{past_steps}

You are tasked with executing this step:
{task}

Answer with the result of this step only."#;

const CHAT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant.
Use the available tools whenever the question needs information you do not have,
then answer the question using the tool results."#;

const EMPTY_SECTION: &str = "(none)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptTemplates {
    pub planning: String,
    pub replanning: String,
    pub execution: String,
    pub chat_system: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            planning: PLANNING_PROMPT.to_string(),
            replanning: REPLANNING_PROMPT.to_string(),
            execution: EXECUTION_PROMPT.to_string(),
            chat_system: CHAT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Load from the configured YAML file, or the built-in templates
    pub fn from_config(config: &PromptsConfig) -> ConfigResult<Self> {
        match config.path.as_deref() {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a YAML prompt file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let templates = Self::from_yaml(&content)?;
        log::info!("[config] Loaded prompt templates from {}", path.display());
        Ok(templates)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let templates: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        templates.validate()?;
        Ok(templates)
    }

    /// Every template must carry the placeholders its step depends on
    pub fn validate(&self) -> ConfigResult<()> {
        require(&self.replanning, "replanning", "past_steps")?;
        require(&self.execution, "execution", "task")?;
        Ok(())
    }

    pub fn render_planning(&self, question: &str) -> String {
        render(&self.planning, &[("input", question)])
    }

    pub fn render_replanning(&self, question: &str, remaining: &[Step], past_steps: &[PastStep]) -> String {
        render(
            &self.replanning,
            &[
                ("input", question),
                ("plan", &format_plan(remaining)),
                ("past_steps", &format_past_steps(past_steps)),
            ],
        )
    }

    pub fn render_execution(
        &self,
        question: &str,
        plan: &[Step],
        past_steps: &[PastStep],
        task: &str,
    ) -> String {
        render(
            &self.execution,
            &[
                ("input", question),
                ("plan", &format_plan(plan)),
                ("past_steps", &format_past_steps(past_steps)),
                ("task", task),
            ],
        )
    }
}

fn require(template: &str, name: &str, placeholder: &str) -> ConfigResult<()> {
    if template.contains(&format!("{{{}}}", placeholder)) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTemplate {
            name: name.to_string(),
            placeholder: format!("{{{}}}", placeholder),
        })
    }
}

/// Replace each `{key}` with its value in a single pass.
///
/// Substituted values are never scanned again, and unknown `{...}` tokens
/// are kept as written.
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            variables
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                result.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

pub fn format_plan(steps: &[Step]) -> String {
    if steps.is_empty() {
        return EMPTY_SECTION.to_string();
    }
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. [{}] {}", i + 1, step.kind, step.task))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_past_steps(past_steps: &[PastStep]) -> String {
    if past_steps.is_empty() {
        return EMPTY_SECTION.to_string();
    }
    past_steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. Task: {}\n   Result: {}", i + 1, step.task, step.result))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_templates_are_valid() {
        assert!(PromptTemplates::default().validate().is_ok());
    }

    #[test]
    fn test_render_replanning() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_replanning(
            "Who reserved what?",
            &[Step::assistant("Summarize reservations")],
            &[PastStep::new("Look up user M4386", "kimi raikkonen")],
        );

        assert!(prompt.contains("Who reserved what?"));
        assert!(prompt.contains("1. [assistant] Summarize reservations"));
        assert!(prompt.contains("1. Task: Look up user M4386\n   Result: kimi raikkonen"));
        assert!(!prompt.contains("{past_steps}"));
    }

    #[test]
    fn test_placeholders_in_values_are_not_expanded() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_replanning(
            "What does {past_steps} mean?",
            &[],
            &[PastStep::new("Look up {task}", "SECRET")],
        );

        assert!(prompt.contains("What does {past_steps} mean?"));
        assert!(prompt.contains("1. Task: Look up {task}\n   Result: SECRET"));
        assert_eq!(prompt.matches("SECRET").count(), 1);
    }

    #[test]
    fn test_render_keeps_unknown_tokens() {
        assert_eq!(
            render("{a} {\"json\": 1} {b", &[("a", "{b}")]),
            "{b} {\"json\": 1} {b"
        );
    }

    #[test]
    fn test_empty_sections() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_execution("q", &[], &[], "do it");
        assert!(prompt.contains("(none)"));
        assert!(prompt.contains("do it"));
    }

    #[test]
    fn test_yaml_overrides_keep_defaults() {
        let templates = PromptTemplates::from_yaml("chat_system: Be brief.\n").unwrap();
        assert_eq!(templates.chat_system, "Be brief.");
        assert_eq!(templates.planning, PLANNING_PROMPT);
    }

    #[test]
    fn test_yaml_missing_placeholder_is_rejected() {
        let err = PromptTemplates::from_yaml("replanning: Just replan.\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTemplate { ref name, .. } if name == "replanning"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "execution: |\n  Step: {{task}}\n").unwrap();

        let templates = PromptTemplates::load(file.path()).unwrap();
        assert_eq!(templates.render_execution("q", &[], &[], "add 1 and 2"), "Step: add 1 and 2\n");
    }

    #[test]
    fn test_missing_prompt_file() {
        let config = PromptsConfig {
            path: Some("/nonexistent/prompt.yaml".to_string()),
        };
        assert!(matches!(
            PromptTemplates::from_config(&config),
            Err(ConfigError::Io { .. })
        ));
    }
}
