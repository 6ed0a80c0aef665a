//! Common types for model interactions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    Tool,
}

/// Message in conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// One message carrying every result of a tool-call batch
    pub fn tool_results(parts: Vec<Part>) -> Self {
        Self::new(Role::Tool, parts)
    }

    /// Concatenated text parts, ignoring calls and results
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Content part within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    FunctionCall(ToolInvocation),
    FunctionResponse(ToolResult),
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text { text: s.into() }
    }

    pub fn function_call(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Part::FunctionCall(ToolInvocation {
            name: name.into(),
            arguments,
            thought_signature: None,
        })
    }

    pub fn function_response(result: ToolResult) -> Self {
        Part::FunctionResponse(result)
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Opaque backend token that must accompany the call when it is replayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

/// Outcome of a tool call, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    /// JSON-encoded content: a list of text items, or `{"error": ...}`
    pub payload: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful call, payload is the JSON list of the returned texts
    pub fn from_texts(name: impl Into<String>, texts: &[String]) -> Self {
        Self {
            name: name.into(),
            payload: Value::from(texts.to_vec()).to_string(),
            is_error: false,
        }
    }

    /// Failed call, payload is an error descriptor mentioning the tool
    pub fn error(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        let name = name.into();
        let payload = serde_json::json!({
            "error": format!("Error executing tool '{name}': {cause}")
        })
        .to_string();
        Self {
            name,
            payload,
            is_error: true,
        }
    }
}

/// Tool definition as advertised by the tool server
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tools available for one turn, keyed by unique name in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Build a catalog, keeping the first definition for a repeated name
    pub fn new(definitions: impl IntoIterator<Item = ToolDefinition>) -> Self {
        let mut tools: Vec<ToolDefinition> = Vec::new();
        for def in definitions {
            if tools.iter().any(|t| t.name == def.name) {
                tracing::warn!(tool = %def.name, "Duplicate tool name in catalog, ignoring");
                continue;
            }
            tools.push(def);
        }
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Model response, one or more candidates
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub candidates: Vec<Candidate>,
    pub usage: Usage,
}

/// Single candidate; content is missing when the backend blocked it
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub content: Option<Message>,
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// Response with a single candidate carrying `message`
    pub fn from_message(message: Message) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(message),
                finish_reason: Some("STOP".to_string()),
            }],
            usage: Usage::default(),
        }
    }

    /// Content of the first candidate, if any
    pub fn content(&self) -> Option<&Message> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }

    /// First candidate's content, only when it has at least one part
    pub fn valid_content(&self) -> Option<&Message> {
        self.content().filter(|m| !m.parts.is_empty())
    }

    /// Extract all tool-call requests from the first candidate, in order
    pub fn tool_invocations(&self) -> Vec<&ToolInvocation> {
        self.content()
            .map(|m| {
                m.parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::FunctionCall(call) => Some(call),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_invocations().is_empty()
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Message in a sampling request from the tool server
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingMessage {
    pub role: Role,
    pub text: String,
}

/// Ad-hoc completion requested by the tool server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingRequest {
    pub messages: Vec<SamplingMessage>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// Assistant-role text produced for a sampling request
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingResult {
    pub model: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_keeps_first_duplicate() {
        let def = |name: &str, description: &str| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: json!({"type": "object"}),
        };
        let catalog = ToolCatalog::new(vec![
            def("schedule_meeting", "first"),
            def("list_all_meetings", "list"),
            def("schedule_meeting", "second"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("schedule_meeting").unwrap().description, "first");
    }

    #[test]
    fn test_tool_invocations_preserve_order() {
        let response = LlmResponse::from_message(Message::new(
            Role::Model,
            vec![
                Part::function_call("a", Map::new()),
                Part::text("thinking"),
                Part::function_call("b", Map::new()),
            ],
        ));
        let names: Vec<_> = response
            .tool_invocations()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_valid_content_rejects_empty_parts() {
        let response = LlmResponse::from_message(Message::new(Role::Model, vec![]));
        assert!(response.content().is_some());
        assert!(response.valid_content().is_none());
        assert!(LlmResponse::default().valid_content().is_none());
    }

    #[test]
    fn test_error_result_names_tool() {
        let result = ToolResult::error("schedule_meeting", "broken pipe");
        assert!(result.is_error);
        let payload: Value = serde_json::from_str(&result.payload).unwrap();
        let message = payload["error"].as_str().unwrap();
        assert!(message.contains("schedule_meeting"));
        assert!(message.contains("broken pipe"));
    }

    #[test]
    fn test_text_result_payload_is_json_list() {
        let result = ToolResult::from_texts("list_all_meetings", &["Q3".to_string()]);
        assert_eq!(result.payload, r#"["Q3"]"#);
        assert!(!result.is_error);
    }
}
