//! Tools exposed by the meeting server
//!
//! Tools are stateless singletons; the store they act on is passed per call.

mod meetings;

pub use meetings::{
    AddActionItemTool, AddAttendeeTool, GetMeetingDetailsTool, ListAllMeetingsTool,
    ScheduleMeetingTool,
};

use super::store::MeetingStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}

/// Trait for tools the server can execute
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &'static str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute against the server's store
    fn run(&self, input: Value, store: &mut MeetingStore) -> ToolOutput;
}

/// Object schema of required string parameters, in the shape typed-signature
/// generators emit (with `title` annotations on every node).
pub(crate) fn string_params_schema(tool: &str, params: &[(&str, &str)]) -> Value {
    let mut properties = Map::new();
    for (name, description) in params {
        properties.insert(
            (*name).to_string(),
            json!({
                "description": description,
                "title": title_case(name),
                "type": "string",
            }),
        );
    }
    let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
    let mut schema = json!({
        "properties": properties,
        "title": format!("{tool}Arguments"),
        "type": "object",
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collection of the server's tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The meeting tool set
    pub fn meetings() -> Self {
        Self {
            tools: vec![
                Arc::new(ScheduleMeetingTool),
                Arc::new(AddAttendeeTool),
                Arc::new(AddActionItemTool),
                Arc::new(GetMeetingDetailsTool),
                Arc::new(ListAllMeetingsTool),
            ],
        }
    }

    /// Tool list as advertised over `tools/list`
    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect()
    }

    /// Execute a tool by name; `None` for unknown tools
    pub fn execute(&self, name: &str, input: Value, store: &mut MeetingStore) -> Option<ToolOutput> {
        let tool = self.tools.iter().find(|t| t.name() == name)?;
        tracing::info!(tool = %name, "Executing tool");
        Some(tool.run(input, store))
    }
}
