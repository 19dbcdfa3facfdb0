//! Tool System
//!
//! Tool descriptors shared with providers, the closed set of tool kinds, and
//! the handler trait implemented by each tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::{AgentError, Result};

/// The tools this agent knows how to run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    GoogleSearch,
    AiPipe,
    ExecuteJs,
}

impl ToolKind {
    /// All kinds, in registry order
    pub const ALL: [ToolKind; 3] = [ToolKind::GoogleSearch, ToolKind::AiPipe, ToolKind::ExecuteJs];

    /// Wire name used by providers
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GoogleSearch => "google_search",
            ToolKind::AiPipe => "ai_pipe",
            ToolKind::ExecuteJs => "execute_js",
        }
    }

    /// Resolve a provider-supplied tool name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tool call request from the provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID, echoed back on the matching result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    /// Add a single argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Required string argument
    pub fn str_arg(&self, key: &str) -> Result<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Execution(format!("missing required parameter '{key}'")))
    }
}

/// Result from tool execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call this result answers
    pub tool_call_id: String,

    /// Output (success text or error description)
    pub content: String,
}

impl ToolResult {
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// Parameter definition for a tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    fn required_string(name: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Tool descriptor shown to the provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolDescriptor {
    /// Function-tool shape used by chat-completion endpoints
    pub fn to_function_spec(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({ "type": p.param_type, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

/// Handler for one tool kind
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool and return the text that goes into the tool message
    async fn execute(&self, call: &ToolCall) -> Result<String>;
}

/// Immutable catalog of the session's tool descriptors
#[derive(Clone, Debug)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Registry with the three built-in tools
    pub fn new() -> Self {
        Self {
            descriptors: ToolKind::ALL.into_iter().map(descriptor_for).collect(),
        }
    }

    /// Fixed ordered descriptor set
    pub fn describe(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Tool names
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn descriptor_for(kind: ToolKind) -> ToolDescriptor {
    let (description, parameter) = match kind {
        ToolKind::GoogleSearch => (
            "Search the web for current information on any topic",
            ParameterSchema::required_string("query", "The search query"),
        ),
        ToolKind::AiPipe => (
            "Run a text-processing workflow through the AI pipeline",
            ParameterSchema::required_string("workflow", "Description of the workflow to execute"),
        ),
        ToolKind::ExecuteJs => (
            "Execute JavaScript code in a sandbox and return the resulting value",
            ParameterSchema::required_string("code", "JavaScript code to evaluate"),
        ),
    };

    ToolDescriptor {
        name: kind.name().into(),
        description: description.into(),
        parameters: vec![parameter],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.names(), vec!["google_search", "ai_pipe", "execute_js"]);
    }

    #[test]
    fn test_function_spec_shape() {
        let registry = ToolRegistry::new();
        let spec = registry.describe()[2].to_function_spec();

        assert_eq!(spec["type"], "function");
        assert_eq!(spec["function"]["name"], "execute_js");
        assert_eq!(spec["function"]["parameters"]["type"], "object");
        assert_eq!(spec["function"]["parameters"]["properties"]["code"]["type"], "string");
        assert_eq!(spec["function"]["parameters"]["required"][0], "code");
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(ToolKind::from_name("ai_pipe"), Some(ToolKind::AiPipe));
        assert_eq!(ToolKind::from_name("rm_rf"), None);
    }

    #[test]
    fn test_str_arg_missing() {
        let call = ToolCall::new("c1", "google_search");
        assert!(matches!(call.str_arg("query"), Err(AgentError::Execution(_))));
    }
}
