use serde::{Deserialize, Serialize};

/// Instruction metadata from YAML frontmatter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionMetadata {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, alias = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
}

impl ParameterType {
    /// Whether a supplied JSON value can be bound to a parameter of this type
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        json_kind(value) == self.as_str()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

/// Lowercase JSON type name of a value
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Full instruction template (metadata + body)
#[derive(Debug, Clone)]
pub struct InstructionTemplate {
    pub name: String,
    pub metadata: InstructionMetadata,
    pub content: String,
}
