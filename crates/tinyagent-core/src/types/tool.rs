//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type accepted for a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// No type constraint (schemas that omit `type`)
    Any,
}

impl ParamKind {
    /// Parse a JSON Schema `type` keyword
    pub fn from_schema_type(ty: &str) -> Self {
        match ty {
            "string" => ParamKind::String,
            "integer" => ParamKind::Integer,
            "number" => ParamKind::Number,
            "boolean" => ParamKind::Boolean,
            "array" => ParamKind::Array,
            "object" => ParamKind::Object,
            _ => ParamKind::Any,
        }
    }

    /// Check whether a JSON value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
            ParamKind::Any => true,
        }
    }

    fn schema_type(&self) -> Option<&'static str> {
        match self {
            ParamKind::String => Some("string"),
            ParamKind::Integer => Some("integer"),
            ParamKind::Number => Some("number"),
            ParamKind::Boolean => Some("boolean"),
            ParamKind::Array => Some("array"),
            ParamKind::Object => Some("object"),
            ParamKind::Any => None,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema_type().unwrap_or("any"))
    }
}

/// Describe the JSON type of a value, for validation messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Full property schema when the spec came from an external JSON Schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ParamSpec {
    /// A required parameter
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            schema: None,
        }
    }

    /// An optional parameter
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    fn property_schema(&self) -> Value {
        if let Some(schema) = &self.schema {
            return schema.clone();
        }
        let mut prop = Map::new();
        if let Some(ty) = self.kind.schema_type() {
            prop.insert("type".to_string(), json!(ty));
        }
        if self.kind == ParamKind::Array {
            prop.insert("items".to_string(), json!({}));
        }
        if !self.description.is_empty() {
            prop.insert("description".to_string(), json!(self.description));
        }
        Value::Object(prop)
    }
}

/// Static descriptor of a tool, advertised to the model and used for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// Parameters in declaration order
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    /// Create a new tool spec without parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render the parameters as a JSON Schema object
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.property_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Build a spec from a JSON Schema object (as served by MCP servers)
    pub fn from_json_schema(name: impl Into<String>, description: impl Into<String>, schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(key, prop)| {
                        let kind = match prop.get("type") {
                            Some(Value::String(ty)) => ParamKind::from_schema_type(ty),
                            // ["string", "null"] style unions: take the first concrete type
                            Some(Value::Array(types)) => types
                                .iter()
                                .filter_map(Value::as_str)
                                .find(|t| *t != "null")
                                .map(ParamKind::from_schema_type)
                                .unwrap_or(ParamKind::Any),
                            _ => ParamKind::Any,
                        };
                        ParamSpec {
                            name: key.clone(),
                            kind,
                            description: prop
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            required: required.contains(&key.as_str()),
                            schema: Some(prop.clone()),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Argument mapping; validated against the tool's spec before dispatch
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument as a string
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Why a tool call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Malformed arguments
    Validation,
    /// The model asked for a tool that is not registered
    UnknownTool,
    /// The handler exceeded its time bound
    Timeout,
    /// The handler's own action failed
    Handler,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolErrorKind::Validation => write!(f, "validation error"),
            ToolErrorKind::UnknownTool => write!(f, "unknown tool"),
            ToolErrorKind::Timeout => write!(f, "timeout"),
            ToolErrorKind::Handler => write!(f, "handler error"),
        }
    }
}

/// Outcome of one tool call, sent back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    pub call_id: String,
    /// Name of the tool that was called
    pub tool_name: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Output text, or a human-readable error description
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ToolErrorKind>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(call_id: impl Into<String>, tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
            error_kind: None,
        }
    }

    /// Create a failed tool result
    pub fn failure(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        kind: ToolErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            output: message.into(),
            error_kind: Some(kind),
        }
    }

    /// Text handed to the model for this result
    pub fn model_content(&self) -> String {
        match self.error_kind {
            Some(kind) => format!("Error ({}): {}", kind, self.output),
            None => self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_file_spec() -> ToolSpec {
        ToolSpec::new("read_file", "Read a file")
            .with_param(ParamSpec::required("path", ParamKind::String, "File path"))
            .with_param(ParamSpec::optional("limit", ParamKind::Integer, "Max lines"))
    }

    #[test]
    fn test_input_schema() {
        let schema = read_file_spec().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["path"]["type"], "string");
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["required"], json!(["path"]));
    }

    #[test]
    fn test_from_json_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Page URL" },
                "depth": { "type": ["integer", "null"] },
                "extra": {}
            },
            "required": ["url"]
        });
        let spec = ToolSpec::from_json_schema("browse", "Open a page", &schema);

        let url = spec.param("url").unwrap();
        assert!(url.required);
        assert_eq!(url.kind, ParamKind::String);
        assert_eq!(url.description, "Page URL");
        assert_eq!(spec.param("depth").unwrap().kind, ParamKind::Integer);
        assert!(!spec.param("depth").unwrap().required);
        assert_eq!(spec.param("extra").unwrap().kind, ParamKind::Any);

        // External property schemas are advertised unchanged
        assert_eq!(spec.input_schema()["properties"]["depth"]["type"], json!(["integer", "null"]));
    }

    #[test]
    fn test_param_kind_matches() {
        assert!(ParamKind::Integer.matches(&json!(3)));
        assert!(!ParamKind::Integer.matches(&json!(3.5)));
        assert!(ParamKind::Number.matches(&json!(3)));
        assert!(ParamKind::String.matches(&json!("x")));
        assert!(!ParamKind::String.matches(&json!(1)));
        assert!(ParamKind::Any.matches(&Value::Null));
    }

    #[test]
    fn test_tool_result() {
        let ok = ToolResult::success("call_1", "read_file", "contents");
        assert!(ok.success);
        assert_eq!(ok.model_content(), "contents");

        let err = ToolResult::failure("call_2", "read_file", ToolErrorKind::Timeout, "took too long");
        assert!(!err.success);
        assert_eq!(err.model_content(), "Error (timeout): took too long");
    }
}
