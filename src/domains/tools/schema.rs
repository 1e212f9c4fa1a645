//! Parameter schema types.
//!
//! A tool declares an ordered list of [`ParamSpec`]s. Each one names a
//! parameter, gives it a [`ParamType`] tag and says whether callers must
//! supply it. The same declarations drive argument validation and the JSON
//! Schema advertised through `tools/list`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared type tag of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// A JSON string.
    String,
    /// Any JSON number, integer or float.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A JSON object.
    Object,
}

impl ParamType {
    /// Whether `value` satisfies this type tag.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
        }
    }

    /// The JSON Schema `type` keyword for this tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    /// Name of the JSON kind of `value`, used in mismatch reports.
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as it appears in the call arguments.
    pub name: String,

    /// Declared type tag.
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Whether the caller must supply this parameter.
    pub required: bool,

    /// Human-readable description shown to clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Value used when an optional parameter is not supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: None,
            default: None,
        }
    }

    /// An optional parameter without a default.
    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type)
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a default value. Only meaningful for optional parameters.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Build the JSON Schema object describing a parameter list.
pub fn input_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut property = Map::new();
        property.insert("type".into(), Value::from(param.param_type.as_str()));
        if let Some(description) = &param.description {
            property.insert("description".into(), Value::from(description.as_str()));
        }
        if let Some(default) = &param.default {
            property.insert("default".into(), default.clone());
        }
        properties.insert(param.name.clone(), Value::Object(property));

        if param.required {
            required.push(Value::from(param.name.as_str()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_matching() {
        assert!(ParamType::String.matches(&json!("hi")));
        assert!(!ParamType::String.matches(&json!(1)));
        assert!(ParamType::Number.matches(&json!(1)));
        assert!(ParamType::Number.matches(&json!(1.5)));
        assert!(!ParamType::Number.matches(&json!("1")));
        assert!(ParamType::Boolean.matches(&json!(false)));
        assert!(ParamType::Object.matches(&json!({ "a": 1 })));
        assert!(!ParamType::Object.matches(&json!([1, 2])));
    }

    #[test]
    fn test_describe_value_kinds() {
        assert_eq!(ParamType::describe(&json!(null)), "null");
        assert_eq!(ParamType::describe(&json!([])), "array");
        assert_eq!(ParamType::describe(&json!(3)), "number");
    }

    #[test]
    fn test_input_schema() {
        let params = vec![
            ParamSpec::required("text", ParamType::String).with_description("Input text"),
            ParamSpec::optional("times", ParamType::Number).with_default(json!(1)),
        ];

        let schema = input_schema(&params);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["text"]["description"], "Input text");
        assert_eq!(schema["properties"]["times"]["default"], 1);
        assert_eq!(schema["required"], json!(["text"]));
    }

    #[test]
    fn test_param_type_serializes_lowercase() {
        let spec = ParamSpec::required("flag", ParamType::Boolean);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "boolean");
    }
}
