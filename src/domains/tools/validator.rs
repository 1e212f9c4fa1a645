//! Argument validation.
//!
//! [`validate`] checks the raw argument map of a call against a tool's
//! declared parameters and produces a normalized [`Arguments`] value.
//!
//! Policy:
//! - every absent required parameter is reported in `missing`;
//! - every present parameter whose JSON kind does not match its tag is
//!   reported in `type_mismatch`;
//! - `null` counts as absent;
//! - optional parameters that are absent take their declared default;
//! - arguments not declared by the tool are ignored and do not appear in the
//!   normalized map, so newer clients can send fields older tools do not know.
//!
//! Validation performs no I/O and never mutates its inputs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::error::ToolError;
use super::schema::{ParamSpec, ParamType};

/// A parameter whose supplied value has the wrong JSON kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    /// Parameter name.
    pub name: String,
    /// Declared type tag.
    pub expected: ParamType,
    /// JSON kind of the supplied value.
    pub actual: String,
}

/// Structured report of everything wrong with a set of call arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    /// Required parameters that were not supplied, in declaration order.
    pub missing: Vec<String>,
    /// Parameters supplied with the wrong type, in declaration order.
    pub type_mismatch: Vec<TypeMismatch>,
}

impl ValidationError {
    /// True when no problem was recorded.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.type_mismatch.is_empty()
    }

    fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing required: {}", self.missing.join(", ")));
        }
        for mismatch in &self.type_mismatch {
            parts.push(format!(
                "'{}' expected {}, got {}",
                mismatch.name, mismatch.expected, mismatch.actual
            ));
        }
        parts.join("; ")
    }
}

/// Validated and normalized call arguments handed to a tool handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Raw access to a declared argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A string argument.
    pub fn get_str(&self, name: &str) -> Result<&str, ToolError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| missing_argument(name, ParamType::String))
    }

    /// A numeric argument as `f64`.
    pub fn get_f64(&self, name: &str) -> Result<f64, ToolError> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| missing_argument(name, ParamType::Number))
    }

    /// A boolean argument.
    pub fn get_bool(&self, name: &str) -> Result<bool, ToolError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| missing_argument(name, ParamType::Boolean))
    }

    /// An object argument.
    pub fn get_object(&self, name: &str) -> Result<&Map<String, Value>, ToolError> {
        self.get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| missing_argument(name, ParamType::Object))
    }

    /// Number of arguments present after normalization.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no argument is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

// Handlers only see arguments that already passed validation, so reaching
// this means the handler asked for a parameter it never declared.
fn missing_argument(name: &str, expected: ParamType) -> ToolError {
    ToolError::execution_failed(format!(
        "argument '{}' of type {} is not available",
        name, expected
    ))
}

/// Validate `supplied` against `params`.
pub fn validate(
    params: &[ParamSpec],
    supplied: &Map<String, Value>,
) -> Result<Arguments, ValidationError> {
    let mut report = ValidationError::default();
    let mut normalized = Map::new();

    for param in params {
        match supplied.get(&param.name).filter(|v| !v.is_null()) {
            None if param.required => report.missing.push(param.name.clone()),
            None => {
                if let Some(default) = &param.default {
                    normalized.insert(param.name.clone(), default.clone());
                }
            }
            Some(value) if param.param_type.matches(value) => {
                normalized.insert(param.name.clone(), value.clone());
            }
            Some(value) => report.type_mismatch.push(TypeMismatch {
                name: param.name.clone(),
                expected: param.param_type,
                actual: ParamType::describe(value).to_string(),
            }),
        }
    }

    if report.is_empty() {
        Ok(Arguments(normalized))
    } else {
        Err(report)
    }
}
