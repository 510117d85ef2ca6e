//! Typed access to tool call arguments.

use std::collections::BTreeMap;

use buildkite_output::pagination::{ClientPaginationParams, ServerPaginationParams};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Arguments of a single `tools/call`.
///
/// Anything other than a JSON object is treated as no arguments.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    args: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    key: String,
    value: String,
}

impl ToolArguments {
    pub fn new(arguments: Option<Value>) -> Self {
        let args = match arguments {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { args }
    }

    /// String argument that must be present.
    ///
    /// Integers are accepted and formatted, since clients often send build
    /// numbers unquoted.
    pub fn require_string(&self, name: &str) -> Result<String, ToolError> {
        match self.args.get(name) {
            None | Some(Value::Null) => Err(ToolError::MissingArgument(name.to_string())),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            Some(_) => Err(ToolError::InvalidArgument(format!(
                "argument \"{}\" is not a string",
                name
            ))),
        }
    }

    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.args.get(name) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        self.get_optional_int(name).unwrap_or(default)
    }

    /// Integer argument. Floats are truncated and numeric strings parsed.
    pub fn get_optional_int(&self, name: &str) -> Option<i64> {
        match self.args.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get_optional_bool(name).unwrap_or(default)
    }

    /// Boolean argument. Accepts `"true"`/`"false"` strings and non-zero numbers.
    pub fn get_optional_bool(&self, name: &str) -> Option<bool> {
        match self.args.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            _ => None,
        }
    }

    /// Non-empty string argument, if given.
    pub fn get_optional_string(&self, name: &str) -> Option<String> {
        match self.args.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// `[{key, value}]` list collapsed into a map. Absent or empty yields `None`.
    pub fn get_entries(&self, name: &str) -> Result<Option<BTreeMap<String, String>>, ToolError> {
        let Some(value) = self.args.get(name).filter(|v| !v.is_null()) else {
            return Ok(None);
        };

        let entries: Vec<Entry> = serde_json::from_value(value.clone()).map_err(|e| {
            ToolError::InvalidArgument(format!("argument \"{}\" is invalid: {}", name, e))
        })?;

        if entries.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            entries.into_iter().map(|e| (e.key, e.value)).collect(),
        ))
    }

    /// `page` / `perPage` for upstream pagination.
    pub fn server_pagination(&self) -> ServerPaginationParams {
        ServerPaginationParams::from_request(
            self.get_optional_int("page"),
            self.get_optional_int("perPage"),
        )
    }

    /// `page` / `perPage` for slicing a fetched collection.
    pub fn client_pagination(&self) -> ClientPaginationParams {
        ClientPaginationParams::from_request(
            self.get_optional_int("page"),
            self.get_optional_int("perPage"),
        )
    }
}
