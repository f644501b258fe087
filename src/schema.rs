//! Per-stage request validation.
//!
//! A route declares at most one JSON schema per input stage (query string,
//! path params, body). Stages are validated in a fixed order - query, then
//! params, then body - and validation fails fast: the first stage to
//! reject its input aborts evaluation of the later stages. That is policy,
//! not an accident: one short error report beats an aggregate of every
//! stage's complaints.
//!
//! Query and path parameters arrive as string maps; before validation they
//! are coerced against the schema's declared property types (`"42"` → 42
//! for an integer property) and properties the request omitted are filled
//! from the schema's `default`, so handlers see typed values.

use crate::errors::HttpError;
use jsonschema::Validator;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// One of the three independently validated input stages.
///
/// The display name is the exact prefix of every validation failure
/// message produced for that stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Query,
    Params,
    Body,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Query => "Query",
            Stage::Params => "Params",
            Stage::Body => "Body",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled schema for a single stage.
///
/// Keeps the raw schema alongside the compiled validator: the raw value
/// drives string coercion and default filling, the validator does the
/// actual checking (with `format` assertions enabled, so `"format":
/// "email"` rejects non-addresses).
pub struct StageSchema {
    raw: Value,
    compiled: Validator,
}

impl StageSchema {
    /// Compile a schema literal.
    ///
    /// Route schemas are written by hand at route-definition time, so an
    /// invalid literal is a programming error and panics at startup.
    #[must_use]
    pub fn compile(schema: Value) -> Self {
        let compiled = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema)
            .expect("invalid route schema");
        StageSchema {
            raw: schema,
            compiled,
        }
    }

    /// Coerce a raw string map into a typed JSON object using the
    /// schema's declared property types, then fill declared defaults for
    /// properties the request omitted.
    #[must_use]
    pub fn coerce_map(&self, raw: &HashMap<String, String>) -> Value {
        let props = self.raw.get("properties").and_then(Value::as_object);
        let mut out = Map::new();
        for (name, value) in raw {
            let prop_schema = props.and_then(|p| p.get(name));
            out.insert(name.clone(), coerce_value(value, prop_schema));
        }
        if let Some(props) = props {
            for (name, prop_schema) in props {
                if !out.contains_key(name) {
                    if let Some(default) = prop_schema.get("default") {
                        out.insert(name.clone(), default.clone());
                    }
                }
            }
        }
        Value::Object(out)
    }

    /// Validate a value, reporting every failed field of this stage.
    ///
    /// # Errors
    ///
    /// `HttpError::Validation` whose message is the stage name followed by
    /// each failure's reason and instance path.
    pub fn check(&self, stage: Stage, value: &Value) -> Result<(), HttpError> {
        let details: Vec<String> = self.compiled.iter_errors(value).map(format_error).collect();
        if details.is_empty() {
            Ok(())
        } else {
            Err(HttpError::validation(format!(
                "{} {}",
                stage,
                details.join("; ")
            )))
        }
    }
}

fn format_error(err: jsonschema::ValidationError<'_>) -> String {
    let path = err.instance_path().to_string();
    if path.is_empty() {
        err.to_string()
    } else {
        format!("{err} at \"{path}\"")
    }
}

fn coerce_value(value: &str, schema: Option<&Value>) -> Value {
    fn convert_primitive(val: &str, schema: Option<&Value>) -> Value {
        if let Some(ty) = schema.and_then(|s| s.get("type").and_then(|v| v.as_str())) {
            match ty {
                "integer" => val
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                "number" => val
                    .parse::<f64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                "boolean" => val
                    .parse::<bool>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(val.to_string())),
                _ => Value::String(val.to_string()),
            }
        } else {
            Value::String(val.to_string())
        }
    }

    if let Some(ty) = schema.and_then(|s| s.get("type").and_then(|v| v.as_str())) {
        match ty {
            "array" => {
                let items_schema = schema.and_then(|s| s.get("items"));
                let parts = value
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|p| convert_primitive(p.trim(), items_schema))
                    .collect::<Vec<_>>();
                Value::Array(parts)
            }
            "object" => serde_json::from_str(value).unwrap_or(Value::String(value.to_string())),
            _ => convert_primitive(value, schema),
        }
    } else {
        Value::String(value.to_string())
    }
}

/// The validated, typed values of the three stages. `None` means the
/// route declared no schema for that stage and the raw input was never
/// inspected.
#[derive(Debug, Clone, Default)]
pub struct StageValues {
    pub query: Option<Value>,
    pub params: Option<Value>,
    pub body: Option<Value>,
}

/// The optional per-stage schemas of one route.
///
/// Mutated only while the route builder is accumulating schemas;
/// immutable once the route's descriptor is compiled.
#[derive(Default)]
pub struct SchemaSet {
    pub query: Option<StageSchema>,
    pub params: Option<StageSchema>,
    pub body: Option<StageSchema>,
}

impl SchemaSet {
    /// Validate all declared stages in the fixed order query → params →
    /// body, failing fast on the first stage that rejects its input.
    ///
    /// # Errors
    ///
    /// The first failing stage's `HttpError::Validation`; later stages
    /// are not evaluated.
    pub fn validate(
        &self,
        query: &HashMap<String, String>,
        params: &HashMap<String, String>,
        body: Option<&Value>,
    ) -> Result<StageValues, HttpError> {
        let query = match &self.query {
            Some(schema) => {
                let value = schema.coerce_map(query);
                schema.check(Stage::Query, &value)?;
                Some(value)
            }
            None => None,
        };
        let params = match &self.params {
            Some(schema) => {
                let value = schema.coerce_map(params);
                schema.check(Stage::Params, &value)?;
                Some(value)
            }
            None => None,
        };
        let body = match &self.body {
            Some(schema) => {
                let value = body.cloned().unwrap_or(Value::Null);
                schema.check(Stage::Body, &value)?;
                Some(value)
            }
            None => None,
        };
        Ok(StageValues {
            query,
            params,
            body,
        })
    }
}
