//! Structural request validation.
//!
//! A [`Schema`] lists fields with a type and whether they are required.
//! Validation only checks presence and type; business rules belong to the
//! handler. All offending fields are reported together, in declaration order.
//!
//! # Example
//!
//! ```
//! use signage_api::schema::{FieldType, Schema};
//!
//! let schema = Schema::new()
//!     .required("id", FieldType::String)
//!     .required("name", FieldType::String);
//!
//! let params = schema.validate_query("id=S1&name=logo.png").unwrap();
//! assert_eq!(params.get_str("name"), Some("logo.png"));
//!
//! assert!(schema.validate_query("id=S1").is_err());
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use url::form_urlencoded;

use crate::error::ApiError;

/// JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Whether a JSON value has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }

    /// Convert a textual query value into this type.
    fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            FieldType::String => Some(Value::String(raw.to_string())),
            FieldType::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<u64>().map(Value::from))
                .ok(),
            FieldType::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            FieldType::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldType::Array | FieldType::Object => serde_json::from_str::<Value>(raw)
                .ok()
                .filter(|v| self.matches(v)),
        }
    }
}

/// Where an endpoint reads its parameters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// URL query string
    Query,
    /// JSON request body
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
    pub required: bool,
}

/// Declared request shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: impl Into<String>, kind: FieldType) -> Self {
        self.field(name, kind, true)
    }

    pub fn optional(self, name: impl Into<String>, kind: FieldType) -> Self {
        self.field(name, kind, false)
    }

    fn field(mut self, name: impl Into<String>, kind: FieldType, required: bool) -> Self {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldSpec {
            name,
            kind,
            required,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate an already-decoded JSON object.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<ValidatedParams, ApiError> {
        let mut report = Report::default();
        let mut out = Map::new();

        for field in &self.fields {
            match raw.get(&field.name) {
                None if field.required => report.missing(&field.name),
                None => {}
                Some(value) if field.kind.matches(value) => {
                    out.insert(field.name.clone(), value.clone());
                }
                Some(_) => report.wrong_type(field),
            }
        }

        report.finish(out)
    }

    /// Validate a raw (still percent-encoded) query string.
    ///
    /// Query values are text; integer, number and boolean fields are parsed
    /// from their textual form. A field given more than once is rejected.
    pub fn validate_query(&self, query: &str) -> Result<ValidatedParams, ApiError> {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        let mut report = Report::default();
        let mut out = Map::new();

        for field in &self.fields {
            match values.get(&field.name).map(Vec::as_slice) {
                None | Some([]) => {
                    if field.required {
                        report.missing(&field.name);
                    }
                }
                Some([raw]) => match field.kind.coerce(raw) {
                    Some(value) => {
                        out.insert(field.name.clone(), value);
                    }
                    None => report.wrong_type(field),
                },
                Some(_) => report.repeated(&field.name),
            }
        }

        report.finish(out)
    }

    /// Validate a JSON request body. An empty body counts as `{}`.
    pub fn validate_body(&self, body: &[u8]) -> Result<ValidatedParams, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return self.validate(&Map::new());
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => self.validate(&map),
            Ok(_) => Err(ApiError::invalid("Request body must be a JSON object.")),
            Err(_) => Err(ApiError::invalid("Request body is not valid JSON.")),
        }
    }
}

/// Collects validation failures.
#[derive(Default)]
struct Report {
    problems: Vec<String>,
    fields: Vec<String>,
}

impl Report {
    fn missing(&mut self, name: &str) {
        self.problems
            .push(format!("missing required field '{}'", name));
        self.fields.push(name.to_string());
    }

    fn wrong_type(&mut self, field: &FieldSpec) {
        self.problems.push(format!(
            "field '{}' must be of type {}",
            field.name,
            field.kind.name()
        ));
        self.fields.push(field.name.clone());
    }

    fn repeated(&mut self, name: &str) {
        self.problems
            .push(format!("field '{}' must be given only once", name));
        self.fields.push(name.to_string());
    }

    fn finish(self, out: Map<String, Value>) -> Result<ValidatedParams, ApiError> {
        if self.problems.is_empty() {
            Ok(ValidatedParams(out))
        } else {
            Err(ApiError::InvalidRequest {
                message: format!("Invalid request parameters: {}.", self.problems.join("; ")),
                fields: self.fields,
            })
        }
    }
}

/// Parameters that passed schema validation.
///
/// Only declared fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParams(Map<String, Value>);

impl ValidatedParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Deserialize into a handler's parameter struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ApiError::Internal(format!("validated parameters do not fit: {}", e)))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
