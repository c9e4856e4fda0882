//! Typed access to caller-supplied parameter maps
//!
//! Provisioning and bind parameters arrive as untyped JSON objects. Every
//! recognized key is read through these helpers, which check presence and
//! type and report `Error::InvalidParameter` naming the offending key.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Untyped key → value parameter map
pub type Parameters = serde_json::Map<String, Value>;

/// Key holding resource metadata overrides
pub const METADATA_KEY: &str = "metadata";

/// Key holding the custom-plan resource spec
pub const SPEC_KEY: &str = "spec";

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Optional string parameter; null counts as absent
pub fn optional_str<'a>(params: &'a Parameters, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(Error::invalid_parameter(
            key,
            format!("expected a string, got {}", json_type(other)),
        )),
    }
}

/// Optional object parameter; null counts as absent
pub fn optional_object<'a>(params: &'a Parameters, key: &str) -> Result<Option<&'a Parameters>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::invalid_parameter(
            key,
            format!("expected an object, got {}", json_type(other)),
        )),
    }
}

/// Required object parameter
pub fn required_object<'a>(params: &'a Parameters, key: &str) -> Result<&'a Parameters> {
    optional_object(params, key)?
        .ok_or_else(|| Error::invalid_parameter(key, "required parameter is missing"))
}

fn string_map(key: &str, map: &Parameters) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            other => Err(Error::invalid_parameter(
                format!("{}.{}", key, k),
                format!("expected a string, got {}", json_type(other)),
            )),
        })
        .collect()
}

/// Resource metadata overrides carried in `parameters.metadata`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataParams {
    pub name: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl MetadataParams {
    /// Read `metadata.{name,labels,annotations}` from the parameters
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let Some(meta) = optional_object(params, METADATA_KEY)? else {
            return Ok(Self::default());
        };

        let name = optional_str(meta, "name")
            .map_err(|_| Error::invalid_parameter("metadata.name", "expected a string"))?
            .map(str::to_string);
        let labels = match optional_object(meta, "labels") {
            Ok(Some(map)) => string_map("metadata.labels", map)?,
            Ok(None) => BTreeMap::new(),
            Err(_) => return Err(Error::invalid_parameter("metadata.labels", "expected an object")),
        };
        let annotations = match optional_object(meta, "annotations") {
            Ok(Some(map)) => string_map("metadata.annotations", map)?,
            Ok(None) => BTreeMap::new(),
            Err(_) => {
                return Err(Error::invalid_parameter(
                    "metadata.annotations",
                    "expected an object",
                ))
            }
        };

        Ok(Self {
            name,
            labels,
            annotations,
        })
    }
}

/// Overlay `overlay` on top of `base` (top-level keys only)
pub fn merge(base: &Parameters, overlay: &Parameters) -> Parameters {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Parse a JSON object from text
pub fn parse(text: &str) -> Result<Parameters> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_parameter(
            "parameters",
            format!("expected an object, got {}", json_type(&other)),
        )),
    }
}
