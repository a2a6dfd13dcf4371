//! Schema-driven parameter value coercion.
//!
//! The set of allowed value shapes for a parameter is fully determined by
//! its declared schema type — never inferred from the text's content.

use agentkit_error::CoreError;
use agentkit_types::{ParamSchema, ParamType, ParamValue};

use crate::nested_tag;

/// Coerce raw extracted `<PARAM>` text into a typed value per its schema.
pub fn coerce(raw: &str, schema: &ParamSchema) -> Result<ParamValue, CoreError> {
    match schema.param_type {
        // Preserve whitespace verbatim: this is what lets a `content`
        // parameter carry unescaped source code.
        ParamType::String => Ok(ParamValue::String(raw.to_string())),
        ParamType::Integer => coerce_int(raw, schema),
        ParamType::Number => coerce_float(raw, schema),
        ParamType::Boolean => coerce_bool(raw, schema),
        ParamType::Object | ParamType::Array => Ok(coerce_object_or_array(raw)),
    }
}

fn coerce_int(raw: &str, schema: &ParamSchema) -> Result<ParamValue, CoreError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map(ParamValue::Int)
        .map_err(|_| CoreError::TypeError {
            param: schema.name.clone(),
            expected: "integer".into(),
            message: format!("'{trimmed}' is not an integer"),
        })
}

fn coerce_float(raw: &str, schema: &ParamSchema) -> Result<ParamValue, CoreError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .map(ParamValue::Float)
        .map_err(|_| CoreError::TypeError {
            param: schema.name.clone(),
            expected: "number".into(),
            message: format!("'{trimmed}' is not a number"),
        })
}

fn coerce_bool(raw: &str, schema: &ParamSchema) -> Result<ParamValue, CoreError> {
    let trimmed = raw.trim().to_ascii_lowercase();
    match trimmed.as_str() {
        "true" | "1" | "yes" => Ok(ParamValue::Bool(true)),
        "false" | "0" | "no" => Ok(ParamValue::Bool(false)),
        _ => Err(CoreError::TypeError {
            param: schema.name.clone(),
            expected: "boolean".into(),
            message: format!("'{trimmed}' is not true/false/1/0/yes/no"),
        }),
    }
}

/// Try nested-tag format, then JSON, then a permissive literal form; on
/// all-failure return the stripped text. This never errors.
fn coerce_object_or_array(raw: &str) -> ParamValue {
    if let Some(v) = nested_tag::parse(raw) {
        return v;
    }
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(raw.trim()) {
        return json_to_param(&v);
    }
    if let Some(v) = parse_permissive_literal(raw.trim()) {
        return v;
    }
    ParamValue::String(raw.trim().to_string())
}

fn json_to_param(v: &serde_json::Value) -> ParamValue {
    match v {
        serde_json::Value::Null => ParamValue::Null,
        serde_json::Value::Bool(b) => ParamValue::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ParamValue::Int(i)
            } else {
                ParamValue::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => ParamValue::String(s.clone()),
        serde_json::Value::Array(items) => ParamValue::Array(items.iter().map(json_to_param).collect()),
        serde_json::Value::Object(map) => ParamValue::Object(
            map.iter().map(|(k, v)| (k.clone(), json_to_param(v))).collect(),
        ),
    }
}

/// A permissive literal fallback for near-miss JSON (e.g. single-quoted
/// strings, trailing commas) the model sometimes emits instead of the
/// nested-tag format.
fn parse_permissive_literal(trimmed: &str) -> Option<ParamValue> {
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = &trimmed[1..trimmed.len() - 1];
        let items: Vec<ParamValue> = split_top_level(inner, ',')
            .into_iter()
            .map(|s| ParamValue::String(unquote(s.trim())))
            .collect();
        return Some(ParamValue::Array(items));
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let inner = &trimmed[1..trimmed.len() - 1];
        let mut map = std::collections::BTreeMap::new();
        for pair in split_top_level(inner, ',') {
            if let Some((k, v)) = pair.split_once(':') {
                map.insert(unquote(k.trim()), ParamValue::String(unquote(v.trim())));
            }
        }
        if !map.is_empty() {
            return Some(ParamValue::Object(map));
        }
    }
    None
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')) {
        if s.len() >= 2 {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut out = Vec::new();
    for (i, c) in s.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let tail = &s[start..];
    if !tail.trim().is_empty() || !out.is_empty() {
        out.push(tail);
    }
    out
}
