//! Dynamic parameter values, represented as tagged variants rather than
//! sniffed from text.
//!
//! Values coming out of the response parser are heterogeneous and typed only
//! by the tool's declared schema, never by sniffing their textual content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A coerced tool-call parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<ParamValue>),
    Object(BTreeMap<String, ParamValue>),
    Null,
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            ParamValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ParamValue>> {
        match self {
            ParamValue::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Convert to `serde_json::Value`, the shape tools actually consume.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::String(s) => serde_json::Value::String(s.clone()),
            ParamValue::Int(n) => serde_json::Value::from(*n),
            ParamValue::Float(f) => serde_json::json!(f),
            ParamValue::Bool(b) => serde_json::Value::Bool(*b),
            ParamValue::Array(v) => serde_json::Value::Array(v.iter().map(Self::to_json).collect()),
            ParamValue::Object(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            ParamValue::Null => serde_json::Value::Null,
        }
    }
}

/// An ordered bag of named parameter values, preserving the order the model
/// emitted `<PARAM>` tags in (needed for deterministic prompt re-rendering
/// and stable history display).
pub type ParamMap = Vec<(String, ParamValue)>;

pub fn param_get<'a>(params: &'a ParamMap, name: &str) -> Option<&'a ParamValue> {
    params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_for_scalars() {
        assert_eq!(
            ParamValue::String("hi".into()).to_json(),
            serde_json::json!("hi")
        );
        assert_eq!(ParamValue::Int(42).to_json(), serde_json::json!(42));
        assert_eq!(ParamValue::Bool(true).to_json(), serde_json::json!(true));
    }

    #[test]
    fn param_get_finds_by_name() {
        let params: ParamMap = vec![
            ("a".into(), ParamValue::Int(1)),
            ("b".into(), ParamValue::String("x".into())),
        ];
        assert_eq!(param_get(&params, "b").unwrap().as_str(), Some("x"));
        assert!(param_get(&params, "c").is_none());
    }
}
