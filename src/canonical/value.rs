// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Tagged JSON value.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{KernelError, KernelResult};

/// A JSON number, kept in the representation it arrived in.
///
/// `Int(1)`, `UInt(1)` and `Float(1.0)` are distinct values in memory but
/// share one canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// Arbitrarily nested JSON value.
///
/// Objects use a `BTreeMap` so iteration is already in byte order of the
/// keys; insertion order never reaches the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Convert any serializable type through `serde_json`.
    ///
    /// Note: `serde_json` maps non-finite floats to `null` during this
    /// conversion. Callers that need NaN rejection must build `Value::Number`
    /// directly.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> KernelResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| KernelError::Encoding(e.to_string()))?;
        Ok(Value::from(json))
    }

    /// Parse JSON text into a value.
    pub fn from_slice(bytes: &[u8]) -> KernelResult<Self> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| KernelError::Encoding(format!("invalid JSON: {}", e)))?;
        Ok(Value::from(json))
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::Number(Number::UInt(u))
                } else if let Some(i) = n.as_i64() {
                    Value::Number(Number::Int(i))
                } else {
                    // serde_json never stores a non-finite f64.
                    Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::UInt(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
