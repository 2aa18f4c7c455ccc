// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical Encoding
//!
//! Single recursive pass over [`Value`].
//!
//! # Numeric format
//! ```text
//! Int / UInt         -> decimal            (-3, 0, 18446744073709551615)
//! Float, integral    -> decimal integer    (1.0 -> 1, -0.0 -> 0, 1e21 -> 1000000000000000000000)
//! Float, fractional  -> shortest round-trip decimal, no exponent (0.1, 1.25, 0.0000001)
//! NaN / ±Infinity    -> EncodingError
//! ```
//! Rust's `Display` for `f64` already produces the shortest round-trip digits
//! without exponent notation, so one formatting path covers all finite floats.

use std::io::Write;

use serde::Serialize;

use crate::canonical::value::{Number, Value};
use crate::error::{KernelError, KernelResult};

/// Canonicalize a value into UTF-8 bytes.
pub fn canonicalize(value: &Value) -> KernelResult<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    write_value(value, &mut out)?;
    Ok(out)
}

/// Canonicalize a `serde_json::Value` without a caller-side conversion.
pub fn canonicalize_json(json: &serde_json::Value) -> KernelResult<Vec<u8>> {
    canonicalize(&Value::from(json.clone()))
}

/// Canonicalize any serializable type.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> KernelResult<Vec<u8>> {
    canonicalize(&Value::from_serialize(value)?)
}

/// True when `bytes` parse as JSON and are already in canonical form.
pub fn is_canonical(bytes: &[u8]) -> bool {
    match Value::from_slice(bytes).and_then(|v| canonicalize(&v)) {
        Ok(canonical) => canonical == bytes,
        Err(_) => false,
    }
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> KernelResult<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            // BTreeMap<String, _> iterates in byte order of the keys.
            out.push(b'{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut Vec<u8>) -> KernelResult<()> {
    match *n {
        Number::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Number::UInt(u) => {
            let _ = write!(out, "{}", u);
        }
        Number::Float(f) => {
            if !f.is_finite() {
                return Err(KernelError::Encoding(format!(
                    "non-finite number has no canonical form: {}",
                    f
                )));
            }
            if f == 0.0 {
                // Collapses -0.0.
                out.push(b'0');
            } else {
                let _ = write!(out, "{}", f);
            }
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => {
                let b = c as u8;
                out.extend_from_slice(b"\\u00");
                out.push(HEX[(b >> 4) as usize]);
                out.push(HEX[(b & 0x0f) as usize]);
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn s(v: &Value) -> String {
        String::from_utf8(canonicalize(v).unwrap()).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(s(&Value::Null), "null");
        assert_eq!(s(&Value::Bool(true)), "true");
        assert_eq!(s(&Value::Bool(false)), "false");
        assert_eq!(s(&Value::from(-3i64)), "-3");
        assert_eq!(s(&Value::from(u64::MAX)), "18446744073709551615");
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(s(&Value::from(1.0f64)), "1");
        assert_eq!(s(&Value::from(-0.0f64)), "0");
        assert_eq!(s(&Value::from(0.5f64)), "0.5");
        assert_eq!(s(&Value::from(0.1f64)), "0.1");
        assert_eq!(s(&Value::from(1.25f64)), "1.25");
        assert_eq!(s(&Value::from(1e21f64)), "1000000000000000000000");
        assert_eq!(s(&Value::from(1e-7f64)), "0.0000001");
    }

    #[test]
    fn test_integral_float_matches_integer() {
        assert_eq!(
            canonicalize(&Value::from(42.0f64)).unwrap(),
            canonicalize(&Value::from(42u64)).unwrap()
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = canonicalize(&Value::from(f)).unwrap_err();
            assert!(matches!(err, KernelError::Encoding(_)));
        }
        // Nested as well.
        let nested = Value::object([("a", Value::Array(vec![Value::from(f64::NAN)]))]);
        assert!(canonicalize(&nested).is_err());
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(s(&Value::from("a\"b\\c")), r#""a\"b\\c""#);
        assert_eq!(s(&Value::from("line\nbreak\ttab")), r#""line\nbreak\ttab""#);
        assert_eq!(s(&Value::from("\u{01}")), r#""\u0001""#);
        assert_eq!(s(&Value::from("\u{1f}")), r#""\u001f""#);
        assert_eq!(s(&Value::from("héllo ✓")), "\"héllo ✓\"");
        assert_eq!(s(&Value::from("/")), "\"/\"");
    }

    #[test]
    fn test_object_keys_sorted_bytewise() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::from(1u64));
        map.insert("B".to_string(), Value::from(2u64));
        map.insert("a".to_string(), Value::from(3u64));
        map.insert("_".to_string(), Value::Null);
        assert_eq!(s(&Value::Object(map)), r#"{"B":2,"_":null,"a":3,"b":1}"#);
    }

    #[test]
    fn test_no_whitespace() {
        let v = Value::from_slice(br#" { "x" : [ 1 , 2 , { "y" : null } ] } "#).unwrap();
        assert_eq!(s(&v), r#"{"x":[1,2,{"y":null}]}"#);
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical(br#"{"a":1,"b":[true,null]}"#));
        assert!(!is_canonical(br#"{"b":1,"a":2}"#));
        assert!(!is_canonical(br#"{"a": 1}"#));
        assert!(!is_canonical(b"not json"));
    }

    #[test]
    fn test_matches_serde_json_for_sorted_input() {
        // Keys written pre-sorted so the comparison holds with or without
        // serde_json's preserve_order feature.
        let json = serde_json::json!({"amount": 1, "nested": {"k": "v\n"}, "token": "0.0.3"});
        let ours = canonicalize_json(&json).unwrap();
        let theirs = serde_json::to_vec(&json).unwrap();
        assert_eq!(ours, theirs);
    }
}
