// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Command output: one JSON status line, or a table for humans.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::{json, Map, Value};

use anchor_node::errors::AnchorError;

/// Wrap a command report as `{"status": ..., ...fields}`.
pub fn with_status(status: &str, report: Value) -> Value {
    let mut out = Map::new();
    out.insert("status".into(), Value::String(status.into()));
    match report {
        Value::Object(fields) => out.extend(fields),
        other => {
            out.insert("result".into(), other);
        }
    }
    Value::Object(out)
}

pub fn error_line(err: &AnchorError) -> Value {
    let mut line = json!({
        "status": "error",
        "kind": err.kind().as_str(),
        "message": err.to_string(),
        "exitCode": err.exit_code(),
    });
    if let AnchorError::BindingMismatch { mismatches } = err {
        line["mismatches"] = json!(mismatches);
    }
    if let AnchorError::LocatorMismatch { local, reported } = err {
        line["locator"] = json!({ "local": local, "reported": reported });
    }
    line
}

pub fn render(line: &Value, table: bool) -> String {
    if !table {
        return line.to_string();
    }

    let mut t = Table::new();
    t.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);
    let mut rows = Vec::new();
    flatten("", line, &mut rows);
    for (key, value) in rows {
        t.add_row(vec![key, value]);
    }
    t.to_string()
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                flatten(&key, v, rows);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, v) in items.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, i), v, rows);
            }
        }
        Value::String(s) => rows.push((prefix.to_string(), s.clone())),
        other => rows.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_merged_into_report() {
        let line = with_status("ok", json!({"uri": "hcs://0.0.1/1.000000000"}));
        assert_eq!(line["status"], "ok");
        assert_eq!(line["uri"], "hcs://0.0.1/1.000000000");
        assert!(!render(&line, false).contains('\n'));
    }

    #[test]
    fn test_table_flattens_nested_fields() {
        let line = with_status("ok", json!({"hashes": {"proofHash": "ab"}, "list": [1]}));
        let text = render(&line, true);
        assert!(text.contains("hashes.proofHash"));
        assert!(text.contains("list[0]"));
    }

    #[test]
    fn test_locator_mismatch_names_both_locators() {
        let err = AnchorError::LocatorMismatch {
            local: "hcs://0.0.6006/5.000000000".into(),
            reported: "hcs://0.0.6006/1.000000001".into(),
        };
        let line = error_line(&err);
        assert_eq!(line["kind"], "BindingMismatchError");
        assert_eq!(line["exitCode"], 22);
        assert_eq!(line["locator"]["reported"], "hcs://0.0.6006/1.000000001");
    }
}
