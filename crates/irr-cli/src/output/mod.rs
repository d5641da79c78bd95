pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The payload of a computation envelope, or the value itself when it is
/// not wrapped.
fn payload(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into `parent.child` rows.
fn flatten_fields(map: &Map<String, Value>) -> Vec<(String, &Value)> {
    let mut rows = Vec::new();
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (sub_key, sub_val) in flatten_fields(inner) {
                    rows.push((format!("{key}.{sub_key}"), sub_val));
                }
            }
            _ => rows.push((key.clone(), val)),
        }
    }
    rows
}

fn format_scalar(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| format_scalar(v, null))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_analysis() {
        let value = json!({
            "irr": "0.0547",
            "analysis": { "recommendation": "text", "risk_level": "Low" },
        });
        let rows = flatten_fields(value.as_object().unwrap());
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["analysis.recommendation", "analysis.risk_level", "irr"]);
    }

    #[test]
    fn test_payload_unwraps_envelope() {
        let wrapped = json!({ "result": { "npv": "1.5" }, "warnings": [] });
        assert_eq!(payload(&wrapped), &json!({ "npv": "1.5" }));
        let bare = json!({ "risk_level": "High" });
        assert_eq!(payload(&bare), &bare);
    }

    #[test]
    fn test_format_scalar_null_placeholder() {
        assert_eq!(format_scalar(&Value::Null, "-"), "-");
        assert_eq!(format_scalar(&json!(["a", "b"]), ""), "a, b");
    }
}
