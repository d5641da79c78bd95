use serde_json::Value;

use super::{format_scalar, payload};

/// Fields that answer each command, in priority order.
const PRIORITY_KEYS: [&str; 4] = ["irr", "npv", "risk_level", "recommendation"];

/// Print just the key answer. An IRR that could not be established prints
/// as `undefined` rather than falling through to another field.
pub fn print_minimal(value: &Value) {
    let result = payload(value);

    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            match map.get(key) {
                Some(Value::Null) if key == "irr" => {
                    println!("undefined");
                    return;
                }
                Some(val) if !val.is_null() => {
                    println!("{}", format_scalar(val, "null"));
                    return;
                }
                _ => {}
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val, "null"));
            return;
        }
    }

    println!("{}", format_scalar(result, "null"));
}
