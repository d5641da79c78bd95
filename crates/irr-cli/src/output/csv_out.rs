use serde_json::Value;
use std::io;

use super::{flatten_fields, format_scalar, payload};

/// Two-column `field,value` CSV of the result to stdout. Nested objects
/// become dotted field names; warnings follow as `warning` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let _ = wtr.write_record(["field", "value"]);
    match payload(value) {
        Value::Object(fields) => {
            for (key, val) in flatten_fields(fields) {
                let _ = wtr.write_record([key, format_scalar(val, "")]);
            }
        }
        other => {
            let _ = wtr.write_record(["value".to_string(), format_scalar(other, "")]);
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        for w in warnings.iter().filter_map(Value::as_str) {
            let _ = wtr.write_record(["warning", w]);
        }
    }

    let _ = wtr.flush();
}
