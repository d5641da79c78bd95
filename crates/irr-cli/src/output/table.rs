use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten_fields, format_scalar, payload};

/// Field/value table of the result, then warnings and methodology.
pub fn print_table(value: &Value) {
    let Value::Object(fields) = payload(value) else {
        println!("{}", format_scalar(value, "-"));
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(fields) {
        builder.push_record([key, format_scalar(val, "-")]);
    }
    println!("{}", Table::from(builder));

    let Some(envelope) = value.as_object() else {
        return;
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
