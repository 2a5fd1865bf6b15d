use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Columns that always appear in a report table, before any populated figures.
const REPORT_LEAD: [&str; 3] = ["caption", "start_date", "end_date"];

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                print_pairs(result);
                print_footer(map);
            }
            Some(Value::Array(rows)) => {
                print_report(rows);
                print_footer(map);
            }
            _ => print_pairs(map),
        },
        Value::Array(rows) => print_report(rows),
        _ => println!("{}", value),
    }
}

fn print_pairs(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

/// One row per period. Columns that are null in every row are dropped.
fn print_report(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no periods)");
        return;
    }
    let columns = report_columns(rows);

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.as_str()));
    for row in rows.iter().filter_map(Value::as_object) {
        builder.push_record(
            columns
                .iter()
                .map(|c| row.get(c.as_str()).map(format_value).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn report_columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = REPORT_LEAD.iter().map(|c| c.to_string()).collect();
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return columns;
    };
    for key in first.keys() {
        if REPORT_LEAD.contains(&key.as_str()) {
            continue;
        }
        let populated = rows
            .iter()
            .filter_map(Value::as_object)
            .any(|r| r.get(key).is_some_and(|v| !v.is_null()));
        if populated {
            columns.push(key.clone());
        }
    }
    columns
}

fn print_footer(envelope: &Map<String, Value>) {
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

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
