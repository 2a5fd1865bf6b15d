use serde_json::Value;

/// Headline figures, in order of preference.
const PRIORITY_KEYS: [&str; 4] = ["return", "cumulative_twr", "annualized_twr", "cumulative_mwr"];

/// Print just the headline number.
///
/// For a single calculation this is the return. For a report it is the
/// cumulative TWR of the last period that has one.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let row = match result {
        Value::Array(rows) => rows.iter().rev().find(|r| headline(r).is_some()),
        other => Some(other),
    };

    match row {
        Some(row) => match headline(row) {
            Some(val) => println!("{}", format_minimal(val)),
            None => println!("{}", format_minimal(row)),
        },
        None => println!("null"),
    }
}

fn headline(row: &Value) -> Option<&Value> {
    let map = row.as_object()?;
    PRIORITY_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_prefers_return() {
        let row = json!({"method": "Modified Dietz", "return": "0.0484", "in_percent": false});
        assert_eq!(headline(&row), Some(&json!("0.0484")));
    }

    #[test]
    fn test_headline_skips_null() {
        let row = json!({"cumulative_twr": null, "annualized_twr": "0.1"});
        assert_eq!(headline(&row), Some(&json!("0.1")));
        assert_eq!(headline(&json!({"caption": "2023"})), None);
    }
}
