use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub mod table;

/// Columns shown first, in this order, when present.
const LEADING_COLUMNS: &[&str] = &[
    "id",
    "key",
    "operation",
    "entity_type",
    "entity_type_id",
    "entity_name",
    "created_on",
    "created_by",
    "current",
    "previous",
    "changed",
];

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    match serde_json::to_value(value)? {
        Value::Array(items) => Ok(render_array_table(&items)),
        Value::Object(map) => {
            let mut entries = map.into_iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let rows = entries
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_table(&["key", "value"], &rows))
        }
        scalar => Ok(table::render_table(&["value"], &[vec![value_to_cell(&scalar)]])),
    }
}

fn render_array_table(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    if !items.iter().all(Value::is_object) {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render_table(&["value"], &rows);
    }

    let headers = column_order(items);
    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), value_to_cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::render_table(&header_refs, &rows)
}

fn column_order(items: &[Value]) -> Vec<String> {
    let mut rest = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !LEADING_COLUMNS.contains(&key.as_str()) && !rest.contains(key) {
                rest.push(key.clone());
            }
        }
    }
    rest.sort();

    LEADING_COLUMNS
        .iter()
        .filter(|col| items.iter().any(|item| item.get(**col).is_some()))
        .map(ToString::to_string)
        .chain(rest)
        .collect()
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use serde_json::json;

    use super::{render, table::render_table};
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        id: i64,
        name: &'static str,
    }

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&Example { id: 7, name: "x" }, OutputFormat::Json).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], 7);
        assert_eq!(parsed["name"], "x");
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&Example { id: 7, name: "x" }, OutputFormat::Raw).expect("raw");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn record_columns_lead_the_table() {
        let rows = json!([
            {"data": {"name": "foo"}, "operation": "INSERT", "id": 1, "created_by": null},
            {"data": {"name": "bar"}, "operation": "UPDATE", "id": 2, "created_by": "U1"},
        ]);
        let out = render(&rows, OutputFormat::Table).expect("table");
        let header: Vec<&str> = out.lines().next().unwrap().split_whitespace().collect();
        assert_eq!(header, vec!["id", "operation", "created_by", "data"]);
        assert!(out.contains(r#"{"name":"bar"}"#));
    }

    #[test]
    fn empty_array_renders_placeholder() {
        let rows: Vec<Example> = Vec::new();
        assert_eq!(render(&rows, OutputFormat::Table).unwrap(), "(no rows)");
    }

    #[test]
    fn long_cells_are_cut() {
        let long = "x".repeat(100);
        let out = render_table(&["value"], &[vec![long]]);
        let last = out.lines().last().unwrap();
        assert_eq!(last.chars().count(), super::table::MAX_CELL_WIDTH);
        assert!(last.ends_with(".."));
    }
}
