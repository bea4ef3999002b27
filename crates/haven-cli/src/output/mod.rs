use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

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

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    match serde_json::to_value(value)? {
        Value::Array(items) => Ok(render_rows(&items)),
        Value::Object(map) => {
            let rows = map
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_table(&["field", "value"], &rows, table_options()))
        }
        scalar => Ok(table::render_table(
            &["value"],
            &[vec![value_to_cell(&scalar)]],
            table_options(),
        )),
    }
}

/// One row per item, one column per key seen on any item.
fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    if !items.iter().all(Value::is_object) {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render_table(&["value"], &rows, table_options());
    }

    let mut headers = Vec::<String>::new();
    for key in items.iter().filter_map(Value::as_object).flat_map(|m| m.keys()) {
        if !headers.contains(key) {
            headers.push(key.clone());
        }
    }

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

    table::render_table(&header_refs, &rows, table_options())
}

/// Flatten a JSON value into a single cell.
///
/// Coordinates and location fixes collapse to `lat,lng`; lists of strings
/// join with commas; anything else nested falls back to compact JSON.
fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Object(map) => match (map.get("lat"), map.get("lng")) {
            (Some(Value::Number(lat)), Some(Value::Number(lng))) => format!("{lat},{lng}"),
            _ => compact(value),
        },
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => format!("[{} items]", items.len()),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("<invalid-json>"))
}
