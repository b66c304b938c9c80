//! Result output: comfy-table or indented JSON

use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Print `rows` with the given columns, or `empty` when there are none
pub fn print_rows<T: Serialize>(
    rows: &[T],
    columns: &[&str],
    format: OutputFormat,
    empty: &str,
) -> Result<(), serde_json::Error> {
    if rows.is_empty() {
        println!("{}", empty);
        return Ok(());
    }
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(columns.to_vec());
            for row in rows {
                let value = serde_json::to_value(row)?;
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| format_cell(value.get(*c).unwrap_or(&serde_json::Value::Null)))
                    .collect();
                table.add_row(cells);
            }
            println!("{}", table);
            println!("{} row(s)", rows.len());
        }
    }
    Ok(())
}

pub fn format_cell(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        // nested nodes show their label
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item.get("title").or_else(|| item.get("username")) {
                Some(label) => format_cell(label),
                None => format_cell(item),
            })
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Object(_) => serde_json::to_string(v).unwrap_or_default(),
    }
}
