//! Implementation of the `msibind inspect` command.

use std::path::Path;

use anyhow::{Context, Result};

use msibind_lib::persist;
use msibind_lib::table::views::TypedRow;
use msibind_lib::table::{Output, Table};

use crate::output::{print_info, print_json, print_stat, symbols};

/// List the tables of an output, or the rows of one table.
pub fn cmd_inspect(file: &Path, table: Option<&str>, json: bool) -> Result<()> {
  let document =
    persist::load_output(file).with_context(|| format!("Failed to load output {}", file.display()))?;

  match table {
    Some(name) => {
      let table = document
        .require_table(name)
        .with_context(|| format!("{} has no table '{}'", file.display(), name))?;
      print_rows(table, json)
    }
    None => print_summary(&document, json),
  }
}

fn print_summary(document: &Output, json: bool) -> Result<()> {
  if json {
    let tables: Vec<_> = document
      .tables()
      .map(|t| serde_json::json!({ "name": t.name(), "rows": t.len(), "operation": t.operation() }))
      .collect();
    let storages: Vec<_> = document.sub_storages.iter().map(|s| s.name.as_str()).collect();
    let json_output = serde_json::json!({ "kind": document.kind, "tables": tables, "sub_storages": storages });
    return print_json(&json_output);
  }

  print_info(&format!("{:?} output", document.kind));
  for table in document.tables() {
    print_stat(table.name(), &format!("{} row(s)", table.len()));
  }
  for storage in &document.sub_storages {
    println!("  {} {} ({:?})", symbols::ARROW, storage.name, storage.data.kind);
  }
  Ok(())
}

fn print_rows(table: &Table, json: bool) -> Result<()> {
  let columns: Vec<&str> = table.definition().columns.iter().map(|c| c.name.as_str()).collect();

  if json {
    let mut rows = Vec::with_capacity(table.len());
    for row in table.iter() {
      let value = match TypedRow::from_row(row)? {
        Some(typed) => serde_json::to_value(typed)?,
        None => {
          let fields = columns.iter().zip(row.row().fields()).map(|(column, field)| {
            let value = field.data.as_ref().map(|v| v.to_string());
            (column.to_string(), serde_json::json!(value))
          });
          serde_json::Value::Object(fields.collect())
        }
      };
      rows.push(value);
    }
    return print_json(&rows);
  }

  println!("{}", columns.join("\t"));
  for row in table.iter() {
    let values: Vec<String> = row
      .row()
      .fields()
      .iter()
      .map(|f| f.data.as_ref().map(|v| v.to_string()).unwrap_or_default())
      .collect();
    println!("{}", values.join("\t"));
  }
  Ok(())
}
