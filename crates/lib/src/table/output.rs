//! The root document produced by the linker and consumed by the binder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::definitions::{SUMMARY_INFORMATION, summary_information_table};
use super::{RowKey, SchemaError, Table, TableDefinition, Value};

/// Word-count summary property (PID 15).
const PID_WORD_COUNT: i64 = 15;

/// Bit of the word count meaning "files are compressed by default".
const WORD_COUNT_COMPRESSED: i64 = 0x2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
  Product,
  Module,
  Patch,
  Transform,
  Bundle,
}

/// A named nested document, e.g. one transform inside a patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubStorage {
  pub name: String,
  pub data: Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
  pub kind: OutputKind,
  #[serde(default)]
  tables: BTreeMap<String, Table>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sub_storages: Vec<SubStorage>,
}

impl Output {
  pub fn new(kind: OutputKind) -> Self {
    Self {
      kind,
      tables: BTreeMap::new(),
      sub_storages: Vec::new(),
    }
  }

  /// Return the table named by `definition`, creating it when absent.
  ///
  /// An existing table must have been created from an equal definition.
  pub fn ensure_table(&mut self, definition: &TableDefinition) -> Result<&mut Table, SchemaError> {
    let table = self
      .tables
      .entry(definition.name.clone())
      .or_insert_with(|| Table::new(definition.clone()));
    if table.definition() != definition {
      return Err(SchemaError::DefinitionMismatch {
        table: definition.name.clone(),
      });
    }
    Ok(table)
  }

  /// Insert a whole table, replacing any table with the same name.
  pub fn insert_table(&mut self, table: Table) -> Option<Table> {
    self.tables.insert(table.name().to_string(), table)
  }

  pub fn table(&self, name: &str) -> Option<&Table> {
    self.tables.get(name)
  }

  pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
    self.tables.get_mut(name)
  }

  pub fn require_table(&self, name: &str) -> Result<&Table, SchemaError> {
    self.table(name).ok_or_else(|| SchemaError::MissingTable(name.to_string()))
  }

  pub fn remove_table(&mut self, name: &str) -> Option<Table> {
    self.tables.remove(name)
  }

  /// Tables in name order.
  pub fn tables(&self) -> impl Iterator<Item = &Table> {
    self.tables.values()
  }

  pub fn table_names(&self) -> impl Iterator<Item = &str> {
    self.tables.keys().map(String::as_str)
  }

  pub fn sub_storage(&self, name: &str) -> Option<&Output> {
    self.sub_storages.iter().find(|s| s.name == name).map(|s| &s.data)
  }

  /// Structural equality: same kind, same table names, same rows per table.
  pub fn same_content(&self, other: &Output) -> bool {
    self.kind == other.kind
      && self.tables.len() == other.tables.len()
      && self
        .tables
        .iter()
        .all(|(name, table)| other.tables.get(name).is_some_and(|o| table.same_content(o)))
  }

  /// Value of summary property `pid`, if authored.
  pub fn summary_value(&self, pid: i64) -> Option<&Value> {
    let table = self.table(SUMMARY_INFORMATION)?;
    let row = table.find(&RowKey::single(pid))?;
    row.get("Value").ok().flatten()
  }

  /// Set summary property `pid`, creating the summary table when needed.
  pub fn set_summary_value(&mut self, pid: i64, value: Value) -> Result<(), SchemaError> {
    let table = self.ensure_table(&summary_information_table())?;
    match table.find_mut(&RowKey::single(pid)) {
      Some(mut row) => row.set("Value", Some(value)),
      None => table.create_row(vec![Value::Number(pid)], None)?.set("Value", Some(value)),
    }
  }

  /// Whether the package's word count marks files as compressed by default.
  pub fn files_compressed_by_default(&self) -> bool {
    let word_count = match self.summary_value(PID_WORD_COUNT) {
      Some(Value::Number(n)) => *n,
      Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
      _ => 0,
    };
    word_count & WORD_COUNT_COMPRESSED != 0
  }
}
