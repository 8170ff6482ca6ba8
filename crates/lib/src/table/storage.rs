//! Tables: ordered rows under one definition, unique by primary key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::SourceLineNumber;

use super::{Field, Row, RowKey, RowOperation, SchemaError, TableDefinition, Value};

/// What a table represents when it is part of a transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableOperation {
  #[default]
  None,
  Add,
  Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableRepr")]
pub struct Table {
  definition: TableDefinition,
  rows: Vec<Row>,
  #[serde(default)]
  operation: TableOperation,
  #[serde(skip)]
  keys: HashMap<RowKey, usize>,
}

#[derive(Deserialize)]
struct TableRepr {
  definition: TableDefinition,
  #[serde(default)]
  rows: Vec<Row>,
  #[serde(default)]
  operation: TableOperation,
}

impl TryFrom<TableRepr> for Table {
  type Error = SchemaError;

  fn try_from(repr: TableRepr) -> Result<Self, Self::Error> {
    let mut table = Table::new(repr.definition);
    table.operation = repr.operation;
    for row in repr.rows {
      table.check_kinds(&row)?;
      table.add_row(row)?;
    }
    Ok(table)
  }
}

impl Table {
  pub fn new(definition: TableDefinition) -> Self {
    Self {
      definition,
      rows: Vec::new(),
      operation: TableOperation::None,
      keys: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.definition.name
  }

  pub fn definition(&self) -> &TableDefinition {
    &self.definition
  }

  pub fn operation(&self) -> TableOperation {
    self.operation
  }

  pub fn set_operation(&mut self, operation: TableOperation) {
    self.operation = operation;
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
    self.rows.iter().map(|row| RowRef {
      definition: &self.definition,
      row,
    })
  }

  pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
    self.rows.get(index).map(|row| RowRef {
      definition: &self.definition,
      row,
    })
  }

  pub fn row_mut(&mut self, index: usize) -> Option<RowMut<'_>> {
    self.rows.get_mut(index).map(|row| RowMut {
      definition: &self.definition,
      row,
    })
  }

  /// Like [`Table::row_mut`] but reports a missing row as a schema error.
  pub fn require_row_mut(&mut self, index: usize) -> Result<RowMut<'_>, SchemaError> {
    let table = self.definition.name.clone();
    self.row_mut(index).ok_or(SchemaError::MissingRow { table, index })
  }

  /// Primary-key tuple of `row`. Tables without key columns have no identity.
  pub fn key_of(&self, row: &Row) -> Result<Option<RowKey>, SchemaError> {
    let indices = self.definition.primary_key_indices();
    if indices.is_empty() {
      return Ok(None);
    }

    let mut values = Vec::with_capacity(indices.len());
    for i in indices {
      match row.data(i) {
        Some(value) => values.push(value.clone()),
        None => {
          return Err(SchemaError::NullValue {
            table: self.definition.name.clone(),
            column: self.definition.columns[i].name.clone(),
          });
        }
      }
    }
    Ok(Some(RowKey(values)))
  }

  pub fn find_index(&self, key: &RowKey) -> Option<usize> {
    self.keys.get(key).copied()
  }

  pub fn find(&self, key: &RowKey) -> Option<RowRef<'_>> {
    self.find_index(key).and_then(|i| self.row(i))
  }

  pub fn find_mut(&mut self, key: &RowKey) -> Option<RowMut<'_>> {
    self.find_index(key).and_then(move |i| self.row_mut(i))
  }

  /// Create a row with every field allocated and the primary key set.
  ///
  /// `key` lists the primary-key values in column order. Non-key fields start
  /// out null and unmodified.
  pub fn create_row(&mut self, key: Vec<Value>, location: Option<SourceLineNumber>) -> Result<RowMut<'_>, SchemaError> {
    let indices = self.definition.primary_key_indices();
    if key.len() != indices.len() {
      return Err(SchemaError::KeyArity {
        table: self.definition.name.clone(),
        expected: indices.len(),
        actual: key.len(),
      });
    }

    let mut fields = vec![Field::default(); self.definition.len()];
    for (&i, value) in indices.iter().zip(key) {
      self.definition.columns[i].validate(&self.definition.name, Some(&value))?;
      fields[i] = Field::new(Some(value));
    }

    let mut row = Row::from_fields(fields);
    row.source_location = location;
    let index = self.add_row(row)?;
    self.require_row_mut(index)
  }

  /// Append a pre-built row, returning its position.
  pub fn add_row(&mut self, row: Row) -> Result<usize, SchemaError> {
    if row.len() != self.definition.len() {
      return Err(SchemaError::FieldCountMismatch {
        table: self.definition.name.clone(),
        expected: self.definition.len(),
        actual: row.len(),
      });
    }

    let key = self.key_of(&row)?;
    if let Some(key) = &key
      && self.keys.contains_key(key)
    {
      return Err(SchemaError::DuplicateKey {
        table: self.definition.name.clone(),
        key: key.clone(),
      });
    }

    let index = self.rows.len();
    self.rows.push(row);
    if let Some(key) = key {
      self.keys.insert(key, index);
    }
    Ok(index)
  }

  /// Reject a row holding a value of the wrong semantic type in any column.
  fn check_kinds(&self, row: &Row) -> Result<(), SchemaError> {
    for (column, field) in self.definition.columns.iter().zip(row.fields()) {
      for value in [&field.data, &field.previous_data].into_iter().flatten() {
        column.check_kind(&self.definition.name, value)?;
      }
    }
    Ok(())
  }

  pub fn clear_rows(&mut self) {
    self.rows.clear();
    self.keys.clear();
  }

  /// Row-by-row equality of current data.
  pub fn same_content(&self, other: &Table) -> bool {
    self.definition == other.definition
      && self.rows.len() == other.rows.len()
      && self.rows.iter().zip(&other.rows).all(|(a, b)| a.same_data(b))
  }
}

/// Read access to a row together with its table's definition.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
  definition: &'a TableDefinition,
  row: &'a Row,
}

impl<'a> RowRef<'a> {
  pub fn definition(&self) -> &'a TableDefinition {
    self.definition
  }

  pub fn row(&self) -> &'a Row {
    self.row
  }

  pub fn location(&self) -> Option<&'a SourceLineNumber> {
    self.row.source_location.as_ref()
  }

  pub fn get(&self, column: &str) -> Result<Option<&'a Value>, SchemaError> {
    let index = self.definition.require_column(column)?;
    Ok(self.row.data(index))
  }

  pub fn get_str(&self, column: &str) -> Result<Option<&'a str>, SchemaError> {
    match self.get(column)? {
      None => Ok(None),
      Some(Value::String(s)) | Some(Value::Object(s)) => Ok(Some(s)),
      Some(other) => Err(self.mismatch(column, other)),
    }
  }

  pub fn get_number(&self, column: &str) -> Result<Option<i64>, SchemaError> {
    match self.get(column)? {
      None => Ok(None),
      Some(Value::Number(n)) => Ok(Some(*n)),
      Some(other) => Err(self.mismatch(column, other)),
    }
  }

  pub fn require_str(&self, column: &str) -> Result<&'a str, SchemaError> {
    self.get_str(column)?.ok_or_else(|| self.null(column))
  }

  pub fn require_number(&self, column: &str) -> Result<i64, SchemaError> {
    self.get_number(column)?.ok_or_else(|| self.null(column))
  }

  fn null(&self, column: &str) -> SchemaError {
    SchemaError::NullValue {
      table: self.definition.name.clone(),
      column: column.to_string(),
    }
  }

  fn mismatch(&self, column: &str, value: &Value) -> SchemaError {
    let expected = self
      .definition
      .column_index(column)
      .map(|i| self.definition.columns[i].column_type)
      .unwrap_or(super::ColumnType::String);
    SchemaError::TypeMismatch {
      table: self.definition.name.clone(),
      column: column.to_string(),
      expected,
      actual: value.kind_name(),
    }
  }
}

/// Mutation access to a row. All writes are checked against the definition.
#[derive(Debug)]
pub struct RowMut<'a> {
  definition: &'a TableDefinition,
  row: &'a mut Row,
}

impl RowMut<'_> {
  pub fn row(&self) -> &Row {
    self.row
  }

  pub fn get(&self, column: &str) -> Result<Option<&Value>, SchemaError> {
    let index = self.definition.require_column(column)?;
    Ok(self.row.data(index))
  }

  /// Set the current value of `column`.
  ///
  /// Marks the field modified when the value changes. Primary-key columns are
  /// immutable once the row exists.
  pub fn set(&mut self, column: &str, value: Option<Value>) -> Result<(), SchemaError> {
    let index = self.definition.require_column(column)?;
    self.set_at(index, value)
  }

  pub fn set_at(&mut self, index: usize, value: Option<Value>) -> Result<(), SchemaError> {
    let column = self.column(index)?;
    if column.primary_key {
      return Err(SchemaError::PrimaryKeyImmutable {
        table: self.definition.name.clone(),
        column: column.name.clone(),
      });
    }
    column.validate(&self.definition.name, value.as_ref())?;
    self.field(index)?.assign(value);
    Ok(())
  }

  /// Record the value `column` held in the baseline build.
  pub fn set_previous(&mut self, column: &str, value: Option<Value>) -> Result<(), SchemaError> {
    let index = self.definition.require_column(column)?;
    let column = self.column(index)?;
    column.validate(&self.definition.name, value.as_ref())?;
    self.field(index)?.previous_data = value;
    Ok(())
  }

  pub fn set_operation(&mut self, operation: RowOperation) {
    self.row.operation = operation;
  }

  pub fn set_section(&mut self, section_id: Option<String>) {
    self.row.section_id = section_id;
  }

  pub fn mark_unmodified(&mut self) {
    self.row.mark_unmodified();
  }

  fn column(&self, index: usize) -> Result<&super::ColumnDefinition, SchemaError> {
    self
      .definition
      .columns
      .get(index)
      .ok_or_else(|| SchemaError::ColumnIndexOutOfRange {
        table: self.definition.name.clone(),
        index,
      })
  }

  fn field(&mut self, index: usize) -> Result<&mut Field, SchemaError> {
    let table = &self.definition.name;
    self
      .row
      .field_mut(index)
      .ok_or_else(|| SchemaError::ColumnIndexOutOfRange {
        table: table.clone(),
        index,
      })
  }
}
