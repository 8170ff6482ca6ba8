//! Column, value and table definition types.
//!
//! A [`TableDefinition`] is the schema every [`Row`](super::Row) of a table is
//! checked against. Values never cross semantic types: a `Number` column only
//! ever holds [`Value::Number`], string-like columns only [`Value::String`] and
//! binary-object columns only [`Value::Object`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RowKey;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
  Number,
  String,
  LocalizedString,
  PreservedString,
  /// A path to binary content, compared byte-by-byte when diffing.
  BinaryObject,
}

impl ColumnType {
  pub fn is_string(self) -> bool {
    matches!(
      self,
      ColumnType::String | ColumnType::LocalizedString | ColumnType::PreservedString
    )
  }

  /// Whether `value` has the representation this column stores.
  pub fn accepts(self, value: &Value) -> bool {
    match value {
      Value::Number(_) => self == ColumnType::Number,
      Value::String(_) => self.is_string(),
      Value::Object(_) => self == ColumnType::BinaryObject,
    }
  }
}

impl fmt::Display for ColumnType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ColumnType::Number => "number",
      ColumnType::String => "string",
      ColumnType::LocalizedString => "localized string",
      ColumnType::PreservedString => "preserved string",
      ColumnType::BinaryObject => "binary object",
    };
    f.write_str(name)
  }
}

/// A non-null field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
  Number(i64),
  String(String),
  /// Path to the file holding the object's bytes.
  Object(String),
}

impl Value {
  pub fn string(value: impl Into<String>) -> Self {
    Value::String(value.into())
  }

  pub fn object(path: impl Into<String>) -> Self {
    Value::Object(path.into())
  }

  pub fn as_number(&self) -> Option<i64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  /// The textual payload of a string or object value.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) | Value::Object(s) => Some(s),
      Value::Number(_) => None,
    }
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Object(_) => "binary object",
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => write!(f, "{}", n),
      Value::String(s) | Value::Object(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Number(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.to_string())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::String(value)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
  pub name: String,
  #[serde(rename = "type")]
  pub column_type: ColumnType,
  #[serde(default)]
  pub nullable: bool,
  #[serde(default)]
  pub primary_key: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_value: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_value: Option<i64>,
  #[serde(default)]
  pub localizable: bool,
  /// Binder-only column that a persistence engine must not write.
  #[serde(default)]
  pub unreal: bool,
}

impl ColumnDefinition {
  pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
    Self {
      name: name.into(),
      column_type,
      nullable: false,
      primary_key: false,
      min_value: None,
      max_value: None,
      localizable: false,
      unreal: false,
    }
  }

  pub fn key(mut self) -> Self {
    self.primary_key = true;
    self
  }

  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  pub fn range(mut self, min: i64, max: i64) -> Self {
    self.min_value = Some(min);
    self.max_value = Some(max);
    self
  }

  pub fn localizable(mut self) -> Self {
    self.localizable = true;
    self
  }

  pub fn unreal(mut self) -> Self {
    self.unreal = true;
    self
  }

  /// Check that `value` may be stored in this column of `table`.
  pub fn validate(&self, table: &str, value: Option<&Value>) -> Result<(), SchemaError> {
    let Some(value) = value else {
      if self.nullable {
        return Ok(());
      }
      return Err(SchemaError::NullValue {
        table: table.to_string(),
        column: self.name.clone(),
      });
    };

    self.check_kind(table, value)?;

    if let Value::Number(n) = value {
      let below = self.min_value.is_some_and(|min| *n < min);
      let above = self.max_value.is_some_and(|max| *n > max);
      if below || above {
        return Err(SchemaError::OutOfRange {
          table: table.to_string(),
          column: self.name.clone(),
          value: *n,
        });
      }
    }

    Ok(())
  }

  /// Check only that `value` has this column's semantic type.
  ///
  /// Bounds are not checked here: transform snapshots carry sentinel values
  /// outside a column's authored range.
  pub fn check_kind(&self, table: &str, value: &Value) -> Result<(), SchemaError> {
    if self.column_type.accepts(value) {
      return Ok(());
    }
    Err(SchemaError::TypeMismatch {
      table: table.to_string(),
      column: self.name.clone(),
      expected: self.column_type,
      actual: value.kind_name(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
  pub name: String,
  pub columns: Vec<ColumnDefinition>,
  /// Virtual table used by the binder only; never persisted directly.
  #[serde(default)]
  pub unreal: bool,
}

impl TableDefinition {
  pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
    Self {
      name: name.into(),
      columns,
      unreal: false,
    }
  }

  pub fn unreal(mut self) -> Self {
    self.unreal = true;
    self
  }

  pub fn len(&self) -> usize {
    self.columns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }

  /// Index of `name`, or [`SchemaError::UnknownColumn`].
  pub fn require_column(&self, name: &str) -> Result<usize, SchemaError> {
    self.column_index(name).ok_or_else(|| SchemaError::UnknownColumn {
      table: self.name.clone(),
      column: name.to_string(),
    })
  }

  pub fn primary_key_indices(&self) -> Vec<usize> {
    self
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| c.primary_key)
      .map(|(i, _)| i)
      .collect()
  }
}

/// Structural violations of the table model. Always a build defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
  #[error("table '{table}': row has {actual} fields but the definition has {expected} columns")]
  FieldCountMismatch {
    table: String,
    expected: usize,
    actual: usize,
  },

  #[error("table '{table}' has no column '{column}'")]
  UnknownColumn { table: String, column: String },

  #[error("table '{table}': column index {index} is out of range")]
  ColumnIndexOutOfRange { table: String, index: usize },

  #[error("table '{table}': column '{column}' holds {expected} values, not {actual}")]
  TypeMismatch {
    table: String,
    column: String,
    expected: ColumnType,
    actual: &'static str,
  },

  #[error("table '{table}': column '{column}' is not nullable")]
  NullValue { table: String, column: String },

  #[error("table '{table}': value {value} is out of range for column '{column}'")]
  OutOfRange { table: String, column: String, value: i64 },

  #[error("table '{table}': primary key column '{column}' cannot change after the row is created")]
  PrimaryKeyImmutable { table: String, column: String },

  #[error("table '{table}': a row with key '{key}' already exists")]
  DuplicateKey { table: String, key: RowKey },

  #[error("table '{table}': expected {expected} primary key values, got {actual}")]
  KeyArity {
    table: String,
    expected: usize,
    actual: usize,
  },

  #[error("table '{table}' already exists with a different definition")]
  DefinitionMismatch { table: String },

  #[error("table '{0}' does not exist")]
  MissingTable(String),

  #[error("table '{table}': row {index} does not exist")]
  MissingRow { table: String, index: usize },
}
