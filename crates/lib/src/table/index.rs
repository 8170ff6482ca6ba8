//! Row identity and lookup maps.
//!
//! Tables keep their own primary-key map. [`RowIndex`] covers every other
//! lookup (e.g. files by component): it is built once per pass from a table
//! and passed by reference to whatever needs it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{SchemaError, Table, Value};

/// Tuple of column values identifying a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey(pub Vec<Value>);

impl RowKey {
  pub fn single(value: impl Into<Value>) -> Self {
    RowKey(vec![value.into()])
  }
}

impl fmt::Display for RowKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, value) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("/")?;
      }
      write!(f, "{}", value)?;
    }
    Ok(())
  }
}

/// Multi-map from the values of some columns to row positions.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
  map: HashMap<RowKey, Vec<usize>>,
}

impl RowIndex {
  /// Index `table` by `columns`. Rows with a null in any indexed column are skipped.
  pub fn build(table: &Table, columns: &[&str]) -> Result<Self, SchemaError> {
    let definition = table.definition();
    let indices = columns
      .iter()
      .map(|c| definition.require_column(c))
      .collect::<Result<Vec<_>, _>>()?;

    let mut map: HashMap<RowKey, Vec<usize>> = HashMap::new();
    for (position, row) in table.rows().iter().enumerate() {
      let values: Option<Vec<Value>> = indices.iter().map(|&i| row.data(i).cloned()).collect();
      if let Some(values) = values {
        map.entry(RowKey(values)).or_default().push(position);
      }
    }

    Ok(Self { map })
  }

  pub fn get(&self, key: &RowKey) -> &[usize] {
    self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}
