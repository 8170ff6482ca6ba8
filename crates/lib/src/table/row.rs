//! Rows and fields with change tracking.

use serde::{Deserialize, Serialize};

use crate::diagnostics::SourceLineNumber;

use super::Value;

/// What a row represents when it is part of a transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowOperation {
  #[default]
  None,
  Add,
  Delete,
  Modify,
}

/// A single value slot of a row.
///
/// `previous_data` is only populated when the row is compared against a prior
/// build (patches). `modified` is true while `data` differs from the value the
/// field held when it was created or last marked unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_data: Option<Value>,
  #[serde(default)]
  pub modified: bool,
  /// Baseline value, only meaningful while `modified` is set.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  baseline: Option<Value>,
}

impl Field {
  pub fn new(data: Option<Value>) -> Self {
    Self {
      data,
      previous_data: None,
      modified: false,
      baseline: None,
    }
  }

  /// Store `value` and recompute `modified` against the baseline.
  pub(crate) fn assign(&mut self, value: Option<Value>) {
    if self.data == value {
      return;
    }
    let baseline = if self.modified {
      self.baseline.take()
    } else {
      self.data.take()
    };
    self.data = value;
    self.modified = self.data != baseline;
    self.baseline = if self.modified { baseline } else { None };
  }

  /// Make the current data the new baseline.
  pub(crate) fn mark_unmodified(&mut self) {
    self.modified = false;
    self.baseline = None;
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
  fields: Vec<Field>,
  #[serde(default)]
  pub operation: RowOperation,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_location: Option<SourceLineNumber>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub section_id: Option<String>,
}

impl Row {
  /// A row of `column_count` null fields.
  pub fn new(column_count: usize) -> Self {
    Self {
      fields: vec![Field::default(); column_count],
      operation: RowOperation::None,
      source_location: None,
      section_id: None,
    }
  }

  pub(crate) fn from_fields(fields: Vec<Field>) -> Self {
    Self {
      fields,
      operation: RowOperation::None,
      source_location: None,
      section_id: None,
    }
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn fields(&self) -> &[Field] {
    &self.fields
  }

  pub fn field(&self, index: usize) -> Option<&Field> {
    self.fields.get(index)
  }

  pub(crate) fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
    self.fields.get_mut(index)
  }

  pub fn data(&self, index: usize) -> Option<&Value> {
    self.fields.get(index).and_then(|f| f.data.as_ref())
  }

  /// Whether any field has been modified.
  pub fn is_modified(&self) -> bool {
    self.fields.iter().any(|f| f.modified)
  }

  pub fn mark_unmodified(&mut self) {
    for field in &mut self.fields {
      field.mark_unmodified();
    }
  }

  /// Field-by-field equality of current data, ignoring change tracking.
  pub fn same_data(&self, other: &Row) -> bool {
    self.fields.len() == other.fields.len() && self.fields.iter().zip(&other.fields).all(|(a, b)| a.data == b.data)
  }

  /// Copy of this row as a persisted snapshot row: current data only.
  pub(crate) fn snapshot(&self) -> Row {
    Row {
      fields: self.fields.iter().map(|f| Field::new(f.data.clone())).collect(),
      operation: RowOperation::None,
      source_location: self.source_location.clone(),
      section_id: self.section_id.clone(),
    }
  }
}
