//! Row and field level snapshot synthesis.

use std::path::Path;

use tracing::{debug, info};

use crate::collab::FileComparator;
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::table::definitions::{PROPERTY, SUMMARY_INFORMATION};
use crate::table::{
  ColumnDefinition, ColumnType, Field, Output, OutputKind, Row, RowOperation, SchemaError, Table, TableOperation,
  Value,
};

use super::summary::decompose;
use super::{TransformError, TransformPair};

/// Property rows carried into both snapshots even when unchanged.
const IDENTITY_PROPERTIES: &[&str] = &["ProductCode", "ProductLanguage", "ProductVersion", "UpgradeCode"];

pub struct TransformDiffEngine<'a> {
  comparator: &'a dyn FileComparator,
  empty_file: String,
  carry_identity_rows: bool,
}

impl<'a> TransformDiffEngine<'a> {
  /// `empty_file` is the shared zero-length file written into the target
  /// snapshot wherever binary content has to differ.
  pub fn new(comparator: &'a dyn FileComparator, empty_file: &Path) -> Self {
    Self {
      comparator,
      empty_file: empty_file.to_string_lossy().into_owned(),
      carry_identity_rows: true,
    }
  }

  pub fn carry_identity_rows(mut self, carry: bool) -> Self {
    self.carry_identity_rows = carry;
    self
  }

  /// Split a transform document into its target and updated snapshots.
  pub fn diff(&self, transform: &Output, diagnostics: &mut Diagnostics) -> Result<TransformPair, TransformError> {
    if transform.kind != OutputKind::Transform {
      return Err(TransformError::WrongKind {
        expected: OutputKind::Transform,
        actual: transform.kind,
      });
    }

    let mut target = Output::new(OutputKind::Product);
    let mut updated = Output::new(OutputKind::Product);
    let mut emitted = 0usize;

    for table in transform.tables() {
      if table.name() == SUMMARY_INFORMATION {
        continue;
      }
      emitted += self.diff_table(table, &mut target, &mut updated, diagnostics)?;
    }

    let validation_flags = match transform.table(SUMMARY_INFORMATION) {
      Some(summary) => decompose(summary, &mut target, &mut updated, diagnostics)?,
      None => None,
    };

    if target.same_content(&updated) {
      return Err(TransformError::NoDifferences);
    }

    info!(
      tables = transform.tables().count(),
      rows = emitted,
      "synthesized transform snapshots"
    );
    Ok(TransformPair {
      target,
      updated,
      validation_flags,
    })
  }

  /// Diff every transform stored inside a patch, keyed by sub-storage name.
  pub fn diff_patch(
    &self,
    patch: &Output,
    diagnostics: &mut Diagnostics,
  ) -> Result<Vec<(String, TransformPair)>, TransformError> {
    if patch.kind != OutputKind::Patch {
      return Err(TransformError::WrongKind {
        expected: OutputKind::Patch,
        actual: patch.kind,
      });
    }

    let mut pairs = Vec::new();
    for storage in &patch.sub_storages {
      if storage.data.kind != OutputKind::Transform {
        continue;
      }
      let pair = self.diff(&storage.data, diagnostics).map_err(|e| TransformError::SubStorage {
        name: storage.name.clone(),
        source: Box::new(e),
      })?;
      pairs.push((storage.name.clone(), pair));
    }
    Ok(pairs)
  }

  /// Returns the number of rows written to the snapshots.
  fn diff_table(
    &self,
    table: &Table,
    target: &mut Output,
    updated: &mut Output,
    diagnostics: &mut Diagnostics,
  ) -> Result<usize, TransformError> {
    let definition = table.definition();
    match table.operation() {
      TableOperation::Add => {
        let updated_table = updated.ensure_table(definition)?;
        for row in table.rows() {
          updated_table.add_row(row.snapshot())?;
        }
        return Ok(table.len());
      }
      TableOperation::Drop => {
        target.ensure_table(definition)?;
        return Ok(0);
      }
      TableOperation::None => {
        target.ensure_table(definition)?;
        updated.ensure_table(definition)?;
      }
    }

    let mut emitted = 0;
    for row in table.rows() {
      match row.operation {
        RowOperation::Add => {
          table_of(updated, definition.name.as_str())?.add_row(row.snapshot())?;
          emitted += 1;
        }
        RowOperation::Delete => {
          let target_row = self.deleted_row(definition.columns.as_slice(), row);
          table_of(target, definition.name.as_str())?.add_row(target_row)?;
          emitted += 1;
        }
        RowOperation::Modify | RowOperation::None => {
          let (target_row, forced) = self.changed_row(table, row, diagnostics);
          if forced || self.is_identity_row(table, row) {
            table_of(target, definition.name.as_str())?.add_row(target_row)?;
            table_of(updated, definition.name.as_str())?.add_row(row.snapshot())?;
            emitted += 1;
          }
        }
      }
    }

    debug!(table = %definition.name, rows = emitted, "diffed table");
    Ok(emitted)
  }

  /// Target-side row for a deleted row: key fields kept, everything else a
  /// sentinel.
  fn deleted_row(&self, columns: &[ColumnDefinition], row: &Row) -> Row {
    let fields = columns
      .iter()
      .zip(row.fields())
      .map(|(column, field)| {
        if column.primary_key {
          return Field::new(field.data.clone());
        }
        let sentinel = match column.column_type {
          ColumnType::Number => Value::Number(column.min_value.unwrap_or(0)),
          ColumnType::BinaryObject => Value::object(self.empty_file.clone()),
          _ => Value::string("0"),
        };
        Field::new(Some(sentinel))
      })
      .collect();
    finish_row(fields, row)
  }

  /// Target-side row for a modified or untouched row, and whether any field
  /// forced the row into the snapshots.
  fn changed_row(&self, table: &Table, row: &Row, diagnostics: &mut Diagnostics) -> (Row, bool) {
    let mut forced = false;
    let mut fields = Vec::with_capacity(row.len());

    for (column, field) in table.definition().columns.iter().zip(row.fields()) {
      let data = if column.primary_key {
        field.data.clone()
      } else if field.modified {
        forced = true;
        Some(self.differing_value(column.column_type, field.data.as_ref()))
      } else if column.column_type == ColumnType::BinaryObject {
        match (&field.data, &field.previous_data) {
          (Some(Value::Object(current)), Some(previous @ Value::Object(previous_path))) => {
            match self.comparator.files_equal(Path::new(current), Path::new(previous_path)) {
              Ok(true) => field.data.clone(),
              Ok(false) => {
                forced = true;
                Some(previous.clone())
              }
              Err(e) => {
                diagnostics.error(
                  DiagnosticCode::FileAccess,
                  row.source_location.as_ref(),
                  format!(
                    "table '{}' column '{}': cannot compare '{}' with '{}': {}",
                    table.name(),
                    column.name,
                    current,
                    previous_path,
                    e
                  ),
                );
                field.data.clone()
              }
            }
          }
          (Some(_), None) => {
            forced = true;
            Some(Value::object(self.empty_file.clone()))
          }
          _ => field.data.clone(),
        }
      } else {
        field.data.clone()
      };
      fields.push(Field::new(data));
    }

    (finish_row(fields, row), forced)
  }

  /// A value guaranteed to differ from `updated` in a column of `column_type`.
  fn differing_value(&self, column_type: ColumnType, updated: Option<&Value>) -> Value {
    match column_type {
      ColumnType::Number => match updated {
        Some(Value::Number(1)) => Value::Number(2),
        _ => Value::Number(1),
      },
      ColumnType::BinaryObject => Value::object(self.empty_file.clone()),
      _ => match updated {
        Some(Value::String(s)) if s == "0" => Value::string("1"),
        _ => Value::string("0"),
      },
    }
  }

  fn is_identity_row(&self, table: &Table, row: &Row) -> bool {
    self.carry_identity_rows
      && table.name() == PROPERTY
      && matches!(row.data(0), Some(Value::String(name)) if IDENTITY_PROPERTIES.contains(&name.as_str()))
  }
}

fn finish_row(fields: Vec<Field>, source: &Row) -> Row {
  let mut row = Row::from_fields(fields);
  row.source_location = source.source_location.clone();
  row.section_id = source.section_id.clone();
  row
}

fn table_of<'o>(output: &'o mut Output, name: &str) -> Result<&'o mut Table, SchemaError> {
  output
    .table_mut(name)
    .ok_or_else(|| SchemaError::MissingTable(name.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collab::FileAccessError;
  use crate::table::definitions::{binary_table, property_table, summary_information_table};
  use crate::table::{RowKey, TableDefinition};

  fn never_equal(_: &Path, _: &Path) -> Result<bool, FileAccessError> {
    Ok(false)
  }

  fn always_equal(_: &Path, _: &Path) -> Result<bool, FileAccessError> {
    Ok(true)
  }

  fn failing(a: &Path, _: &Path) -> Result<bool, FileAccessError> {
    Err(FileAccessError::NotFound(a.to_path_buf()))
  }

  fn engine(comparator: &dyn FileComparator) -> TransformDiffEngine<'_> {
    TransformDiffEngine::new(comparator, Path::new("empty"))
  }

  fn counter_table() -> TableDefinition {
    TableDefinition::new(
      "Counter",
      vec![
        ColumnDefinition::new("Id", ColumnType::String).key(),
        ColumnDefinition::new("Count", ColumnType::Number).nullable().range(-5, 100),
        ColumnDefinition::new("Label", ColumnType::String).nullable(),
      ],
    )
  }

  fn transform() -> Output {
    Output::new(OutputKind::Transform)
  }

  fn add_counter(output: &mut Output, id: &str, count: i64, label: &str, operation: RowOperation) {
    let table = output.ensure_table(&counter_table()).unwrap();
    let mut row = table.create_row(vec![Value::string(id)], None).unwrap();
    row.set("Count", Some(Value::Number(count))).unwrap();
    row.set("Label", Some(Value::string(label))).unwrap();
    row.mark_unmodified();
    row.set_operation(operation);
  }

  fn field(output: &Output, table: &str, key: &str, column: &str) -> Option<Value> {
    output
      .table(table)
      .unwrap()
      .find(&RowKey::single(key))
      .unwrap()
      .get(column)
      .unwrap()
      .cloned()
  }

  #[test]
  fn unmodified_output_has_no_differences() {
    let mut output = transform();
    add_counter(&mut output, "a", 1, "x", RowOperation::None);
    let result = engine(&never_equal).diff(&output, &mut Diagnostics::new());
    assert!(matches!(result, Err(TransformError::NoDifferences)));
  }

  #[test]
  fn modified_fields_differ_between_snapshots() {
    let mut output = transform();
    add_counter(&mut output, "one", 5, "z", RowOperation::Modify);
    add_counter(&mut output, "other", 7, "x", RowOperation::Modify);
    add_counter(&mut output, "quiet", 3, "q", RowOperation::None);
    add_counter(&mut output, "reverted", 4, "r", RowOperation::Modify);
    {
      let table = output.table_mut("Counter").unwrap();
      let mut one = table.find_mut(&RowKey::single("one")).unwrap();
      one.set("Count", Some(Value::Number(1))).unwrap();
      one.set("Label", Some(Value::string("0"))).unwrap();
      let mut other = table.find_mut(&RowKey::single("other")).unwrap();
      other.set("Label", Some(Value::string("y"))).unwrap();
      let mut reverted = table.find_mut(&RowKey::single("reverted")).unwrap();
      reverted.set("Count", Some(Value::Number(9))).unwrap();
      reverted.set("Count", Some(Value::Number(4))).unwrap();
    }

    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();

    assert_eq!(field(&pair.target, "Counter", "one", "Count"), Some(Value::Number(2)));
    assert_eq!(field(&pair.updated, "Counter", "one", "Count"), Some(Value::Number(1)));
    assert_eq!(field(&pair.target, "Counter", "one", "Label"), Some(Value::string("1")));
    assert_eq!(field(&pair.updated, "Counter", "one", "Label"), Some(Value::string("0")));

    assert_eq!(field(&pair.target, "Counter", "other", "Count"), Some(Value::Number(7)));
    assert_eq!(field(&pair.target, "Counter", "other", "Label"), Some(Value::string("0")));
    assert_eq!(field(&pair.updated, "Counter", "other", "Label"), Some(Value::string("y")));

    let target = pair.target.table("Counter").unwrap();
    assert!(target.find(&RowKey::single("quiet")).is_none());
    assert!(target.find(&RowKey::single("reverted")).is_none());
    assert_eq!(target.len(), 2);
  }

  #[test]
  fn deleted_rows_get_sentinels_in_target_only() {
    let mut output = transform();
    add_counter(&mut output, "gone", 9, "bye", RowOperation::Delete);
    add_counter(&mut output, "new", 1, "hi", RowOperation::Add);

    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();

    assert_eq!(field(&pair.target, "Counter", "gone", "Count"), Some(Value::Number(-5)));
    assert_eq!(field(&pair.target, "Counter", "gone", "Label"), Some(Value::string("0")));
    assert!(pair.updated.table("Counter").unwrap().find(&RowKey::single("gone")).is_none());

    assert!(pair.target.table("Counter").unwrap().find(&RowKey::single("new")).is_none());
    assert_eq!(field(&pair.updated, "Counter", "new", "Label"), Some(Value::string("hi")));
  }

  #[test]
  fn table_operations_pick_a_side() {
    let mut output = transform();
    add_counter(&mut output, "a", 1, "x", RowOperation::Add);
    output.table_mut("Counter").unwrap().set_operation(TableOperation::Add);
    output
      .ensure_table(&binary_table())
      .unwrap()
      .set_operation(TableOperation::Drop);

    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();
    assert!(pair.target.table("Counter").is_none());
    assert_eq!(pair.updated.table("Counter").unwrap().len(), 1);
    assert!(pair.target.table("Binary").is_some());
    assert!(pair.updated.table("Binary").is_none());
  }

  fn binary_output(data: Option<&str>, previous: Option<&str>) -> Output {
    let mut output = transform();
    let table = output.ensure_table(&binary_table()).unwrap();
    let mut row = table.create_row(vec![Value::string("Icon")], None).unwrap();
    row.set("Data", data.map(Value::object)).unwrap();
    row.set_previous("Data", previous.map(Value::object)).unwrap();
    row.mark_unmodified();
    output
  }

  #[test]
  fn changed_binary_content_restores_previous_data() {
    let output = binary_output(Some("new.ico"), Some("old.ico"));
    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();
    assert_eq!(field(&pair.target, "Binary", "Icon", "Data"), Some(Value::object("old.ico")));
    assert_eq!(field(&pair.updated, "Binary", "Icon", "Data"), Some(Value::object("new.ico")));
  }

  #[test]
  fn identical_binary_content_is_not_emitted() {
    let output = binary_output(Some("new.ico"), Some("old.ico"));
    let result = engine(&always_equal).diff(&output, &mut Diagnostics::new());
    assert!(matches!(result, Err(TransformError::NoDifferences)));
  }

  #[test]
  fn binary_without_history_uses_the_empty_file() {
    let output = binary_output(Some("new.ico"), None);
    let pair = engine(&always_equal).diff(&output, &mut Diagnostics::new()).unwrap();
    assert_eq!(field(&pair.target, "Binary", "Icon", "Data"), Some(Value::object("empty")));
  }

  #[test]
  fn comparator_failure_is_a_row_error() {
    let mut output = binary_output(Some("new.ico"), Some("old.ico"));
    add_counter(&mut output, "a", 1, "x", RowOperation::Add);

    let mut diagnostics = Diagnostics::new();
    let pair = engine(&failing).diff(&output, &mut diagnostics).unwrap();
    assert_eq!(diagnostics.count_of(DiagnosticCode::FileAccess), 1);
    assert!(pair.target.table("Binary").unwrap().is_empty());
  }

  #[test]
  fn identity_properties_are_always_carried() {
    let mut output = transform();
    let table = output.ensure_table(&property_table()).unwrap();
    for (name, value) in [("ProductCode", "{A}"), ("Manufacturer", "Acme")] {
      let mut row = table.create_row(vec![Value::string(name)], None).unwrap();
      row.set("Value", Some(Value::string(value))).unwrap();
      row.mark_unmodified();
    }
    add_counter(&mut output, "a", 1, "x", RowOperation::Add);

    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();
    let target = pair.target.table("Property").unwrap();
    assert!(target.find(&RowKey::single("ProductCode")).is_some());
    assert!(target.find(&RowKey::single("Manufacturer")).is_none());

    let pair = engine(&never_equal)
      .carry_identity_rows(false)
      .diff(&output, &mut Diagnostics::new())
      .unwrap();
    assert!(pair.target.table("Property").unwrap().is_empty());
  }

  #[test]
  fn summary_information_is_decomposed() {
    let mut output = transform();
    let table = output.ensure_table(&summary_information_table()).unwrap();
    let revision = "{11111111-1111-1111-1111-111111111111}1.0;{22222222-2222-2222-2222-222222222222}1.1;{33333333-3333-3333-3333-333333333333}";
    for (pid, value) in [(1, "1252"), (7, "x64;1033"), (8, "x64;1031"), (9, revision), (16, "31"), (2, "Title")] {
      table
        .create_row(vec![Value::Number(pid)], None)
        .unwrap()
        .set("Value", Some(Value::string(value)))
        .unwrap();
    }

    let pair = engine(&never_equal).diff(&output, &mut Diagnostics::new()).unwrap();

    assert_eq!(pair.validation_flags, Some(31));
    assert_eq!(pair.target.summary_value(1), Some(&Value::string("1252")));
    assert_eq!(pair.updated.summary_value(1), Some(&Value::string("1252")));
    assert_eq!(pair.target.summary_value(7), Some(&Value::string("x64;1033")));
    assert_eq!(pair.updated.summary_value(7), Some(&Value::string("x64;1031")));
    assert_eq!(pair.updated.summary_value(8), None);
    assert_eq!(pair.target.summary_value(2), Some(&Value::string("Title")));
    assert_eq!(
      field(&pair.target, "Property", "ProductVersion", "Value"),
      Some(Value::string("1.0"))
    );
    assert_eq!(
      field(&pair.updated, "Property", "ProductCode", "Value"),
      Some(Value::string("{22222222-2222-2222-2222-222222222222}"))
    );
    assert_eq!(
      field(&pair.updated, "Property", "UpgradeCode", "Value"),
      Some(Value::string("{33333333-3333-3333-3333-333333333333}"))
    );
  }

  #[test]
  fn wrong_document_kinds_are_rejected() {
    let product = Output::new(OutputKind::Product);
    let engine = engine(&never_equal);
    assert!(matches!(
      engine.diff(&product, &mut Diagnostics::new()),
      Err(TransformError::WrongKind { .. })
    ));
    assert!(matches!(
      engine.diff_patch(&product, &mut Diagnostics::new()),
      Err(TransformError::WrongKind { .. })
    ));
  }

  #[test]
  fn patches_diff_each_transform() {
    let mut first = transform();
    add_counter(&mut first, "a", 1, "x", RowOperation::Add);
    let mut patch = Output::new(OutputKind::Patch);
    patch.sub_storages.push(crate::table::SubStorage {
      name: "RTM.1".to_string(),
      data: first,
    });

    let pairs = engine(&never_equal).diff_patch(&patch, &mut Diagnostics::new()).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, "RTM.1");
  }
}
