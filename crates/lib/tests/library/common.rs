//! Shared fixtures for building linked outputs.

use std::fs;
use std::path::{Path, PathBuf};

use msibind_lib::collab::FileAccessError;
use msibind_lib::table::definitions::{component_table, directory_table, file_table, media_table, property_table};
use msibind_lib::table::{Output, OutputKind, RowOperation, Value};

pub fn never_equal(_: &Path, _: &Path) -> Result<bool, FileAccessError> {
  Ok(false)
}

/// Write `bytes` to `dir/name` and return the path.
pub fn source_file(dir: &Path, name: &str, bytes: usize) -> PathBuf {
  let path = dir.join(name);
  fs::write(&path, vec![b'x'; bytes]).unwrap();
  path
}

/// A product installing into `ProgramFilesFolder\Demo`, with one
/// `ComponentId = "*"` component per file.
pub fn product(files: &[(&str, &Path)]) -> Output {
  let mut output = Output::new(OutputKind::Product);

  let directories = output.ensure_table(&directory_table()).unwrap();
  for (id, parent, default_dir) in [
    ("TARGETDIR", None, "SourceDir"),
    ("ProgramFilesFolder", Some("TARGETDIR"), "."),
    ("INSTALLFOLDER", Some("ProgramFilesFolder"), "Demo"),
  ] {
    let mut row = directories.create_row(vec![Value::string(id)], None).unwrap();
    row.set("Directory_Parent", parent.map(Value::string)).unwrap();
    row.set("DefaultDir", Some(Value::string(default_dir))).unwrap();
  }

  let components = output.ensure_table(&component_table()).unwrap();
  for (id, _) in files {
    let mut row = components.create_row(vec![Value::string(format!("C_{}", id))], None).unwrap();
    row.set("ComponentId", Some(Value::string("*"))).unwrap();
    row.set("Directory_", Some(Value::string("INSTALLFOLDER"))).unwrap();
    row.set("Attributes", Some(Value::Number(0))).unwrap();
    row.set("KeyPath", Some(Value::string(*id))).unwrap();
  }

  let table = output.ensure_table(&file_table()).unwrap();
  for (id, source) in files {
    let mut row = table.create_row(vec![Value::string(*id)], None).unwrap();
    row.set("Component_", Some(Value::string(format!("C_{}", id)))).unwrap();
    row.set("FileName", Some(Value::string(*id))).unwrap();
    row.set("FileSize", Some(Value::Number(0))).unwrap();
    row.set("Source", Some(Value::object(source.to_string_lossy()))).unwrap();
  }

  output
}

pub fn add_media(output: &mut Output, disk_id: i64, cabinet: &str) {
  let media = output.ensure_table(&media_table()).unwrap();
  let mut row = media.create_row(vec![Value::Number(disk_id)], None).unwrap();
  row.set("LastSequence", Some(Value::Number(0))).unwrap();
  row.set("Cabinet", Some(Value::string(cabinet))).unwrap();
}

/// Mark every file compressed through the package word count.
pub fn compress_by_default(output: &mut Output) {
  output.set_summary_value(15, Value::string("2")).unwrap();
}

/// Add a `Property` row to a transform, changed from `before` to `after`.
pub fn modified_property(transform: &mut Output, name: &str, before: &str, after: &str) {
  let table = transform.ensure_table(&property_table()).unwrap();
  let mut row = table.create_row(vec![Value::string(name)], None).unwrap();
  row.set("Value", Some(Value::string(before))).unwrap();
  row.mark_unmodified();
  row.set_operation(RowOperation::Modify);
  row.set("Value", Some(Value::string(after))).unwrap();
}
