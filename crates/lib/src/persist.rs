//! JSON persistence of bind documents.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crashed write never leaves a truncated document behind.
//!
//! ```text
//! {dir}/
//! ├── target.json     # TransformPair::target
//! └── updated.json    # TransformPair::updated
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::consts::EMPTY_FILE_NAME;
use crate::table::Output;
use crate::transform::TransformPair;

pub const TARGET_FILENAME: &str = "target.json";
pub const UPDATED_FILENAME: &str = "updated.json";

#[derive(Debug, Error)]
pub enum PersistError {
  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize document: {0}")]
  Serialize(#[source] serde_json::Error),
}

fn ensure_parent(path: &Path) -> Result<(), PersistError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}

/// Serialize `value` as pretty JSON to `path`, atomically.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
  ensure_parent(path)?;

  let content = serde_json::to_string_pretty(value).map_err(PersistError::Serialize)?;
  let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  let write_err = |source| PersistError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, &content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;

  debug!(path = %path.display(), bytes = content.len(), "saved document");
  Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
  let content = fs::read_to_string(path).map_err(|source| PersistError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&content).map_err(|source| PersistError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

pub fn save_output(path: &Path, output: &Output) -> Result<(), PersistError> {
  save_json(path, output)
}

pub fn load_output(path: &Path) -> Result<Output, PersistError> {
  load_json(path)
}

/// Write both snapshots of `pair` into `dir`. Returns the two paths.
pub fn save_transform_pair(dir: &Path, pair: &TransformPair) -> Result<(PathBuf, PathBuf), PersistError> {
  let target = dir.join(TARGET_FILENAME);
  let updated = dir.join(UPDATED_FILENAME);
  save_output(&target, &pair.target)?;
  save_output(&updated, &pair.updated)?;
  Ok((target, updated))
}

/// Create (if needed) the zero-length file transforms use as a stand-in for
/// binary content, and return its path.
pub fn ensure_empty_placeholder(dir: &Path) -> Result<PathBuf, PersistError> {
  fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
    path: dir.to_path_buf(),
    source,
  })?;
  let path = dir.join(EMPTY_FILE_NAME);
  match fs::metadata(&path) {
    Ok(metadata) if metadata.is_file() && metadata.len() == 0 => return Ok(path),
    Ok(_) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(source) => return Err(PersistError::Read { path, source }),
  }
  fs::write(&path, b"").map_err(|source| PersistError::Write {
    path: path.clone(),
    source,
  })?;
  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  use crate::table::definitions::property_table;
  use crate::table::{OutputKind, Value};

  fn sample() -> Output {
    let mut output = Output::new(OutputKind::Product);
    let table = output.ensure_table(&property_table()).unwrap();
    table
      .create_row(vec![Value::string("ProductName")], None)
      .unwrap()
      .set("Value", Some(Value::string("Demo")))
      .unwrap();
    output
  }

  #[test]
  fn output_round_trips() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/out.json");

    save_output(&path, &sample()).unwrap();
    let loaded = load_output(&path).unwrap();
    assert!(loaded.same_content(&sample()));
    assert!(!temp.path().join("nested/out.json.tmp").exists());
  }

  #[test]
  fn load_reports_missing_and_malformed_files() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      load_output(&temp.path().join("missing.json")),
      Err(PersistError::Read { .. })
    ));

    let bad = temp.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(load_output(&bad), Err(PersistError::Parse { .. })));
  }

  #[test]
  fn transform_pair_writes_both_snapshots() {
    let temp = TempDir::new().unwrap();
    let pair = TransformPair {
      target: sample(),
      updated: Output::new(OutputKind::Product),
      validation_flags: None,
    };
    let (target, updated) = save_transform_pair(temp.path(), &pair).unwrap();
    assert_eq!(target, temp.path().join(TARGET_FILENAME));
    assert!(updated.exists());
    assert!(load_output(&target).unwrap().same_content(&pair.target));
  }

  #[test]
  fn empty_placeholder_is_zero_length() {
    let temp = TempDir::new().unwrap();
    let path = ensure_empty_placeholder(&temp.path().join("obj")).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    fs::write(&path, b"junk").unwrap();
    let again = ensure_empty_placeholder(&temp.path().join("obj")).unwrap();
    assert_eq!(again, path);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
  }
}
