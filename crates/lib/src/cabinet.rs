//! Hand-off of finished cabinet groups to a cabinet builder.
//!
//! Compression itself happens outside this crate. The binder turns a
//! [`MediaAssignment`] into immutable [`CabinetWorkItem`]s and runs a
//! [`CabinetBuilder`] over them on a bounded thread pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::media::MediaAssignment;
use crate::table::definitions::FILE;
use crate::table::views::FileRow;
use crate::table::{Output, SchemaError};

/// One file to store in a cabinet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinetFile {
  pub source_path: PathBuf,
  /// Name of the file inside the cabinet (the `File` table key).
  pub embedded_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinetWorkItem {
  pub cabinet: String,
  pub disk_id: i64,
  pub compression_level: Option<String>,
  pub files: Vec<CabinetFile>,
}

#[derive(Debug, Error)]
pub enum CabinetError {
  #[error("file '{file}' has no source path")]
  MissingSource { file: String },

  #[error("failed to build cabinet '{cabinet}': {message}")]
  Build { cabinet: String, message: String },

  #[error("failed to start cabinet workers: {0}")]
  ThreadPool(String),

  #[error(transparent)]
  Schema(#[from] SchemaError),
}

/// Builds one cabinet file from a work item.
pub trait CabinetBuilder: Send + Sync {
  fn build(&self, item: &CabinetWorkItem, destination: &Path) -> Result<PathBuf, CabinetError>;
}

/// Result of one work item, in input order.
#[derive(Debug)]
pub struct CabinetOutcome {
  pub cabinet: String,
  pub result: Result<PathBuf, CabinetError>,
}

impl CabinetOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }
}

/// Work items for every cabinet in `assignment`, with source paths from the
/// `File` table.
pub fn work_items(output: &Output, assignment: &MediaAssignment) -> Result<Vec<CabinetWorkItem>, CabinetError> {
  let mut sources: HashMap<String, Option<String>> = HashMap::new();
  if let Some(table) = output.table(FILE) {
    for row in table.iter() {
      let file = FileRow::from_row(row)?;
      sources.insert(file.file_id, file.source_path);
    }
  }

  let mut items = Vec::with_capacity(assignment.cabinets.len());
  for group in &assignment.cabinets {
    let mut files = Vec::with_capacity(group.files.len());
    for file_id in &group.files {
      let Some(Some(source)) = sources.get(file_id) else {
        return Err(CabinetError::MissingSource { file: file_id.clone() });
      };
      files.push(CabinetFile {
        source_path: PathBuf::from(source),
        embedded_id: file_id.clone(),
      });
    }
    items.push(CabinetWorkItem {
      cabinet: group.cabinet.clone(),
      disk_id: group.disk_id,
      compression_level: group.compression_level.clone(),
      files,
    });
  }
  Ok(items)
}

/// Build every item on a pool of `threads` workers.
pub fn build_cabinets(
  builder: &dyn CabinetBuilder,
  items: &[CabinetWorkItem],
  destination: &Path,
  threads: usize,
) -> Result<Vec<CabinetOutcome>, CabinetError> {
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(threads.max(1))
    .thread_name(|i| format!("cabinet-{}", i))
    .build()
    .map_err(|e| CabinetError::ThreadPool(e.to_string()))?;

  info!(cabinets = items.len(), threads = threads.max(1), "building cabinets");

  let outcomes: Vec<CabinetOutcome> = pool.install(|| {
    items
      .par_iter()
      .map(|item| {
        debug!(cabinet = %item.cabinet, files = item.files.len(), "building cabinet");
        let result = builder.build(item, destination);
        if let Err(e) = &result {
          warn!(cabinet = %item.cabinet, error = %e, "cabinet failed");
        }
        CabinetOutcome {
          cabinet: item.cabinet.clone(),
          result,
        }
      })
      .collect()
  });

  Ok(outcomes)
}
