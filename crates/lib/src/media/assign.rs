//! Manual and automatic file-to-media assignment.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crate::consts::{MAX_CABINET_INDEX, MERGE_MODULE_CABINET};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::table::definitions::{FILE, MEDIA, MEDIA_TEMPLATE, media_table};
use crate::table::views::{FileRow, MediaRow, MediaTemplateRow, YesNo};
use crate::table::{Output, OutputKind, RowKey, Value};

use super::{MediaError, resolve_budget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
  Manual,
  Auto,
  Module,
}

/// Files destined for one cabinet, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinetGroup {
  pub disk_id: i64,
  pub cabinet: String,
  pub compression_level: Option<String>,
  pub files: Vec<String>,
  /// Sum of the uncompressed sizes of `files`.
  pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAssignment {
  pub mode: AssignmentMode,
  pub cabinets: Vec<CabinetGroup>,
  /// Files installed straight from the media, outside any cabinet.
  pub uncompressed: Vec<String>,
}

impl MediaAssignment {
  pub fn file_count(&self) -> usize {
    self.uncompressed.len() + self.cabinets.iter().map(|c| c.files.len()).sum::<usize>()
  }
}

/// Partitions the `File` table into media groups.
#[derive(Debug, Clone, Default)]
pub struct MediaAssigner {
  /// Overrides the package's own compression default when set.
  pub default_compressed: Option<bool>,
  /// Cabinet size budget override in megabytes.
  pub budget_override_mb: Option<i64>,
}

impl MediaAssigner {
  pub fn new(default_compressed: Option<bool>, budget_override_mb: Option<i64>) -> Self {
    Self {
      default_compressed,
      budget_override_mb,
    }
  }

  /// Assign every file to a disk and, when compressed, to a cabinet.
  ///
  /// Writes `DiskId` back to the `File` table and, in auto mode, replaces the
  /// `Media` table with the generated rows. Authoring problems go to
  /// `diagnostics`.
  pub fn assign(&self, output: &mut Output, diagnostics: &mut Diagnostics) -> Result<MediaAssignment, MediaError> {
    let media_rows = output.table(MEDIA).map_or(0, |t| t.len());
    let template = match output.table(MEDIA_TEMPLATE).and_then(|t| t.row(0)) {
      Some(row) => Some(MediaTemplateRow::from_row(row)?),
      None => None,
    };

    if template.is_some() && media_rows > 1 {
      return Err(MediaError::ConflictingMediaAuthoring { media_rows });
    }

    let files = read_files(output)?;
    let compressed_default = self
      .default_compressed
      .unwrap_or_else(|| output.files_compressed_by_default());

    let assignment = if output.kind == OutputKind::Module {
      self.assign_module(output, &files)?
    } else if let Some(template) = template {
      self.assign_auto(output, &files, &template, compressed_default)?
    } else {
      self.assign_manual(output, &files, compressed_default, diagnostics)?
    };

    info!(
      mode = ?assignment.mode,
      cabinets = assignment.cabinets.len(),
      uncompressed = assignment.uncompressed.len(),
      "assigned files to media"
    );
    Ok(assignment)
  }

  fn assign_module(&self, output: &mut Output, files: &[FileRow]) -> Result<MediaAssignment, MediaError> {
    let group = CabinetGroup {
      disk_id: 1,
      cabinet: MERGE_MODULE_CABINET.to_string(),
      compression_level: None,
      files: files.iter().map(|f| f.file_id.clone()).collect(),
      size_bytes: files.iter().map(file_size).sum(),
    };
    let disk_ids: Vec<(String, i64)> = files.iter().map(|f| (f.file_id.clone(), 1)).collect();
    write_disk_ids(output, &disk_ids)?;

    Ok(MediaAssignment {
      mode: AssignmentMode::Module,
      cabinets: vec![group],
      uncompressed: Vec::new(),
    })
  }

  fn assign_manual(
    &self,
    output: &mut Output,
    files: &[FileRow],
    compressed_default: bool,
    diagnostics: &mut Diagnostics,
  ) -> Result<MediaAssignment, MediaError> {
    let mut media: BTreeMap<i64, MediaRow> = BTreeMap::new();
    if let Some(table) = output.table(MEDIA) {
      let mut cabinet_names: HashMap<String, i64> = HashMap::new();
      for row in table.iter() {
        let row = MediaRow::from_row(row)?;
        if let Some(cabinet) = &row.cabinet_name {
          if let Some(first) = cabinet_names.get(&cabinet.to_lowercase()) {
            diagnostics.error(
              DiagnosticCode::DuplicateCabinetName,
              row.location.as_ref(),
              format!(
                "cabinet '{}' of disk {} is already used by disk {}",
                cabinet, row.disk_id, first
              ),
            );
          } else {
            cabinet_names.insert(cabinet.to_lowercase(), row.disk_id);
          }
        }
        media.insert(row.disk_id, row);
      }
    }

    let mut groups: BTreeMap<i64, CabinetGroup> = BTreeMap::new();
    let mut uncompressed = Vec::new();
    let mut disk_ids = Vec::new();
    let is_product = output.kind == OutputKind::Product;

    for file in files {
      let disk_id = file.disk_id.unwrap_or(1);
      let Some(media_row) = media.get(&disk_id) else {
        diagnostics.error(
          DiagnosticCode::MissingMedia,
          file.location.as_ref(),
          format!("file '{}' refers to disk {}, which has no Media row", file.file_id, disk_id),
        );
        continue;
      };
      disk_ids.push((file.file_id.clone(), disk_id));

      if is_product && !is_compressed(file, compressed_default) {
        uncompressed.push(file.file_id.clone());
        continue;
      }

      let Some(cabinet) = &media_row.cabinet_name else {
        diagnostics.error(
          DiagnosticCode::ExpectedMediaCabinet,
          file.location.as_ref(),
          format!(
            "file '{}' is compressed but disk {} has no cabinet",
            file.file_id, disk_id
          ),
        );
        continue;
      };

      let group = groups.entry(disk_id).or_insert_with(|| CabinetGroup {
        disk_id,
        cabinet: cabinet.clone(),
        compression_level: media_row.compression_level.clone(),
        files: Vec::new(),
        size_bytes: 0,
      });
      group.files.push(file.file_id.clone());
      group.size_bytes += file_size(file);
    }

    write_disk_ids(output, &disk_ids)?;

    Ok(MediaAssignment {
      mode: AssignmentMode::Manual,
      cabinets: groups.into_values().collect(),
      uncompressed,
    })
  }

  fn assign_auto(
    &self,
    output: &mut Output,
    files: &[FileRow],
    template: &MediaTemplateRow,
    compressed_default: bool,
  ) -> Result<MediaAssignment, MediaError> {
    let budget = resolve_budget(self.budget_override_mb, template.maximum_uncompressed_media_size)?;
    let is_product = output.kind == OutputKind::Product;

    let mut cabinets: Vec<CabinetGroup> = Vec::new();
    let mut uncompressed = Vec::new();
    let mut disk_ids = Vec::new();
    let mut current: u64 = 0;

    for file in files {
      if is_product && !is_compressed(file, compressed_default) {
        uncompressed.push(file.file_id.clone());
        continue;
      }

      let size = file_size(file);
      let at_cap = cabinets.len() >= MAX_CABINET_INDEX as usize;
      let overflows = current.saturating_add(size) > budget;

      if cabinets.is_empty() || (overflows && !at_cap) {
        let index = cabinets.len() as u32 + 1;
        cabinets.push(CabinetGroup {
          disk_id: i64::from(index),
          cabinet: template.cabinet_name(index),
          compression_level: template.compression_level.clone(),
          files: Vec::new(),
          size_bytes: 0,
        });
        current = size;
      } else {
        current = current.saturating_add(size);
      }

      if let Some(cabinet) = cabinets.last_mut() {
        cabinet.files.push(file.file_id.clone());
        cabinet.size_bytes += size;
        disk_ids.push((file.file_id.clone(), cabinet.disk_id));
      }
    }

    for file_id in &uncompressed {
      disk_ids.push((file_id.clone(), 1));
    }

    let table = output.ensure_table(&media_table())?;
    table.clear_rows();
    for cabinet in &cabinets {
      let mut row = table.create_row(vec![Value::Number(cabinet.disk_id)], template.location.clone())?;
      row.set("LastSequence", Some(Value::Number(0)))?;
      row.set("Cabinet", Some(Value::string(cabinet.cabinet.clone())))?;
      row.set("CompressionLevel", cabinet.compression_level.clone().map(Value::String))?;
      row.set("DiskPrompt", template.disk_prompt.clone().map(Value::String))?;
      row.set("VolumeLabel", template.volume_label.clone().map(Value::String))?;
    }
    if cabinets.is_empty() && !uncompressed.is_empty() {
      let mut row = table.create_row(vec![Value::Number(1)], template.location.clone())?;
      row.set("LastSequence", Some(Value::Number(0)))?;
      row.set("DiskPrompt", template.disk_prompt.clone().map(Value::String))?;
      row.set("VolumeLabel", template.volume_label.clone().map(Value::String))?;
    }

    write_disk_ids(output, &disk_ids)?;
    debug!(budget, cabinets = cabinets.len(), "auto media assignment");

    Ok(MediaAssignment {
      mode: AssignmentMode::Auto,
      cabinets,
      uncompressed,
    })
  }
}

fn is_compressed(file: &FileRow, default: bool) -> bool {
  match file.compressed {
    YesNo::Yes => true,
    YesNo::No => false,
    YesNo::NotSet => default,
  }
}

fn file_size(file: &FileRow) -> u64 {
  u64::try_from(file.size_bytes).unwrap_or(0)
}

fn read_files(output: &Output) -> Result<Vec<FileRow>, MediaError> {
  let Some(table) = output.table(FILE) else {
    return Ok(Vec::new());
  };
  let files = table.iter().map(FileRow::from_row).collect::<Result<Vec<_>, _>>()?;
  Ok(files)
}

fn write_disk_ids(output: &mut Output, disk_ids: &[(String, i64)]) -> Result<(), MediaError> {
  let Some(table) = output.table_mut(FILE) else {
    return Ok(());
  };
  for (file_id, disk_id) in disk_ids {
    if let Some(mut row) = table.find_mut(&RowKey::single(file_id.as_str())) {
      row.set("DiskId", Some(Value::Number(*disk_id)))?;
    }
  }
  Ok(())
}
