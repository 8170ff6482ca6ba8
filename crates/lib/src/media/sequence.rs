//! File sequence numbers and media `LastSequence`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::table::definitions::{FILE, MEDIA};
use crate::table::views::FileRow;
use crate::table::{Output, RowKey, Value};

use super::MediaError;

/// Number files 1..n and record the last sequence of each disk.
///
/// Files are ordered by disk id (stable over table order), with files added
/// by a patch placed after all others and ordered by patch group. Disks that
/// hold no files inherit the last sequence of the disk before them.
pub fn sequence_files(output: &mut Output) -> Result<usize, MediaError> {
  let mut files: Vec<FileRow> = match output.table(FILE) {
    Some(table) => table.iter().map(FileRow::from_row).collect::<Result<_, _>>()?,
    None => Vec::new(),
  };

  files.sort_by_key(|f| {
    let patch_group = if f.is_patch_added() { f.patch_group } else { -1 };
    (f.is_patch_added(), patch_group, f.disk_id.unwrap_or(1))
  });

  let mut last_by_disk: BTreeMap<i64, i64> = BTreeMap::new();
  if let Some(table) = output.table_mut(FILE) {
    for (position, file) in files.iter().enumerate() {
      let sequence = position as i64 + 1;
      if let Some(mut row) = table.find_mut(&RowKey::single(file.file_id.as_str())) {
        row.set("Sequence", Some(Value::Number(sequence)))?;
      }
      let last = last_by_disk.entry(file.disk_id.unwrap_or(1)).or_insert(0);
      *last = (*last).max(sequence);
    }
  }

  if let Some(table) = output.table_mut(MEDIA) {
    let mut disks: Vec<(i64, usize)> = Vec::new();
    for (index, row) in table.iter().enumerate() {
      disks.push((row.require_number("DiskId")?, index));
    }
    disks.sort();

    let mut running = 0;
    for (disk_id, index) in disks {
      if let Some(last) = last_by_disk.get(&disk_id) {
        running = running.max(*last);
      }
      table.require_row_mut(index)?.set("LastSequence", Some(Value::Number(running)))?;
    }
  }

  debug!(files = files.len(), "sequenced files");
  Ok(files.len())
}
