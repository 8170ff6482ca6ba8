//! Typed, read-only views over rows of the standard tables.
//!
//! Views are built on demand from a [`RowRef`]; changes always go back
//! through [`RowMut`](super::RowMut) using the column names in
//! [`definitions`](super::definitions).

use serde::Serialize;

use crate::consts::DEFAULT_CABINET_TEMPLATE;
use crate::diagnostics::SourceLineNumber;

use super::definitions::{COMPONENT, DIRECTORY, FILE, MEDIA, MEDIA_TEMPLATE, REGISTRY};
use super::{RowRef, SchemaError};

/// Tri-state authoring flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum YesNo {
  Yes,
  No,
  #[default]
  NotSet,
}

impl YesNo {
  fn from_number(value: Option<i64>) -> Self {
    match value {
      Some(0) => YesNo::No,
      Some(_) => YesNo::Yes,
      None => YesNo::NotSet,
    }
  }
}

/// Long-name part of a `short|long` file or directory name.
pub fn long_name(name: &str) -> &str {
  match name.split_once('|') {
    Some((_, long)) => long,
    None => name,
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
  pub file_id: String,
  pub component_id: String,
  pub file_name: String,
  pub source_path: Option<String>,
  pub disk_id: Option<i64>,
  pub compressed: YesNo,
  pub size_bytes: i64,
  pub version: Option<String>,
  pub language: Option<String>,
  pub attributes: Option<i64>,
  pub sequence: Option<i64>,
  /// `-1` when the file was not added by a patch.
  pub patch_group: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl FileRow {
  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      file_id: row.require_str("File")?.to_string(),
      component_id: row.require_str("Component_")?.to_string(),
      file_name: row.require_str("FileName")?.to_string(),
      source_path: row.get_str("Source")?.map(str::to_string),
      disk_id: row.get_number("DiskId")?,
      compressed: YesNo::from_number(row.get_number("Compressed")?),
      size_bytes: row.require_number("FileSize")?,
      version: row.get_str("Version")?.map(str::to_string),
      language: row.get_str("Language")?.map(str::to_string),
      attributes: row.get_number("Attributes")?,
      sequence: row.get_number("Sequence")?,
      patch_group: row.get_number("PatchGroup")?.unwrap_or(-1),
      location: row.location().cloned(),
    })
  }

  pub fn long_file_name(&self) -> &str {
    long_name(&self.file_name)
  }

  /// A file is versioned when it carries a version string rather than a
  /// companion-file reference or nothing.
  pub fn is_versioned(&self) -> bool {
    self
      .version
      .as_deref()
      .is_some_and(|v| v.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())))
  }

  pub fn is_patch_added(&self) -> bool {
    self.patch_group >= 0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRow {
  pub disk_id: i64,
  pub last_sequence: i64,
  pub cabinet_name: Option<String>,
  pub compression_level: Option<String>,
  pub disk_prompt: Option<String>,
  pub volume_label: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl MediaRow {
  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      disk_id: row.require_number("DiskId")?,
      last_sequence: row.require_number("LastSequence")?,
      cabinet_name: row.get_str("Cabinet")?.map(str::to_string),
      compression_level: row.get_str("CompressionLevel")?.map(str::to_string),
      disk_prompt: row.get_str("DiskPrompt")?.map(str::to_string),
      volume_label: row.get_str("VolumeLabel")?.map(str::to_string),
      location: row.location().cloned(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaTemplateRow {
  pub cabinet_template: String,
  pub compression_level: Option<String>,
  pub disk_prompt: Option<String>,
  pub volume_label: Option<String>,
  /// Per-cabinet budget in megabytes, when authored.
  pub maximum_uncompressed_media_size: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl MediaTemplateRow {
  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      cabinet_template: row
        .get_str("CabinetTemplate")?
        .unwrap_or(DEFAULT_CABINET_TEMPLATE)
        .to_string(),
      compression_level: row.get_str("CompressionLevel")?.map(str::to_string),
      disk_prompt: row.get_str("DiskPrompt")?.map(str::to_string),
      volume_label: row.get_str("VolumeLabel")?.map(str::to_string),
      maximum_uncompressed_media_size: row.get_number("MaximumUncompressedMediaSize")?,
      location: row.location().cloned(),
    })
  }

  /// Cabinet name for 1-based cabinet `index`.
  pub fn cabinet_name(&self, index: u32) -> String {
    self.cabinet_template.replace("{0}", &index.to_string())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRow {
  pub component: String,
  pub guid: Option<String>,
  pub directory: String,
  pub attributes: i64,
  pub condition: Option<String>,
  pub key_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl ComponentRow {
  /// Key path is a `Registry` row.
  pub const REGISTRY_KEY_PATH: i64 = 0x4;
  /// Key path is an ODBC data source.
  pub const ODBC_KEY_PATH: i64 = 0x20;

  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      component: row.require_str("Component")?.to_string(),
      guid: row.get_str("ComponentId")?.map(str::to_string),
      directory: row.require_str("Directory_")?.to_string(),
      attributes: row.require_number("Attributes")?,
      condition: row.get_str("Condition")?.map(str::to_string),
      key_path: row.get_str("KeyPath")?.map(str::to_string),
      location: row.location().cloned(),
    })
  }

  pub fn has_registry_key_path(&self) -> bool {
    self.attributes & Self::REGISTRY_KEY_PATH != 0
  }

  pub fn has_odbc_key_path(&self) -> bool {
    self.attributes & Self::ODBC_KEY_PATH != 0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryRow {
  pub directory: String,
  pub parent: Option<String>,
  pub default_dir: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl DirectoryRow {
  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      directory: row.require_str("Directory")?.to_string(),
      parent: row.get_str("Directory_Parent")?.map(str::to_string),
      default_dir: row.require_str("DefaultDir")?.to_string(),
      location: row.location().cloned(),
    })
  }

  /// Long target name from `DefaultDir` (`target[:source]`, each `short|long`).
  pub fn target_name(&self) -> &str {
    let target = match self.default_dir.split_once(':') {
      Some((target, _)) => target,
      None => &self.default_dir,
    };
    long_name(target)
  }

  pub fn is_root(&self) -> bool {
    match &self.parent {
      None => true,
      Some(parent) => parent.is_empty() || parent == &self.directory,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryRow {
  pub registry: String,
  pub root: i64,
  pub key: String,
  pub name: Option<String>,
  pub value: Option<String>,
  pub component: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl RegistryRow {
  pub fn from_row(row: RowRef<'_>) -> Result<Self, SchemaError> {
    Ok(Self {
      registry: row.require_str("Registry")?.to_string(),
      root: row.require_number("Root")?,
      key: row.require_str("Key")?.to_string(),
      name: row.get_str("Name")?.map(str::to_string),
      value: row.get_str("Value")?.map(str::to_string),
      component: row.require_str("Component_")?.to_string(),
      location: row.location().cloned(),
    })
  }
}

/// A row of one of the standard tables, viewed through its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum TypedRow {
  File(FileRow),
  Media(MediaRow),
  MediaTemplate(MediaTemplateRow),
  Component(ComponentRow),
  Directory(DirectoryRow),
  Registry(RegistryRow),
}

impl TypedRow {
  /// View `row` by its table's name. Returns `None` for tables without a typed view.
  pub fn from_row(row: RowRef<'_>) -> Result<Option<Self>, SchemaError> {
    let typed = match row.definition().name.as_str() {
      FILE => TypedRow::File(FileRow::from_row(row)?),
      MEDIA => TypedRow::Media(MediaRow::from_row(row)?),
      MEDIA_TEMPLATE => TypedRow::MediaTemplate(MediaTemplateRow::from_row(row)?),
      COMPONENT => TypedRow::Component(ComponentRow::from_row(row)?),
      DIRECTORY => TypedRow::Directory(DirectoryRow::from_row(row)?),
      REGISTRY => TypedRow::Registry(RegistryRow::from_row(row)?),
      _ => return Ok(None),
    };
    Ok(Some(typed))
  }
}
