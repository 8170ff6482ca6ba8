//! Definitions of the standard tables the binder reads and writes.

use super::{ColumnDefinition as Col, ColumnType, TableDefinition};

pub const FILE: &str = "File";
pub const MEDIA: &str = "Media";
pub const MEDIA_TEMPLATE: &str = "MediaTemplate";
pub const COMPONENT: &str = "Component";
pub const DIRECTORY: &str = "Directory";
pub const REGISTRY: &str = "Registry";
pub const PROPERTY: &str = "Property";
pub const SUMMARY_INFORMATION: &str = "_SummaryInformation";
pub const BINARY: &str = "Binary";

const MAX_I32: i64 = i32::MAX as i64;

pub fn file_table() -> TableDefinition {
  TableDefinition::new(
    FILE,
    vec![
      Col::new("File", ColumnType::String).key(),
      Col::new("Component_", ColumnType::String),
      Col::new("FileName", ColumnType::LocalizedString).localizable(),
      Col::new("FileSize", ColumnType::Number).range(0, MAX_I32),
      Col::new("Version", ColumnType::String).nullable(),
      Col::new("Language", ColumnType::String).nullable(),
      Col::new("Attributes", ColumnType::Number).nullable().range(0, 32767),
      Col::new("Sequence", ColumnType::Number).nullable().range(1, MAX_I32),
      Col::new("Source", ColumnType::BinaryObject).nullable().unreal(),
      Col::new("DiskId", ColumnType::Number).nullable().range(1, 32767).unreal(),
      Col::new("Compressed", ColumnType::Number).nullable().range(0, 1).unreal(),
      Col::new("PatchGroup", ColumnType::Number).nullable().range(-1, 32767).unreal(),
    ],
  )
}

pub fn media_table() -> TableDefinition {
  TableDefinition::new(
    MEDIA,
    vec![
      Col::new("DiskId", ColumnType::Number).key().range(1, 32767),
      Col::new("LastSequence", ColumnType::Number).range(0, MAX_I32),
      Col::new("DiskPrompt", ColumnType::LocalizedString).nullable().localizable(),
      Col::new("Cabinet", ColumnType::String).nullable(),
      Col::new("VolumeLabel", ColumnType::String).nullable(),
      Col::new("Source", ColumnType::String).nullable(),
      Col::new("CompressionLevel", ColumnType::String).nullable().unreal(),
    ],
  )
}

pub fn media_template_table() -> TableDefinition {
  TableDefinition::new(
    MEDIA_TEMPLATE,
    vec![
      Col::new("CabinetTemplate", ColumnType::String).nullable(),
      Col::new("CompressionLevel", ColumnType::String).nullable(),
      Col::new("DiskPrompt", ColumnType::LocalizedString).nullable().localizable(),
      Col::new("VolumeLabel", ColumnType::String).nullable(),
      Col::new("MaximumUncompressedMediaSize", ColumnType::Number)
        .nullable()
        .range(1, MAX_I32),
    ],
  )
  .unreal()
}

pub fn component_table() -> TableDefinition {
  TableDefinition::new(
    COMPONENT,
    vec![
      Col::new("Component", ColumnType::String).key(),
      Col::new("ComponentId", ColumnType::String).nullable(),
      Col::new("Directory_", ColumnType::String),
      Col::new("Attributes", ColumnType::Number).range(0, 32767),
      Col::new("Condition", ColumnType::String).nullable(),
      Col::new("KeyPath", ColumnType::String).nullable(),
    ],
  )
}

pub fn directory_table() -> TableDefinition {
  TableDefinition::new(
    DIRECTORY,
    vec![
      Col::new("Directory", ColumnType::String).key(),
      Col::new("Directory_Parent", ColumnType::String).nullable(),
      Col::new("DefaultDir", ColumnType::LocalizedString).localizable(),
    ],
  )
}

pub fn registry_table() -> TableDefinition {
  TableDefinition::new(
    REGISTRY,
    vec![
      Col::new("Registry", ColumnType::String).key(),
      Col::new("Root", ColumnType::Number).range(-1, 3),
      Col::new("Key", ColumnType::LocalizedString).localizable(),
      Col::new("Name", ColumnType::LocalizedString).nullable().localizable(),
      Col::new("Value", ColumnType::LocalizedString).nullable().localizable(),
      Col::new("Component_", ColumnType::String),
    ],
  )
}

pub fn property_table() -> TableDefinition {
  TableDefinition::new(
    PROPERTY,
    vec![
      Col::new("Property", ColumnType::String).key(),
      Col::new("Value", ColumnType::LocalizedString).localizable(),
    ],
  )
}

pub fn summary_information_table() -> TableDefinition {
  TableDefinition::new(
    SUMMARY_INFORMATION,
    vec![
      Col::new("PropertyId", ColumnType::Number).key().range(1, 19),
      Col::new("Value", ColumnType::LocalizedString).localizable(),
    ],
  )
}

pub fn binary_table() -> TableDefinition {
  TableDefinition::new(
    BINARY,
    vec![
      Col::new("Name", ColumnType::String).key(),
      Col::new("Data", ColumnType::BinaryObject),
    ],
  )
}

/// Standard definition for `name`, if it is one of the tables above.
pub fn standard(name: &str) -> Option<TableDefinition> {
  let definition = match name {
    FILE => file_table(),
    MEDIA => media_table(),
    MEDIA_TEMPLATE => media_template_table(),
    COMPONENT => component_table(),
    DIRECTORY => directory_table(),
    REGISTRY => registry_table(),
    PROPERTY => property_table(),
    SUMMARY_INFORMATION => summary_information_table(),
    BINARY => binary_table(),
    _ => return None,
  };
  Some(definition)
}
