//! Generated component GUIDs (`ComponentId` authored as `*`).

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::consts::{COMPONENT_GUID_NAMESPACE, GENERATE_GUID};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::table::definitions::{COMPONENT, FILE, REGISTRY};
use crate::table::views::{ComponentRow, FileRow, RegistryRow};
use crate::table::{Output, RowIndex, RowKey, Value};

use super::{DirectoryResolver, GuidError, format_guid, is_volatile_path, stable_id};

/// Assigns GUIDs to components that asked for a generated one.
///
/// Ineligible components are reported to the diagnostic sink and keep their
/// `*`; directory resolution failures abort the pass.
#[derive(Debug, Clone)]
pub struct ComponentGuidGenerator {
  namespace: Uuid,
}

impl Default for ComponentGuidGenerator {
  fn default() -> Self {
    Self {
      namespace: COMPONENT_GUID_NAMESPACE,
    }
  }
}

impl ComponentGuidGenerator {
  pub fn new(namespace: Uuid) -> Self {
    Self { namespace }
  }

  /// Generate GUIDs in place. Returns how many components were assigned one.
  pub fn generate(&self, output: &mut Output, diagnostics: &mut Diagnostics) -> Result<usize, GuidError> {
    let Some(components) = output.table(COMPONENT) else {
      return Ok(0);
    };

    let pending: Vec<ComponentRow> = components
      .iter()
      .map(ComponentRow::from_row)
      .collect::<Result<Vec<_>, _>>()?
      .into_iter()
      .filter(|c| c.guid.as_deref() == Some(GENERATE_GUID))
      .collect();
    if pending.is_empty() {
      return Ok(0);
    }

    let files = files_by_component(output, &pending)?;
    let registry = registry_by_id(output)?;
    let mut resolver = DirectoryResolver::from_output(output)?;

    let mut assigned = Vec::new();
    for component in &pending {
      if let Some(input) = self.canonical_input(component, &files, &registry, &mut resolver, diagnostics)? {
        let guid = format_guid(&stable_id(&self.namespace, &input));
        debug!(component = %component.component, input = %input, guid = %guid, "generated component guid");
        assigned.push((component.component.clone(), guid));
      }
    }

    let count = assigned.len();
    if let Some(table) = output.table_mut(COMPONENT) {
      for (component, guid) in assigned {
        if let Some(mut row) = table.find_mut(&RowKey::single(component)) {
          row.set("ComponentId", Some(Value::string(guid)))?;
        }
      }
    }

    info!(generated = count, requested = pending.len(), "component guids");
    Ok(count)
  }

  /// Canonical string hashed for `component`, or `None` after reporting why
  /// the component cannot have a generated GUID.
  fn canonical_input(
    &self,
    component: &ComponentRow,
    files: &HashMap<String, Vec<FileRow>>,
    registry: &HashMap<String, RegistryRow>,
    resolver: &mut DirectoryResolver,
    diagnostics: &mut Diagnostics,
  ) -> Result<Option<String>, GuidError> {
    let location = component.location.as_ref();
    let id = &component.component;

    let Some(key_path) = component.key_path.as_deref() else {
      diagnostics.error(
        DiagnosticCode::IllegalComponentWithAutoGeneratedGuid,
        location,
        format!("component '{}' has a directory key path and cannot have a generated guid", id),
      );
      return Ok(None);
    };

    if component.has_odbc_key_path() {
      diagnostics.error(
        DiagnosticCode::IllegalComponentWithAutoGeneratedGuid,
        location,
        format!("component '{}' has an ODBC data source key path and cannot have a generated guid", id),
      );
      return Ok(None);
    }

    if component.has_registry_key_path() {
      let Some(value) = registry.get(key_path) else {
        diagnostics.error(
          DiagnosticCode::IllegalComponentWithAutoGeneratedGuid,
          location,
          format!("component '{}' key path registry value '{}' does not exist", id, key_path),
        );
        return Ok(None);
      };
      let input = format!("{}\\{}\\{}", value.root, value.key, value.name.as_deref().unwrap_or(""));
      return Ok(Some(input.to_lowercase()));
    }

    let owned = files.get(id).map(Vec::as_slice).unwrap_or(&[]);
    let Some(key_file) = owned.iter().find(|f| f.file_id == key_path) else {
      diagnostics.error(
        DiagnosticCode::IllegalComponentWithAutoGeneratedGuid,
        location,
        format!("component '{}' key path file '{}' does not exist", id, key_path),
      );
      return Ok(None);
    };

    if owned.len() > 1 {
      let others_unversioned = owned.iter().filter(|f| f.file_id != key_path).all(|f| !f.is_versioned());
      if !key_file.is_versioned() || !others_unversioned {
        diagnostics.error(
          DiagnosticCode::IllegalGroupForGeneratedId,
          location,
          format!(
            "component '{}' has more than one file; a generated guid needs a versioned key file and unversioned companions",
            id
          ),
        );
        return Ok(None);
      }
    }

    let directory = resolver.resolve(&component.directory, id)?;
    let path = format!("{}\\{}", directory, key_file.long_file_name().to_lowercase());
    if is_volatile_path(&path) {
      diagnostics.error(
        DiagnosticCode::IllegalPathForGeneratedId,
        location,
        format!(
          "component '{}' is installed to '{}', which cannot have a generated guid",
          id, path
        ),
      );
      return Ok(None);
    }

    Ok(Some(path))
  }
}

/// Files owned by each of `components`, looked up through a `Component_` index.
fn files_by_component(output: &Output, components: &[ComponentRow]) -> Result<HashMap<String, Vec<FileRow>>, GuidError> {
  let mut files: HashMap<String, Vec<FileRow>> = HashMap::new();
  let Some(table) = output.table(FILE) else {
    return Ok(files);
  };

  let index = RowIndex::build(table, &["Component_"])?;
  for component in components {
    let owned = files.entry(component.component.clone()).or_default();
    for &position in index.get(&RowKey::single(component.component.as_str())) {
      if let Some(row) = table.row(position) {
        owned.push(FileRow::from_row(row)?);
      }
    }
  }
  Ok(files)
}

fn registry_by_id(output: &Output) -> Result<HashMap<String, RegistryRow>, GuidError> {
  let mut registry = HashMap::new();
  if let Some(table) = output.table(REGISTRY) {
    for row in table.iter() {
      let value = RegistryRow::from_row(row)?;
      registry.insert(value.registry.clone(), value);
    }
  }
  Ok(registry)
}
