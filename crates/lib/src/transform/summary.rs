//! Decomposition of transform summary information into the two snapshots.

use tracing::debug;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::table::definitions::property_table;
use crate::table::{Output, RowKey, SchemaError, Table, Value};

const PID_CODEPAGE: i64 = 1;
const PID_TARGET_PLATFORM_LANGUAGE: i64 = 7;
const PID_UPDATED_PLATFORM_LANGUAGE: i64 = 8;
const PID_REVISION_NUMBER: i64 = 9;
const PID_VALIDATION_FLAGS: i64 = 16;

const GUID_LEN: usize = 38;

/// Product codes and versions packed into a transform's revision number:
/// `{target-code}target-version;{updated-code}updated-version;{upgrade-code}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionNumber {
  pub target_product_code: String,
  pub target_version: String,
  pub updated_product_code: String,
  pub updated_version: String,
  pub upgrade_code: Option<String>,
}

fn split_code_version(part: &str) -> Option<(String, String)> {
  if part.len() < GUID_LEN || !part.starts_with('{') {
    return None;
  }
  let (code, version) = part.split_at_checked(GUID_LEN)?;
  if !code.ends_with('}') {
    return None;
  }
  Some((code.to_string(), version.to_string()))
}

pub fn parse_revision_number(value: &str) -> Option<RevisionNumber> {
  let mut parts = value.split(';');
  let (target_product_code, target_version) = split_code_version(parts.next()?)?;
  let (updated_product_code, updated_version) = split_code_version(parts.next()?)?;
  let upgrade_code = match parts.next().map(str::trim) {
    None | Some("") => None,
    Some(code) if code.len() == GUID_LEN && code.starts_with('{') && code.ends_with('}') => Some(code.to_string()),
    Some(_) => return None,
  };
  if parts.next().is_some() {
    return None;
  }

  Some(RevisionNumber {
    target_product_code,
    target_version,
    updated_product_code,
    updated_version,
    upgrade_code,
  })
}

fn upsert_property(output: &mut Output, name: &str, value: &str) -> Result<(), SchemaError> {
  let table = output.ensure_table(&property_table())?;
  let value = Some(Value::string(value));
  match table.find_mut(&RowKey::single(name)) {
    Some(mut row) => row.set("Value", value),
    None => table.create_row(vec![Value::string(name)], None)?.set("Value", value),
  }
}

/// Spread the summary rows of a transform over `target` and `updated`.
///
/// Returns the validation flags, when authored.
pub(crate) fn decompose(
  summary: &Table,
  target: &mut Output,
  updated: &mut Output,
  diagnostics: &mut Diagnostics,
) -> Result<Option<i64>, SchemaError> {
  let mut validation_flags = None;

  for row in summary.iter() {
    let pid = row.require_number("PropertyId")?;
    let Some(value) = row.get("Value")?.cloned() else {
      continue;
    };

    match pid {
      PID_CODEPAGE => {
        target.set_summary_value(pid, value.clone())?;
        updated.set_summary_value(pid, value)?;
      }
      PID_TARGET_PLATFORM_LANGUAGE => target.set_summary_value(PID_TARGET_PLATFORM_LANGUAGE, value)?,
      PID_UPDATED_PLATFORM_LANGUAGE => updated.set_summary_value(PID_TARGET_PLATFORM_LANGUAGE, value)?,
      PID_REVISION_NUMBER => {
        let text = value.to_string();
        let Some(revision) = parse_revision_number(&text) else {
          diagnostics.error(
            DiagnosticCode::InvalidSummaryValue,
            row.location(),
            format!("revision number '{}' is not of the form {{code}}version;{{code}}version;{{code}}", text),
          );
          continue;
        };
        upsert_property(target, "ProductCode", &revision.target_product_code)?;
        upsert_property(target, "ProductVersion", &revision.target_version)?;
        upsert_property(updated, "ProductCode", &revision.updated_product_code)?;
        upsert_property(updated, "ProductVersion", &revision.updated_version)?;
        if let Some(upgrade_code) = &revision.upgrade_code {
          upsert_property(target, "UpgradeCode", upgrade_code)?;
          upsert_property(updated, "UpgradeCode", upgrade_code)?;
        }
      }
      PID_VALIDATION_FLAGS => match value.to_string().trim().parse::<i64>() {
        Ok(flags) => validation_flags = Some(flags),
        Err(_) => diagnostics.error(
          DiagnosticCode::InvalidSummaryValue,
          row.location(),
          format!("validation flags '{}' are not a number", value),
        ),
      },
      _ => {
        target.set_summary_value(pid, value.clone())?;
        updated.set_summary_value(pid, value)?;
      }
    }
  }

  debug!(?validation_flags, "decomposed summary information");
  Ok(validation_flags)
}
