//! Implementation of the `msibind media` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use msibind_lib::binder::Binder;
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::persist;

use crate::output::{format_bytes, print_diagnostics, print_json, print_stat, print_success, symbols};

/// Bind a linked product in place and report its media layout.
///
/// The bound output is written to `output` when given; the input file is
/// never modified.
pub fn cmd_media(file: &Path, output: Option<&Path>, config: &BindConfig, json: bool) -> Result<()> {
  let mut document =
    persist::load_output(file).with_context(|| format!("Failed to load output {}", file.display()))?;

  let binder = Binder::new(config, &LocalFileSystem, &LocalFileSystem);
  let result = binder.bind_product(&mut document).map_err(super::report)?;

  if let Some(path) = output {
    persist::save_output(path, &document).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "bound output saved");
  }

  if json {
    let json_output = serde_json::json!({
      "assignment": result.assignment,
      "work_items": result.work_items,
      "generated_guids": result.generated_guids,
      "diagnostics": result.diagnostics,
    });
    return print_json(&json_output);
  }

  print_diagnostics(&result.diagnostics);
  print_success(&format!(
    "Bound {} file(s) into {} cabinet(s)",
    result.assignment.file_count(),
    result.assignment.cabinets.len()
  ));
  for cabinet in &result.assignment.cabinets {
    println!(
      "  {} {} (disk {}, {} file(s), {})",
      symbols::INFO,
      cabinet.cabinet,
      cabinet.disk_id,
      cabinet.files.len(),
      format_bytes(cabinet.size_bytes)
    );
  }
  println!();
  print_stat("Uncompressed", &result.assignment.uncompressed.len().to_string());
  print_stat("Generated GUIDs", &result.generated_guids.to_string());
  if let Some(path) = output {
    print_stat("Written", &path.display().to_string());
  }

  Ok(())
}
