//! Implementation of the `msibind transform` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use msibind_lib::binder::Binder;
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::diagnostics::Diagnostics;
use msibind_lib::persist;
use msibind_lib::table::OutputKind;
use msibind_lib::transform::TransformPair;

use crate::output::{print_diagnostics, print_json, print_stat, print_success, symbols};

/// Diff a transform, or every transform of a patch, into `out_dir`.
///
/// A patch writes each transform under `out_dir/<sub-storage name>/`.
pub fn cmd_transform(file: &Path, out_dir: &Path, config: &BindConfig, json: bool) -> Result<()> {
  let document =
    persist::load_output(file).with_context(|| format!("Failed to load document {}", file.display()))?;
  let binder = Binder::new(config, &LocalFileSystem, &LocalFileSystem);

  let (pairs, diagnostics): (Vec<(Option<String>, TransformPair)>, Diagnostics) = match document.kind {
    OutputKind::Transform => {
      let (pair, diagnostics) = binder.bind_transform(&document).map_err(super::report)?;
      (vec![(None, pair)], diagnostics)
    }
    OutputKind::Patch => {
      let result = binder.bind_patch(&document).map_err(super::report)?;
      let pairs = result.pairs.into_iter().map(|(name, pair)| (Some(name), pair)).collect();
      (pairs, result.diagnostics)
    }
    other => bail!("{} holds a {:?} output, expected a transform or patch", file.display(), other),
  };

  let mut written = Vec::with_capacity(pairs.len());
  for (name, pair) in &pairs {
    let dir = match name {
      Some(name) => out_dir.join(name),
      None => out_dir.to_path_buf(),
    };
    let (target, updated) = persist::save_transform_pair(&dir, pair)
      .with_context(|| format!("Failed to write snapshots to {}", dir.display()))?;
    info!(dir = %dir.display(), "transform snapshots saved");
    written.push((name.clone(), target, updated, pair.validation_flags));
  }

  if json {
    let items: Vec<_> = written
      .iter()
      .map(|(name, target, updated, flags)| {
        serde_json::json!({
          "name": name,
          "target": target,
          "updated": updated,
          "validation_flags": flags,
        })
      })
      .collect();
    let json_output = serde_json::json!({ "transforms": items, "diagnostics": diagnostics });
    return print_json(&json_output);
  }

  print_diagnostics(&diagnostics);
  print_success(&format!("Wrote {} transform snapshot pair(s)", written.len()));
  for (name, target, updated, flags) in &written {
    if let Some(name) = name {
      println!("  {} {}", symbols::INFO, name);
    }
    print_stat("Target", &target.display().to_string());
    print_stat("Updated", &updated.display().to_string());
    if let Some(flags) = flags {
      print_stat("Validation flags", &format!("{:#x}", flags));
    }
  }

  Ok(())
}
