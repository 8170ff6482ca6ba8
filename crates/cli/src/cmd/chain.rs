//! Implementation of the `msibind chain` command.

use std::path::Path;

use anyhow::{Context, Result};

use msibind_lib::binder::Binder;
use msibind_lib::chain::ChainDocument;
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::persist;

use crate::output::{print_diagnostics, print_json, print_stat, print_success, symbols};

pub fn cmd_chain(file: &Path, config: &BindConfig, json: bool) -> Result<()> {
  let document: ChainDocument =
    persist::load_json(file).with_context(|| format!("Failed to load chain {}", file.display()))?;

  let binder = Binder::new(config, &LocalFileSystem, &LocalFileSystem);
  let result = binder.bind_bundle(&document).map_err(super::report)?;
  let plan = &result.plan;

  if json {
    let json_output = serde_json::json!({ "plan": plan, "diagnostics": result.diagnostics });
    return print_json(&json_output);
  }

  print_diagnostics(&result.diagnostics);
  print_success(&format!(
    "Planned {} package(s) in {} rollback boundary group(s)",
    plan.packages.len(),
    plan.used_boundaries.len()
  ));
  for package in &plan.packages {
    if let Some(forward) = &package.rollback_boundary_forward {
      println!("  [{}]", forward);
    }
    let backward = package.rollback_boundary_backward_id.as_deref().unwrap_or("-");
    println!("  {} {} {} {}", symbols::INFO, package.id, symbols::ARROW, backward);
  }

  if !plan.slipstreams.is_empty() {
    println!();
    for slipstream in &plan.slipstreams {
      print_stat("Slipstream", &format!("{} {} {}", slipstream.msp, symbols::ARROW, slipstream.msi));
    }
  }

  Ok(())
}
