use anyhow::{Context, Result};
use uuid::Uuid;

use msibind_lib::consts::COMPONENT_GUID_NAMESPACE;
use msibind_lib::guid::{format_guid, stable_id};

pub fn cmd_guid(input: &str, namespace: Option<&str>) -> Result<()> {
  let namespace = match namespace {
    Some(text) => Uuid::parse_str(text).with_context(|| format!("Invalid namespace UUID '{}'", text))?,
    None => COMPONENT_GUID_NAMESPACE,
  };
  println!("{}", format_guid(&stable_id(&namespace, input)));
  Ok(())
}
