//! Product binds: probing, component GUIDs, media and sequencing.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use msibind_lib::binder::{BindError, Binder};
use msibind_lib::cabinet::{CabinetBuilder, CabinetError, CabinetWorkItem};
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::consts::COMPONENT_GUID_NAMESPACE;
use msibind_lib::diagnostics::DiagnosticCode;
use msibind_lib::guid::{format_guid, stable_id};
use msibind_lib::media::{AssignmentMode, MediaError};
use msibind_lib::table::definitions::{COMPONENT, FILE, MEDIA, media_template_table};
use msibind_lib::table::views::{FileRow, MediaRow};
use msibind_lib::table::{Output, RowKey, Value};

use super::common::{add_media, compress_by_default, never_equal, product, source_file};

/// Writes the embedded ids of a work item, one per line.
struct ListingBuilder;

impl CabinetBuilder for ListingBuilder {
  fn build(&self, item: &CabinetWorkItem, destination: &Path) -> Result<PathBuf, CabinetError> {
    let path = destination.join(&item.cabinet);
    let listing: Vec<&str> = item.files.iter().map(|f| f.embedded_id.as_str()).collect();
    fs::create_dir_all(destination).map_err(|e| CabinetError::Build {
      cabinet: item.cabinet.clone(),
      message: e.to_string(),
    })?;
    fs::write(&path, listing.join("\n")).map_err(|e| CabinetError::Build {
      cabinet: item.cabinet.clone(),
      message: e.to_string(),
    })?;
    Ok(path)
  }
}

fn file(output: &Output, id: &str) -> FileRow {
  FileRow::from_row(output.table(FILE).unwrap().find(&RowKey::single(id)).unwrap()).unwrap()
}

fn component_guid(output: &Output, id: &str) -> Option<String> {
  output
    .table(COMPONENT)
    .unwrap()
    .find(&RowKey::single(id))
    .unwrap()
    .get_str("ComponentId")
    .unwrap()
    .map(str::to_string)
}

fn config_in(temp: &TempDir) -> BindConfig {
  BindConfig {
    intermediate_dir: temp.path().join("obj"),
    cabinet_dir: temp.path().join("cab"),
    cabinet_threads: 2,
    ..BindConfig::default()
  }
}

#[test]
#[serial]
fn manual_media_product_binds_end_to_end() {
  let temp = TempDir::new().unwrap();
  let app = source_file(temp.path(), "app.exe", 10);
  let readme = source_file(temp.path(), "readme.txt", 20);

  let mut output = product(&[("app.exe", &app), ("readme.txt", &readme)]);
  add_media(&mut output, 1, "product.cab");
  compress_by_default(&mut output);

  let config = config_in(&temp);
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);
  let result = binder.bind_product(&mut output).unwrap();

  assert_eq!(result.assignment.mode, AssignmentMode::Manual);
  assert_eq!(result.generated_guids, 2);
  assert!(result.diagnostics.is_empty());

  let app_row = file(&output, "app.exe");
  let readme_row = file(&output, "readme.txt");
  assert_eq!(app_row.size_bytes, 10);
  assert_eq!(readme_row.size_bytes, 20);
  assert_eq!(app_row.sequence, Some(1));
  assert_eq!(readme_row.sequence, Some(2));
  assert_eq!(app_row.disk_id, Some(1));

  let media = MediaRow::from_row(output.table(MEDIA).unwrap().find(&RowKey::single(Value::Number(1))).unwrap()).unwrap();
  assert_eq!(media.last_sequence, 2);

  let expected = format_guid(&stable_id(&COMPONENT_GUID_NAMESPACE, "ProgramFilesFolder\\demo\\app.exe"));
  assert_eq!(component_guid(&output, "C_app.exe"), Some(expected));

  let outcomes = binder.build_cabinets(&ListingBuilder, &result.work_items).unwrap();
  assert_eq!(outcomes.len(), 1);
  let built = outcomes[0].result.as_ref().unwrap();
  assert_eq!(built, &temp.path().join("cab/product.cab"));
  assert_eq!(fs::read_to_string(built).unwrap(), "app.exe\nreadme.txt");
}

#[test]
#[serial]
fn component_guids_are_stable_across_binds() {
  let temp = TempDir::new().unwrap();
  let app = source_file(temp.path(), "app.exe", 4);
  let config = config_in(&temp);
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let mut guids = Vec::new();
  for _ in 0..2 {
    let mut output = product(&[("app.exe", &app)]);
    add_media(&mut output, 1, "product.cab");
    compress_by_default(&mut output);
    binder.bind_product(&mut output).unwrap();
    guids.push(component_guid(&output, "C_app.exe").unwrap());
  }

  assert_eq!(guids[0], guids[1]);
  assert!(guids[0].starts_with('{') && guids[0].ends_with('}'));
  assert_eq!(guids[0], guids[0].to_uppercase());
}

#[test]
#[serial]
fn missing_sources_fail_the_bind() {
  let temp = TempDir::new().unwrap();
  let missing = temp.path().join("gone.dll");
  let mut output = product(&[("gone.dll", &missing)]);
  add_media(&mut output, 1, "product.cab");

  let config = config_in(&temp);
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);
  match binder.bind_product(&mut output) {
    Err(BindError::AuthoringFailed { errors }) => {
      assert_eq!(errors.len(), 1);
      assert_eq!(errors[0].code, DiagnosticCode::FileNotFound);
    }
    other => panic!("expected authoring failure, got {:?}", other.map(|r| r.assignment)),
  }
}

fn templated_product(temp: &TempDir) -> Output {
  let sources: Vec<(String, PathBuf)> = (1..=3)
    .map(|i| {
      let name = format!("part{}.bin", i);
      let path = source_file(temp.path(), &name, 600 * 1024);
      (name, path)
    })
    .collect();
  let files: Vec<(&str, &Path)> = sources.iter().map(|(n, p)| (n.as_str(), p.as_path())).collect();

  let mut output = product(&files);
  compress_by_default(&mut output);
  let template = output.ensure_table(&media_template_table()).unwrap();
  template
    .create_row(vec![], None)
    .unwrap()
    .set("MaximumUncompressedMediaSize", Some(Value::Number(200)))
    .unwrap();
  output
}

#[test]
#[serial]
fn media_size_override_splits_cabinets() {
  let temp = TempDir::new().unwrap();
  let config = config_in(&temp);
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let mut authored = templated_product(&temp);
  let result = temp_env::with_var_unset("MSIBIND_MUMS", || binder.bind_product(&mut authored)).unwrap();
  assert_eq!(result.assignment.mode, AssignmentMode::Auto);
  assert_eq!(result.assignment.cabinets.len(), 1);

  let mut overridden = templated_product(&temp);
  let result = temp_env::with_var("MSIBIND_MUMS", Some("1"), || binder.bind_product(&mut overridden)).unwrap();
  let names: Vec<&str> = result.assignment.cabinets.iter().map(|c| c.cabinet.as_str()).collect();
  assert_eq!(names, vec!["cab1.cab", "cab2.cab", "cab3.cab"]);
  assert_eq!(output_media_count(&overridden), 3);
}

#[test]
#[serial]
fn invalid_media_size_override_is_rejected() {
  let temp = TempDir::new().unwrap();
  let config = config_in(&temp);
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let mut output = templated_product(&temp);
  let result = temp_env::with_var("MSIBIND_MUMS", Some("lots"), || binder.bind_product(&mut output));
  assert!(matches!(
    result,
    Err(BindError::Media(MediaError::InvalidOverride { .. }))
  ));
}

fn output_media_count(output: &Output) -> usize {
  output.table(MEDIA).map(|t| t.len()).unwrap_or(0)
}
