//! Patch binds: transform snapshots and their persistence.

use tempfile::TempDir;

use msibind_lib::binder::{BindError, Binder};
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::consts::EMPTY_FILE_NAME;
use msibind_lib::persist;
use msibind_lib::table::definitions::{PROPERTY, summary_information_table};
use msibind_lib::table::{Output, OutputKind, RowKey, SubStorage, Value};
use msibind_lib::transform::TransformError;

use super::common::{modified_property, never_equal};

fn property(output: &Output, name: &str) -> Option<String> {
  output
    .table(PROPERTY)?
    .find(&RowKey::single(name))?
    .get_str("Value")
    .unwrap()
    .map(str::to_string)
}

fn transform(version_from: &str, version_to: &str) -> Output {
  let mut transform = Output::new(OutputKind::Transform);
  modified_property(&mut transform, "ProductVersion", version_from, version_to);
  let summary = transform.ensure_table(&summary_information_table()).unwrap();
  summary
    .create_row(vec![Value::Number(16)], None)
    .unwrap()
    .set("Value", Some(Value::string("31")))
    .unwrap();
  transform
}

fn patch(storages: Vec<(&str, Output)>) -> Output {
  let mut patch = Output::new(OutputKind::Patch);
  patch.sub_storages = storages
    .into_iter()
    .map(|(name, data)| SubStorage {
      name: name.to_string(),
      data,
    })
    .collect();
  patch
}

#[test]
fn patch_transforms_are_diffed_and_persisted() {
  let temp = TempDir::new().unwrap();
  let config = BindConfig {
    intermediate_dir: temp.path().join("obj"),
    ..BindConfig::default()
  };
  let comparator = LocalFileSystem;
  let binder = Binder::new(&config, &LocalFileSystem, &comparator);

  let result = binder
    .bind_patch(&patch(vec![("RTM.1", transform("1.0.0", "1.1.0"))]))
    .unwrap();
  assert_eq!(result.pairs.len(), 1);
  let (name, pair) = &result.pairs[0];
  assert_eq!(name, "RTM.1");
  assert_eq!(pair.validation_flags, Some(31));
  assert_eq!(property(&pair.updated, "ProductVersion").as_deref(), Some("1.1.0"));
  assert_ne!(property(&pair.target, "ProductVersion"), property(&pair.updated, "ProductVersion"));
  assert!(temp.path().join("obj").join(EMPTY_FILE_NAME).exists());

  let out = temp.path().join("transforms").join(name);
  let (target_path, updated_path) = persist::save_transform_pair(&out, pair).unwrap();
  assert!(persist::load_output(&target_path).unwrap().same_content(&pair.target));
  assert!(persist::load_output(&updated_path).unwrap().same_content(&pair.updated));
}

#[test]
fn unchanged_transform_names_its_sub_storage() {
  let temp = TempDir::new().unwrap();
  let config = BindConfig {
    intermediate_dir: temp.path().join("obj"),
    ..BindConfig::default()
  };
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let mut unchanged = Output::new(OutputKind::Transform);
  modified_property(&mut unchanged, "Manufacturer", "Acme", "Acme");

  let result = binder.bind_patch(&patch(vec![("RTM.1", transform("1.0", "2.0")), ("RTM.2", unchanged)]));
  match result {
    Err(BindError::Transform(TransformError::SubStorage { name, source })) => {
      assert_eq!(name, "RTM.2");
      assert!(matches!(*source, TransformError::NoDifferences));
    }
    other => panic!("expected sub-storage failure, got {:?}", other.map(|r| r.pairs.len())),
  }
}

#[test]
fn products_are_not_transforms() {
  let temp = TempDir::new().unwrap();
  let config = BindConfig {
    intermediate_dir: temp.path().join("obj"),
    ..BindConfig::default()
  };
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);
  assert!(matches!(
    binder.bind_transform(&Output::new(OutputKind::Product)),
    Err(BindError::Transform(TransformError::WrongKind { .. }))
  ));
}
