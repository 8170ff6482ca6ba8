//! Bind passes over a linked output.
//!
//! Each pass collects authoring problems in a [`Diagnostics`] sink and only
//! returns a result when the sink holds no errors.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cabinet::{self, CabinetBuilder, CabinetError, CabinetOutcome, CabinetWorkItem};
use crate::chain::{ChainDocument, ChainError, ChainPlan, ChainPlanner};
use crate::collab::{FileAccessError, FileComparator, FileProbe};
use crate::config::{BindConfig, ConfigError};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::guid::{ComponentGuidGenerator, GuidError};
use crate::media::{self, MediaAssigner, MediaAssignment, MediaError};
use crate::persist::{self, PersistError};
use crate::table::definitions::FILE;
use crate::table::views::FileRow;
use crate::table::{Output, OutputKind, RowKey, SchemaError, Value};
use crate::transform::{TransformDiffEngine, TransformError, TransformPair};

#[derive(Debug, Error)]
pub enum BindError {
  #[error("binding failed with {} error(s)", errors.len())]
  AuthoringFailed { errors: Vec<Diagnostic> },

  #[error("cannot bind a {actual:?} output here")]
  UnexpectedKind { actual: OutputKind },

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Schema(#[from] SchemaError),

  #[error(transparent)]
  Guid(#[from] GuidError),

  #[error(transparent)]
  Media(#[from] MediaError),

  #[error(transparent)]
  Transform(#[from] TransformError),

  #[error(transparent)]
  Chain(#[from] ChainError),

  #[error(transparent)]
  Persist(#[from] PersistError),

  #[error(transparent)]
  Cabinet(#[from] CabinetError),
}

/// Result of binding a product or merge module.
#[derive(Debug)]
pub struct ProductBind {
  pub assignment: MediaAssignment,
  pub work_items: Vec<CabinetWorkItem>,
  pub generated_guids: usize,
  pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct PatchBind {
  pub pairs: Vec<(String, TransformPair)>,
  pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct BundleBind {
  pub plan: ChainPlan,
  pub diagnostics: Diagnostics,
}

pub struct Binder<'a> {
  config: &'a BindConfig,
  probe: &'a dyn FileProbe,
  comparator: &'a dyn FileComparator,
}

impl<'a> Binder<'a> {
  pub fn new(config: &'a BindConfig, probe: &'a dyn FileProbe, comparator: &'a dyn FileComparator) -> Self {
    Self {
      config,
      probe,
      comparator,
    }
  }

  /// Refresh file metadata, generate component GUIDs, assign media and
  /// sequence files. `output` is updated in place.
  pub fn bind_product(&self, output: &mut Output) -> Result<ProductBind, BindError> {
    if !matches!(output.kind, OutputKind::Product | OutputKind::Module) {
      return Err(BindError::UnexpectedKind { actual: output.kind });
    }

    let mut diagnostics = Diagnostics::new();
    let probed = self.refresh_files(output, &mut diagnostics)?;
    let generated_guids = ComponentGuidGenerator::default().generate(output, &mut diagnostics)?;

    let budget_override = media::override_from_env()?;
    let assigner = MediaAssigner::new(self.config.default_compressed, budget_override);
    let assignment = assigner.assign(output, &mut diagnostics)?;
    media::sequence_files(output)?;

    finish(&diagnostics)?;

    let work_items = cabinet::work_items(output, &assignment)?;
    info!(
      files = assignment.file_count(),
      probed,
      cabinets = work_items.len(),
      guids = generated_guids,
      "bound product"
    );
    Ok(ProductBind {
      assignment,
      work_items,
      generated_guids,
      diagnostics,
    })
  }

  /// Build the cabinets of a bound product into the configured cabinet directory.
  pub fn build_cabinets(
    &self,
    builder: &dyn CabinetBuilder,
    items: &[CabinetWorkItem],
  ) -> Result<Vec<CabinetOutcome>, BindError> {
    let outcomes = cabinet::build_cabinets(builder, items, &self.config.cabinet_dir, self.config.cabinet_threads)?;
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
      warn!(failed, total = outcomes.len(), "some cabinets failed to build");
    }
    Ok(outcomes)
  }

  /// Synthesize the snapshots of a single transform.
  pub fn bind_transform(&self, transform: &Output) -> Result<(TransformPair, Diagnostics), BindError> {
    let empty = persist::ensure_empty_placeholder(&self.config.intermediate_dir)?;
    let engine = self.diff_engine(&empty);
    let mut diagnostics = Diagnostics::new();
    let pair = engine.diff(transform, &mut diagnostics)?;
    finish(&diagnostics)?;
    Ok((pair, diagnostics))
  }

  /// Synthesize the snapshots of every transform in a patch.
  pub fn bind_patch(&self, patch: &Output) -> Result<PatchBind, BindError> {
    let empty = persist::ensure_empty_placeholder(&self.config.intermediate_dir)?;
    let engine = self.diff_engine(&empty);
    let mut diagnostics = Diagnostics::new();
    let pairs = engine.diff_patch(patch, &mut diagnostics)?;
    finish(&diagnostics)?;
    info!(transforms = pairs.len(), "bound patch");
    Ok(PatchBind { pairs, diagnostics })
  }

  /// Plan the package chain of a bundle.
  pub fn bind_bundle(&self, document: &ChainDocument) -> Result<BundleBind, BindError> {
    let mut diagnostics = Diagnostics::new();
    let plan = ChainPlanner::new().plan(document, &mut diagnostics)?;
    finish(&diagnostics)?;
    Ok(BundleBind { plan, diagnostics })
  }

  fn diff_engine<'e>(&'e self, empty: &Path) -> TransformDiffEngine<'e> {
    TransformDiffEngine::new(self.comparator, empty).carry_identity_rows(!self.config.suppress_identity_rows)
  }

  /// Update size, version and language of every file with a source path.
  /// Returns how many files were probed successfully.
  fn refresh_files(&self, output: &mut Output, diagnostics: &mut Diagnostics) -> Result<usize, BindError> {
    let Some(table) = output.table(FILE) else {
      return Ok(0);
    };
    let files = table.iter().map(FileRow::from_row).collect::<Result<Vec<_>, _>>()?;

    let mut updates = Vec::new();
    for file in &files {
      let companion = file
        .version
        .as_deref()
        .filter(|version| files.iter().any(|f| f.file_id == *version));
      if let Some(companion) = companion
        && file.language.is_some()
      {
        diagnostics.warning(
          DiagnosticCode::DefaultLanguageForCompanion,
          file.location.as_ref(),
          format!(
            "file '{}' is a companion of '{}'; its authored language is kept and not probed from the file",
            file.file_id, companion
          ),
        );
      }

      let Some(source) = file.source_path.as_deref() else {
        continue;
      };
      match self.probe.stat(Path::new(source)) {
        Ok(info) => match i64::try_from(info.size).ok().filter(|s| *s <= i64::from(i32::MAX)) {
          // Companion files keep their authored version and language.
          Some(size) if companion.is_some() => updates.push((file.file_id.clone(), size, None, None)),
          Some(size) => updates.push((file.file_id.clone(), size, info.version, info.language)),
          None => diagnostics.error(
            DiagnosticCode::FileTooLarge,
            file.location.as_ref(),
            format!("file '{}' is {} bytes, larger than a package can hold", source, info.size),
          ),
        },
        Err(FileAccessError::NotFound(path)) => diagnostics.error(
          DiagnosticCode::FileNotFound,
          file.location.as_ref(),
          format!("file '{}' of '{}' was not found", path.display(), file.file_id),
        ),
        Err(e) => diagnostics.error(
          DiagnosticCode::FileAccess,
          file.location.as_ref(),
          format!("cannot read file '{}' of '{}': {}", source, file.file_id, e),
        ),
      }
    }

    let probed = updates.len();
    if let Some(table) = output.table_mut(FILE) {
      for (file_id, size, version, language) in updates {
        let Some(mut row) = table.find_mut(&RowKey::single(file_id)) else {
          continue;
        };
        row.set("FileSize", Some(Value::Number(size)))?;
        if let Some(version) = version {
          row.set("Version", Some(Value::String(version)))?;
        }
        if let Some(language) = language {
          row.set("Language", Some(Value::String(language)))?;
        }
      }
    }
    debug!(probed, "refreshed file metadata");
    Ok(probed)
  }
}

fn finish(diagnostics: &Diagnostics) -> Result<(), BindError> {
  if diagnostics.has_errors() {
    return Err(BindError::AuthoringFailed {
      errors: diagnostics.errors().cloned().collect(),
    });
  }
  Ok(())
}
