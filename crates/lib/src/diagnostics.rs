//! Diagnostic sink shared by the bind passes.
//!
//! Row-scoped and authoring problems are collected here instead of aborting
//! the bind, so a single bad row does not hide other problems. Every entry is
//! also emitted through `tracing` when it is recorded.
//!
//! The binder refuses to hand results to persistence while the sink holds
//! any error; warnings never block.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Location in authored source that produced a row or chain entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLineNumber {
  pub file: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line: Option<u32>,
}

impl SourceLineNumber {
  pub fn new(file: impl Into<String>, line: Option<u32>) -> Self {
    Self {
      file: file.into(),
      line,
    }
  }
}

impl fmt::Display for SourceLineNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.line {
      Some(line) => write!(f, "{}({})", self.file, line),
      None => write!(f, "{}", self.file),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Warning,
  Error,
}

/// Stable identifiers for every diagnostic the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
  // media
  DuplicateCabinetName,
  MissingMedia,
  ExpectedMediaCabinet,
  // component guids
  IllegalComponentWithAutoGeneratedGuid,
  IllegalGroupForGeneratedId,
  IllegalPathForGeneratedId,
  // file access
  FileNotFound,
  FileAccess,
  FileTooLarge,
  DefaultLanguageForCompanion,
  // transforms
  InvalidSummaryValue,
  // chain
  DiscardedRollbackBoundary,
}

impl fmt::Display for DiagnosticCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub severity: Severity,
  pub code: DiagnosticCode,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let severity = match self.severity {
      Severity::Warning => "warning",
      Severity::Error => "error",
    };
    if let Some(location) = &self.location {
      write!(f, "{}: {} {}: {}", location, severity, self.code, self.message)
    } else {
      write!(f, "{} {}: {}", severity, self.code, self.message)
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
  entries: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn error(&mut self, code: DiagnosticCode, location: Option<&SourceLineNumber>, message: impl Into<String>) {
    let message = message.into();
    error!(code = %code, location = ?location, "{}", message);
    self.entries.push(Diagnostic {
      severity: Severity::Error,
      code,
      message,
      location: location.cloned(),
    });
  }

  pub fn warning(&mut self, code: DiagnosticCode, location: Option<&SourceLineNumber>, message: impl Into<String>) {
    let message = message.into();
    warn!(code = %code, location = ?location, "{}", message);
    self.entries.push(Diagnostic {
      severity: Severity::Warning,
      code,
      message,
      location: location.cloned(),
    });
  }

  pub fn has_errors(&self) -> bool {
    self.entries.iter().any(|d| d.severity == Severity::Error)
  }

  pub fn error_count(&self) -> usize {
    self.entries.iter().filter(|d| d.severity == Severity::Error).count()
  }

  pub fn warning_count(&self) -> usize {
    self.entries.iter().filter(|d| d.severity == Severity::Warning).count()
  }

  /// Number of entries carrying `code`, regardless of severity.
  pub fn count_of(&self, code: DiagnosticCode) -> usize {
    self.entries.iter().filter(|d| d.code == code).count()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.entries.iter()
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.entries.iter().filter(|d| d.severity == Severity::Error)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.entries.iter().filter(|d| d.severity == Severity::Warning)
  }

  pub fn into_vec(self) -> Vec<Diagnostic> {
    self.entries
  }
}
