//! Canonical directory paths for identifier generation.

use std::collections::{HashMap, HashSet};

use crate::table::definitions::DIRECTORY;
use crate::table::views::DirectoryRow;
use crate::table::Output;

use super::GuidError;

/// Well-known directories. Each canonicalizes to its own id.
pub const STANDARD_DIRECTORIES: &[&str] = &[
  "AdminToolsFolder",
  "AppDataFolder",
  "CommonAppDataFolder",
  "CommonFiles64Folder",
  "CommonFilesFolder",
  "DesktopFolder",
  "FavoritesFolder",
  "FontsFolder",
  "LocalAppDataFolder",
  "MyPicturesFolder",
  "NetHoodFolder",
  "PersonalFolder",
  "PrintHoodFolder",
  "ProgramFiles64Folder",
  "ProgramFilesFolder",
  "ProgramMenuFolder",
  "RecentFolder",
  "SendToFolder",
  "StartMenuFolder",
  "StartupFolder",
  "System16Folder",
  "System64Folder",
  "SystemFolder",
  "TARGETDIR",
  "TempFolder",
  "TemplateFolder",
  "WindowsFolder",
  "WindowsVolume",
];

const VOLATILE_ROOTS: &[&str] = &[
  "MyPicturesFolder",
  "CommonFilesFolder",
  "CommonFiles64Folder",
  "StartupFolder",
  "FontsFolder",
  "TARGETDIR",
];

const VOLATILE_PREFIXES: &[&str] = &[
  "PersonalFolder\\my pictures",
  "ProgramFilesFolder\\common files",
  "ProgramMenuFolder\\startup",
  "StartMenuFolder\\programs",
  "WindowsFolder\\fonts",
];

pub fn is_standard_directory(id: &str) -> bool {
  STANDARD_DIRECTORIES.contains(&id)
}

/// Whether a canonical path sits under a root whose location differs between
/// machines, making a path-derived identifier unsafe.
pub fn is_volatile_path(path: &str) -> bool {
  let under = |prefix: &str| {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('\\'))
  };
  VOLATILE_ROOTS.iter().any(|root| under(*root)) || VOLATILE_PREFIXES.iter().any(|prefix| under(*prefix))
}

/// Resolves directory ids to canonical paths, memoizing each result.
#[derive(Debug, Default)]
pub struct DirectoryResolver {
  directories: HashMap<String, DirectoryRow>,
  resolved: HashMap<String, String>,
}

impl DirectoryResolver {
  pub fn from_output(output: &Output) -> Result<Self, GuidError> {
    let mut directories = HashMap::new();
    if let Some(table) = output.table(DIRECTORY) {
      for row in table.iter() {
        let directory = DirectoryRow::from_row(row)?;
        directories.insert(directory.directory.clone(), directory);
      }
    }
    Ok(Self {
      directories,
      resolved: HashMap::new(),
    })
  }

  pub fn len(&self) -> usize {
    self.directories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.directories.is_empty()
  }

  /// Canonical path of `id`. `referenced_by` names the row asking, for errors.
  ///
  /// Standard directories and authored roots resolve to their id. Any other
  /// directory is its parent's path joined with `\` and its lower-cased long
  /// target name; a name of `.` adds nothing.
  pub fn resolve(&mut self, id: &str, referenced_by: &str) -> Result<String, GuidError> {
    if let Some(path) = self.resolved.get(id) {
      return Ok(path.clone());
    }

    // Walk up to the first ancestor with a known path.
    let mut chain: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = id.to_string();
    let mut requester = referenced_by.to_string();
    let base = loop {
      if let Some(path) = self.resolved.get(&current) {
        break path.clone();
      }
      if is_standard_directory(&current) {
        break current.clone();
      }
      if !seen.insert(current.clone()) {
        return Err(GuidError::DirectoryCycle { directory: current });
      }

      let Some(row) = self.directories.get(&current) else {
        return Err(GuidError::UnresolvedDirectory {
          directory: current,
          referenced_by: requester,
        });
      };
      if row.is_root() {
        break current.clone();
      }

      chain.push(current.clone());
      requester = current.clone();
      current = row.parent.clone().unwrap_or_default();
    };

    self.resolved.insert(current, base.clone());

    let mut path = base;
    for directory in chain.into_iter().rev() {
      if let Some(row) = self.directories.get(&directory) {
        let name = row.target_name();
        if name != "." {
          path.push('\\');
          path.push_str(&name.to_lowercase());
        }
      }
      self.resolved.insert(directory, path.clone());
    }

    Ok(path)
  }
}
