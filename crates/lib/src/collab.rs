//! File-level collaborators of the binder: metadata probing and byte
//! comparison.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata of a file as the binder records it in the `File` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
  pub size: u64,
  pub version: Option<String>,
  pub language: Option<String>,
}

#[derive(Debug, Error)]
pub enum FileAccessError {
  #[error("file not found: {0}")]
  NotFound(PathBuf),

  #[error("invalid path: {0}")]
  InvalidPath(String),

  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl FileAccessError {
  fn from_io(path: &Path, source: io::Error) -> Self {
    match source.kind() {
      io::ErrorKind::NotFound => FileAccessError::NotFound(path.to_path_buf()),
      io::ErrorKind::InvalidInput => FileAccessError::InvalidPath(path.display().to_string()),
      _ => FileAccessError::Io {
        path: path.to_path_buf(),
        source,
      },
    }
  }
}

pub trait FileProbe {
  fn stat(&self, path: &Path) -> Result<FileInfo, FileAccessError>;
}

pub trait FileComparator {
  fn files_equal(&self, a: &Path, b: &Path) -> Result<bool, FileAccessError>;
}

impl<F> FileProbe for F
where
  F: Fn(&Path) -> Result<FileInfo, FileAccessError>,
{
  fn stat(&self, path: &Path) -> Result<FileInfo, FileAccessError> {
    self(path)
  }
}

impl<F> FileComparator for F
where
  F: Fn(&Path, &Path) -> Result<bool, FileAccessError>,
{
  fn files_equal(&self, a: &Path, b: &Path) -> Result<bool, FileAccessError> {
    self(a, b)
  }
}

/// Probe and comparator backed by the local filesystem.
///
/// Sizes come from metadata. Version resources are not read, so `version`
/// and `language` are left for the caller to author.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileProbe for LocalFileSystem {
  fn stat(&self, path: &Path) -> Result<FileInfo, FileAccessError> {
    if path.as_os_str().is_empty() {
      return Err(FileAccessError::InvalidPath(String::new()));
    }
    let metadata = fs::metadata(path).map_err(|e| FileAccessError::from_io(path, e))?;
    if !metadata.is_file() {
      return Err(FileAccessError::InvalidPath(path.display().to_string()));
    }
    Ok(FileInfo {
      size: metadata.len(),
      version: None,
      language: None,
    })
  }
}

impl FileComparator for LocalFileSystem {
  fn files_equal(&self, a: &Path, b: &Path) -> Result<bool, FileAccessError> {
    let size_a = fs::metadata(a).map_err(|e| FileAccessError::from_io(a, e))?.len();
    let size_b = fs::metadata(b).map_err(|e| FileAccessError::from_io(b, e))?.len();
    if size_a != size_b {
      return Ok(false);
    }

    let mut reader_a = io::BufReader::new(fs::File::open(a).map_err(|e| FileAccessError::from_io(a, e))?);
    let mut reader_b = io::BufReader::new(fs::File::open(b).map_err(|e| FileAccessError::from_io(b, e))?);
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
      let read = reader_a.read(&mut buf_a).map_err(|e| FileAccessError::from_io(a, e))?;
      if read == 0 {
        return Ok(true);
      }
      reader_b
        .read_exact(&mut buf_b[..read])
        .map_err(|e| FileAccessError::from_io(b, e))?;
      if buf_a[..read] != buf_b[..read] {
        return Ok(false);
      }
    }
  }
}
