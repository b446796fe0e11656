use std::path::{Path, PathBuf};

/// Coarse classification of an [Error], for callers that only care about
/// which stage of a build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Configuration,
  Traversal,
  FileRead,
  FileWrite,
  InvalidImage,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Configuration error: {0}")]
  Configuration(String),
  #[error("Failed to traverse {}: {source}", path.display())]
  Traversal {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
  #[error("Path exceeds {max} bytes: {}", path.display())]
  PathTooLong { path: PathBuf, max: usize },
  #[error("Failed to read {}: {source}", path.display())]
  FileRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to write image {}: {source}", path.display())]
  FileWrite {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Invalid image: {reason}")]
  InvalidImage { reason: String },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Configuration(_) => ErrorKind::Configuration,
      Error::Traversal { .. } | Error::PathTooLong { .. } => ErrorKind::Traversal,
      Error::FileRead { .. } => ErrorKind::FileRead,
      Error::FileWrite { .. } => ErrorKind::FileWrite,
      Error::InvalidImage { .. } => ErrorKind::InvalidImage,
    }
  }

  /// The path that caused the error, if any.
  pub fn path(&self) -> Option<&Path> {
    match self {
      Error::Configuration(_) | Error::InvalidImage { .. } => None,
      Error::Traversal { path, .. }
      | Error::PathTooLong { path, .. }
      | Error::FileRead { path, .. }
      | Error::FileWrite { path, .. } => Some(path),
    }
  }

  pub(crate) fn traversal(root: &Path, source: walkdir::Error) -> Self {
    let path = source
      .path()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| root.to_path_buf());
    Error::Traversal { path, source }
  }

  pub(crate) fn invalid_image(reason: impl Into<String>) -> Self {
    Error::InvalidImage {
      reason: reason.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_follow_stage() {
    let read = Error::FileRead {
      path: PathBuf::from("in/a.bin"),
      source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    };
    assert_eq!(read.kind(), ErrorKind::FileRead);
    assert_eq!(read.path(), Some(Path::new("in/a.bin")));

    let long = Error::PathTooLong {
      path: PathBuf::from("deep"),
      max: 4,
    };
    assert_eq!(long.kind(), ErrorKind::Traversal);

    let config = Error::Configuration("missing input".into());
    assert_eq!(config.kind(), ErrorKind::Configuration);
    assert!(config.path().is_none());
  }
}
