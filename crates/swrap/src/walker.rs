//! Depth-first discovery of the files that make up an image.

use super::prelude::*;
use std::{ffi::OsStr, path::Path};
use walkdir::{DirEntry, WalkDir};

/// Longest joined path, in bytes, the walker accepts by default.
pub const DEFAULT_MAX_PATH_LEN: usize = 255;

/// Receiver of the entries discovered by a [Walker].
pub trait FileSink {
  /// Called with the full path of every regular file, in traversal order.
  fn append_file(&mut self, path: &Path) -> Result<()>;

  /// Called before the contents of a directory are visited.
  fn enter_directory(&mut self, _path: &Path) -> Result<()> {
    Ok(())
  }
}

impl<S: FileSink + ?Sized> FileSink for &mut S {
  fn append_file(&mut self, path: &Path) -> Result<()> {
    (**self).append_file(path)
  }

  fn enter_directory(&mut self, path: &Path) -> Result<()> {
    (**self).enter_directory(path)
  }
}

#[derive(Debug, Clone)]
pub struct WalkerOptions {
  /// Joined paths longer than this are rejected with [Error::PathTooLong].
  pub max_path_len: usize,
  /// Visit siblings in file name order instead of directory listing order.
  pub sort_by_file_name: bool,
}

impl Default for WalkerOptions {
  fn default() -> Self {
    Self {
      max_path_len: DEFAULT_MAX_PATH_LEN,
      sort_by_file_name: false,
    }
  }
}

/// Pre-order, depth-first traversal of a directory tree.
///
/// * Entries whose name starts with `.` are skipped, along with everything below them.
/// * Regular files are handed to the sink, directories are descended into before their siblings.
/// * Symlinks, devices, fifos and sockets are neither followed nor emitted.
///
/// Sibling order is whatever the directory listing yields unless
/// [WalkerOptions::sort_by_file_name] is set. The first error aborts the walk.
#[derive(Debug, Clone, Default)]
pub struct Walker {
  options: WalkerOptions,
}

impl Walker {
  pub fn new(options: WalkerOptions) -> Self {
    Self { options }
  }

  pub fn walk<S>(&self, directory: impl AsRef<Path>, sink: &mut S) -> Result<()>
  where
    S: FileSink + ?Sized,
  {
    let directory = directory.as_ref();

    if !directory.is_dir() {
      return Err(Error::Configuration(format!(
        "not a directory: {}",
        directory.display()
      )));
    }

    let mut walkdir = WalkDir::new(directory).min_depth(1).follow_links(false);

    if self.options.sort_by_file_name {
      walkdir = walkdir.sort_by_file_name();
    }

    let entries = walkdir
      .into_iter()
      .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in entries {
      let entry = entry.map_err(|err| Error::traversal(directory, err))?;
      let path = entry.path();

      if path.as_os_str().len() > self.options.max_path_len {
        return Err(Error::PathTooLong {
          path: path.to_path_buf(),
          max: self.options.max_path_len,
        });
      }

      let file_type = entry.file_type();

      if file_type.is_dir() {
        log::info!("[d] {}", path.display());
        sink.enter_directory(path)?;
      } else if file_type.is_file() {
        log::info!("[f] {}", path.display());
        sink.append_file(path)?;
      } else {
        log::debug!("Ignoring non-regular entry: {}", path.display());
      }
    }

    Ok(())
  }
}

/// Walks `directory` with default options.
pub fn walk<S>(directory: impl AsRef<Path>, sink: &mut S) -> Result<()>
where
  S: FileSink + ?Sized,
{
  Walker::default().walk(directory, sink)
}

fn is_hidden(entry: &DirEntry) -> bool {
  is_hidden_name(entry.file_name())
}

/// Names starting with `.` are never visited.
pub(crate) fn is_hidden_name(name: &OsStr) -> bool {
  name.as_encoded_bytes().first() == Some(&b'.')
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[derive(Default)]
  struct Recorder {
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
  }

  impl FileSink for Recorder {
    fn append_file(&mut self, path: &Path) -> Result<()> {
      self.files.push(path.to_path_buf());
      Ok(())
    }

    fn enter_directory(&mut self, path: &Path) -> Result<()> {
      self.dirs.push(path.to_path_buf());
      Ok(())
    }
  }

  #[test]
  fn rejects_missing_directory() {
    let mut recorder = Recorder::default();
    let err = walk("/nonexistent/swrap-walker-input", &mut recorder).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(recorder.files.is_empty());
  }

  #[test]
  fn walks_own_sources_in_name_order() {
    let walker = Walker::new(WalkerOptions {
      max_path_len: 4096,
      sort_by_file_name: true,
    });
    let mut recorder = Recorder::default();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");

    walker.walk(&src, &mut recorder).unwrap();

    assert!(recorder.dirs.is_empty());
    assert!(recorder.files.contains(&src.join("walker.rs")));

    let mut sorted = recorder.files.clone();
    sorted.sort();
    assert_eq!(recorder.files, sorted);
  }
}
