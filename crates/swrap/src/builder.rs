//! High-level interface for wrapping a directory into an image file.

use super::prelude::*;
use crate::{
  image::BuildReport,
  walker::{self, Walker, WalkerOptions},
  writer::ImageWriter,
};
use std::{
  fs::File,
  io::BufWriter,
  path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct ImageBuilderOptions {
  pub walker: WalkerOptions,
  /// Delete the output file when a build fails part way through.
  pub remove_partial_output: bool,
}

impl Default for ImageBuilderOptions {
  fn default() -> Self {
    Self {
      walker: WalkerOptions::default(),
      remove_partial_output: true,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct ImageBuilder {
  options: ImageBuilderOptions,
}

impl ImageBuilder {
  pub fn new(options: ImageBuilderOptions) -> Self {
    Self { options }
  }

  /// Packs every visible regular file under `input_dir` into `output_path`.
  ///
  /// Any traversal, read or write error aborts the build. The output is then
  /// removed, or left with a zeroed header if
  /// [ImageBuilderOptions::remove_partial_output] is unset.
  pub fn build(
    &self,
    input_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
  ) -> Result<BuildReport> {
    let input_dir = input_dir.as_ref();
    let output_path = output_path.as_ref();

    check_paths(input_dir, output_path)?;

    log::info!(
      "Wrapping {} into {}",
      input_dir.display(),
      output_path.display()
    );

    let file = File::create(output_path).map_err(|source| Error::FileWrite {
      path: output_path.to_path_buf(),
      source,
    })?;

    let result = self.pack(input_dir, output_path, file);

    if let Err(err) = &result {
      log::error!("Build failed: {err}");

      if self.options.remove_partial_output {
        remove_partial(output_path);
      }
    }

    result
  }

  fn pack(&self, input_dir: &Path, output_path: &Path, file: File) -> Result<BuildReport> {
    let mut writer = ImageWriter::new(BufWriter::new(file), output_path)?;

    Walker::new(self.options.walker.clone()).walk(input_dir, &mut writer)?;

    let (_, report) = writer.finalize()?;

    Ok(report)
  }
}

/// Builds an image with default options.
pub fn build_image(
  input_dir: impl AsRef<Path>,
  output_path: impl AsRef<Path>,
) -> Result<BuildReport> {
  ImageBuilder::default().build(input_dir, output_path)
}

fn check_paths(input_dir: &Path, output_path: &Path) -> Result<()> {
  if input_dir.as_os_str().is_empty() {
    return Err(Error::Configuration("expected input directory".into()));
  }

  if output_path.as_os_str().is_empty() {
    return Err(Error::Configuration("expected output file".into()));
  }

  if !input_dir.is_dir() {
    return Err(Error::Configuration(format!(
      "input is not a directory: {}",
      input_dir.display()
    )));
  }

  if output_path.is_dir() {
    return Err(Error::Configuration(format!(
      "output is a directory: {}",
      output_path.display()
    )));
  }

  // The image would otherwise be packed into itself.
  if is_visible_within(output_path, input_dir) {
    return Err(Error::Configuration(format!(
      "output {} lies inside input directory {}",
      output_path.display(),
      input_dir.display()
    )));
  }

  Ok(())
}

/// Whether the walker would reach `output_path` while traversing `input_dir`.
fn is_visible_within(output_path: &Path, input_dir: &Path) -> bool {
  let parent = match output_path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  };

  let (Ok(parent), Ok(input_dir)) = (parent.canonicalize(), input_dir.canonicalize()) else {
    return false;
  };

  let Ok(relative) = parent.strip_prefix(&input_dir) else {
    return false;
  };

  relative
    .iter()
    .chain(output_path.file_name())
    .all(|name| !walker::is_hidden_name(name))
}

fn remove_partial(output_path: &Path) {
  match std::fs::remove_file(output_path) {
    Ok(()) => log::warn!("Removed partial image {}", output_path.display()),
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
    Err(err) => log::warn!(
      "Unable to remove partial image {}: {}",
      output_path.display(),
      err
    ),
  }
}
