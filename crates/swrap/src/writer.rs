//! Sector packing of file contents into an image.

use super::prelude::*;
use crate::{
  image::{BuildReport, ImageEntry, ImageHeader},
  sector::{self, HEADER_SIZE, SECTOR_SIZE},
  walker::FileSink,
};
use std::{
  io::{Read, Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

/// Size of the buffer file contents are streamed through.
const CHUNK_SIZE: usize = 64 * 1024;

static ZERO_SECTOR: [u8; SECTOR_SIZE as usize] = [0; SECTOR_SIZE as usize];

/// Appends file contents to `storage`, keeping every entry sector aligned.
///
/// The header sector is reserved as zeros on construction and only filled in
/// by [ImageWriter::finalize], so an abandoned image never carries a header
/// that matches its payload.
///
/// A read or write failure part way through an entry leaves bytes in
/// `storage` that no entry accounts for. The writer is then poisoned and
/// refuses further appends and finalization.
pub struct ImageWriter<Storage> {
  storage: Storage,
  /// Name of the output, for error reporting.
  target: PathBuf,
  /// Payload bytes written so far, padding included.
  total_bytes: u64,
  entries: Vec<ImageEntry>,
  chunk: Vec<u8>,
  poisoned: bool,
}

impl<Storage> ImageWriter<Storage>
where
  Storage: Write + Seek,
{
  pub fn new(mut storage: Storage, target: impl Into<PathBuf>) -> Result<Self> {
    let target = target.into();

    storage
      .seek(SeekFrom::Start(0))
      .and_then(|_| storage.write_all(&ZERO_SECTOR))
      .map_err(|source| Error::FileWrite {
        path: target.clone(),
        source,
      })?;

    Ok(Self {
      storage,
      target,
      total_bytes: 0,
      entries: vec![],
      chunk: vec![0; CHUNK_SIZE],
      poisoned: false,
    })
  }

  /// Payload bytes written so far. Always sector aligned between appends.
  pub fn total_bytes(&self) -> u64 {
    self.total_bytes
  }

  pub fn entries(&self) -> &[ImageEntry] {
    &self.entries
  }

  pub fn is_poisoned(&self) -> bool {
    self.poisoned
  }

  /// Streams the file at `path` into the image.
  ///
  /// The handle is released before returning, on success or failure.
  pub fn append_file(&mut self, path: impl AsRef<Path>) -> Result<&ImageEntry> {
    let path = path.as_ref();
    self.ensure_usable()?;

    let file = std::fs::File::open(path).map_err(|source| Error::FileRead {
      path: path.to_path_buf(),
      source,
    })?;

    self.append_reader(path, file)
  }

  /// Streams everything `reader` yields into the image, recording it under `path`.
  pub fn append_reader(
    &mut self,
    path: impl AsRef<Path>,
    reader: impl Read,
  ) -> Result<&ImageEntry> {
    let path = path.as_ref();
    self.ensure_usable()?;

    let offset = HEADER_SIZE + self.total_bytes;
    let length = match self.stream(path, reader) {
      Ok(length) => length,
      Err(err) => {
        self.poisoned = true;
        return Err(err);
      }
    };

    log::debug!(
      "Packed {} bytes at offset {:#x}: {}",
      length,
      offset,
      path.display()
    );

    self.entries.push(ImageEntry {
      path: path.to_path_buf(),
      offset,
      length,
    });

    Ok(&self.entries[self.entries.len() - 1])
  }

  /// Copies `reader` to the end of the image and pads it, returning the unpadded length.
  fn stream(&mut self, path: &Path, mut reader: impl Read) -> Result<u64> {
    let mut length = 0u64;

    loop {
      let read = match reader.read(&mut self.chunk) {
        Ok(0) => break,
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
        Err(source) => {
          return Err(Error::FileRead {
            path: path.to_path_buf(),
            source,
          })
        }
      };

      self
        .storage
        .write_all(&self.chunk[..read])
        .map_err(|source| Error::FileWrite {
          path: self.target.clone(),
          source,
        })?;

      length += read as u64;
    }

    self.total_bytes += length;
    self.pad_to_sector()?;

    Ok(length)
  }

  /// Writes the payload size into the header and flushes the image.
  pub fn finalize(mut self) -> Result<(Storage, BuildReport)> {
    self.ensure_usable()?;

    let header = ImageHeader {
      payload_size: sector::align_up(self.total_bytes),
    };

    self.pad_to_sector()?;

    self
      .storage
      .seek(SeekFrom::Start(0))
      .and_then(|_| header.write_to(&mut self.storage))
      .and_then(|_| self.storage.flush())
      .map_err(|source| Error::FileWrite {
        path: self.target.clone(),
        source,
      })?;

    log::info!(
      "Wrote {} files, {} payload bytes ({} sectors) to {}",
      self.entries.len(),
      header.payload_size,
      header.payload_sectors(),
      self.target.display()
    );

    let report = BuildReport {
      payload_size: header.payload_size,
      entries: self.entries,
    };

    Ok((self.storage, report))
  }

  fn ensure_usable(&self) -> Result<()> {
    if self.poisoned {
      return Err(Error::FileWrite {
        path: self.target.clone(),
        source: std::io::Error::other("an earlier append failed part way through"),
      });
    }

    Ok(())
  }

  fn pad_to_sector(&mut self) -> Result<()> {
    let padding = sector::padding_for(self.total_bytes);

    if padding == 0 {
      return Ok(());
    }

    self
      .storage
      .write_all(&ZERO_SECTOR[..padding as usize])
      .map_err(|source| Error::FileWrite {
        path: self.target.clone(),
        source,
      })?;

    self.total_bytes += padding;

    Ok(())
  }
}

impl<Storage> FileSink for ImageWriter<Storage>
where
  Storage: Write + Seek,
{
  fn append_file(&mut self, path: &Path) -> Result<()> {
    ImageWriter::append_file(self, path).map(|_| ())
  }
}
