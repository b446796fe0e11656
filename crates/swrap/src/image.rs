//! On-disk layout of a wrapped image and the out-of-band index produced while building one.
//!
//! ```text
//! 0x000  u64 LE   payload size in bytes, a multiple of SECTOR_SIZE
//! 0x008  [u8]     reserved, zero
//! 0x200  [u8]     file contents, each zero-padded to the next sector
//! ```

use super::prelude::*;
use crate::sector::{self, HEADER_SIZE};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
  io::{Read, Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

/// The meaningful part of the header sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
  pub payload_size: u64,
}

impl ImageHeader {
  pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
    let payload_size = reader
      .read_u64::<LittleEndian>()
      .map_err(|err| Error::invalid_image(format!("unable to read header: {err}")))?;

    Ok(Self { payload_size })
  }

  pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
    writer.write_u64::<LittleEndian>(self.payload_size)
  }

  pub fn payload_sectors(&self) -> u64 {
    sector::sectors(self.payload_size)
  }

  /// Expected length of the whole image, header sector included.
  pub fn image_size(&self) -> u64 {
    HEADER_SIZE + self.payload_size
  }
}

/// A file emitted into the payload region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
  /// Source the content was read from.
  pub path: PathBuf,
  /// Absolute offset of the first content byte within the image.
  pub offset: u64,
  /// Content length, excluding padding.
  pub length: u64,
}

impl ImageEntry {
  pub fn padded_length(&self) -> u64 {
    sector::align_up(self.length)
  }
}

/// Summary of a successful build. The image itself records none of this
/// beyond `payload_size`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub payload_size: u64,
  /// Emitted files, in traversal order.
  pub entries: Vec<ImageEntry>,
}

impl BuildReport {
  pub fn file_count(&self) -> usize {
    self.entries.len()
  }
}

/// Checks that the header of `image` describes exactly the payload that follows it.
pub fn verify<R: Read + Seek>(mut image: R) -> Result<ImageHeader> {
  let image_len = image
    .seek(SeekFrom::End(0))
    .map_err(|err| Error::invalid_image(format!("unable to size image: {err}")))?;

  if image_len < HEADER_SIZE {
    return Err(Error::invalid_image(format!(
      "image is {image_len} bytes, shorter than the {HEADER_SIZE} byte header"
    )));
  }

  image
    .seek(SeekFrom::Start(0))
    .map_err(|err| Error::invalid_image(format!("unable to rewind image: {err}")))?;

  let header = ImageHeader::read_from(&mut image)?;

  if sector::misalignment(header.payload_size) != 0 {
    return Err(Error::invalid_image(format!(
      "payload size {} is not sector aligned",
      header.payload_size
    )));
  }

  if header.image_size() != image_len {
    return Err(Error::invalid_image(format!(
      "header records {} payload bytes but image holds {}",
      header.payload_size,
      image_len - HEADER_SIZE
    )));
  }

  Ok(header)
}

pub fn verify_path(path: impl AsRef<Path>) -> Result<ImageHeader> {
  let path = path.as_ref();
  let file = std::fs::File::open(path).map_err(|source| Error::FileRead {
    path: path.to_path_buf(),
    source,
  })?;

  verify(file)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  fn image_with_header(payload_size: u64, payload_len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; HEADER_SIZE as usize + payload_len];
    bytes[..8].copy_from_slice(&payload_size.to_le_bytes());
    bytes
  }

  #[test]
  fn header_is_little_endian() {
    let mut bytes = vec![];
    ImageHeader { payload_size: 1536 }.write_to(&mut bytes).unwrap();

    assert_eq!(bytes, [0x00u8, 0x06, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
      ImageHeader::read_from(&bytes[..]).unwrap(),
      ImageHeader { payload_size: 1536 }
    );
  }

  #[test]
  fn verify_accepts_matching_header() {
    let header = verify(Cursor::new(image_with_header(1024, 1024))).unwrap();

    assert_eq!(header.payload_size, 1024);
    assert_eq!(header.payload_sectors(), 2);
  }

  #[test]
  fn verify_accepts_empty_payload() {
    let header = verify(Cursor::new(image_with_header(0, 0))).unwrap();
    assert_eq!(header.payload_size, 0);
  }

  #[test]
  fn verify_rejects_zero_header_over_payload() {
    let err = verify(Cursor::new(image_with_header(0, 512))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
  }

  #[test]
  fn verify_rejects_unaligned_header() {
    let err = verify(Cursor::new(image_with_header(100, 100))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
  }

  #[test]
  fn verify_rejects_truncated_image() {
    let err = verify(Cursor::new(vec![0u8; 8])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
  }
}
