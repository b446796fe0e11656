//! Sector alignment arithmetic shared by the writer and the image verifier.

/// Alignment unit of every offset in an image. Must be a power of two.
pub const SECTOR_SIZE: u64 = 512;

/// Length of the header region at the start of every image.
pub const HEADER_SIZE: u64 = SECTOR_SIZE;

const _: () = assert!(SECTOR_SIZE.is_power_of_two());

const SECTOR_MASK: u64 = SECTOR_SIZE - 1;

/// Rounds `value` up to the next sector boundary.
pub const fn align_up(value: u64) -> u64 {
  (value + SECTOR_MASK) & !SECTOR_MASK
}

/// Number of bytes `value` lies past the previous sector boundary.
pub const fn misalignment(value: u64) -> u64 {
  value & SECTOR_MASK
}

/// Zero bytes needed after `value` bytes to reach the next sector boundary.
/// Aligned values need no padding, never a full sector.
pub const fn padding_for(value: u64) -> u64 {
  match misalignment(value) {
    0 => 0,
    misalign => SECTOR_SIZE - misalign,
  }
}

/// Number of whole sectors needed to hold `size` bytes.
pub const fn sectors(size: u64) -> u64 {
  align_up(size) / SECTOR_SIZE
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn align_up_rounds_to_sector() {
    assert_eq!(align_up(0), 0);
    assert_eq!(align_up(1), 512);
    assert_eq!(align_up(512), 512);
    assert_eq!(align_up(513), 1024);
    assert_eq!(align_up(1536), 1536);
  }

  #[test]
  fn padding_is_never_a_full_sector() {
    assert_eq!(padding_for(0), 0);
    assert_eq!(padding_for(3), 509);
    assert_eq!(padding_for(600), 424);
    assert_eq!(padding_for(1024), 0);
    assert_eq!(padding_for(1023), 1);

    for value in [1u64, 77, 511, 4097, 1 << 40] {
      assert_eq!(misalignment(value + padding_for(value)), 0);
      assert!(padding_for(value) < SECTOR_SIZE);
    }
  }

  #[test]
  fn sectors_counts_partial_sectors() {
    assert_eq!(sectors(0), 0);
    assert_eq!(sectors(1), 1);
    assert_eq!(sectors(512), 1);
    assert_eq!(sectors(600), 2);
  }
}
