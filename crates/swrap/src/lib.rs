//! Wraps a directory tree into a flat image for loaders that read fixed-size sectors.
//!
//! File contents are concatenated in traversal order, each padded with zeros
//! to the next [sector::SECTOR_SIZE] boundary, behind a one-sector header that
//! records the total payload size. Names and structure are not preserved.

pub mod builder;
pub mod error;
pub mod image;
pub mod prelude;
pub mod sector;
pub mod walker;
pub mod writer;

pub use builder::{build_image, ImageBuilder, ImageBuilderOptions};
pub use image::{verify, verify_path, BuildReport, ImageEntry, ImageHeader};
