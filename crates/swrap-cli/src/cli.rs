use clap::*;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Wrap a directory into a sector aligned image.
  Create {
    /// Input directory.
    #[arg(short = 'i', long = "input")]
    directory: PathBuf,
    /// Output image.
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Leave the partially written image behind if the build fails.
    #[arg(long)]
    keep_partial: bool,
    /// Visit directory entries in file name order for reproducible images.
    #[arg(long)]
    sorted: bool,
    /// Reject input paths longer than this many bytes.
    #[arg(long, default_value_t = swrap::walker::DEFAULT_MAX_PATH_LEN)]
    max_path_len: usize,
  },
  /// Check that an image header matches its payload.
  Verify { image: PathBuf },
}

#[derive(Debug, Parser)]
#[command(name = "swrap", version, about = "Wrap a directory in a sector friendly image", long_about = None)]
pub struct Cli {
  #[clap(subcommand)]
  pub command: Command,
}

pub fn parse() -> Cli {
  Cli::parse()
}
