mod cli;

fn main() -> Result<(), swrap::error::Error> {
  use swrap::{walker::WalkerOptions, ImageBuilder, ImageBuilderOptions};

  pretty_env_logger::init();

  match cli::parse().command {
    cli::Command::Create {
      directory,
      output,
      keep_partial,
      sorted,
      max_path_len,
    } => {
      let builder = ImageBuilder::new(ImageBuilderOptions {
        walker: WalkerOptions {
          max_path_len,
          sort_by_file_name: sorted,
        },
        remove_partial_output: !keep_partial,
      });

      let report = builder.build(&directory, &output)?;

      println!(
        "{}: {} files, {} payload bytes",
        output.display(),
        report.file_count(),
        report.payload_size
      );
    }
    cli::Command::Verify { image } => {
      let header = swrap::verify_path(&image)?;

      log::info!("Header matches {} payload sectors", header.payload_sectors());

      println!("{}: {} payload bytes", image.display(), header.payload_size);
    }
  }

  Ok(())
}
