//! topng CLI - Batch Image Converter
//!
//! Converts every image in a directory to PNG (or another target format),
//! skipping unsupported files and outputs that already exist.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use console::style;
use tracing::debug;

use topng::{
    check_codecs, init, BatchConverter, ConsoleSink, ConversionRequest, ImageCodec, RunOptions,
    TargetFormat,
};

/// topng - Batch Image Converter
#[derive(Parser, Debug)]
#[command(
    name = "topng",
    version,
    about = "Convert images to PNG format",
    long_about = "Converts every supported image in a directory to PNG. Files whose output \
                  already exists are skipped, so repeated runs only convert new images."
)]
struct Cli {
    /// Directory containing images to convert
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory to save converted images
    #[arg(short, long, value_name = "PATH")]
    output_dir: Option<PathBuf>,

    /// Process subdirectories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "png", value_name = "FORMAT")]
    format: CliTargetFormat,

    /// Number of worker threads (0 = one per CPU core)
    #[arg(short = 'j', long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Show what would be converted without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// CLI-compatible target format enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliTargetFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
    Bmp,
    Gif,
}

impl From<CliTargetFormat> for TargetFormat {
    fn from(format: CliTargetFormat) -> Self {
        match format {
            CliTargetFormat::Png => TargetFormat::Png,
            CliTargetFormat::Jpeg => TargetFormat::Jpeg,
            CliTargetFormat::Webp => TargetFormat::WebP,
            CliTargetFormat::Tiff => TargetFormat::Tiff,
            CliTargetFormat::Bmp => TargetFormat::Bmp,
            CliTargetFormat::Gif => TargetFormat::Gif,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    init(log_level);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("Arguments: {:?}", cli);

    let target = TargetFormat::from(cli.format);
    let sink = Arc::new(ConsoleSink);
    let capabilities = check_codecs(target, sink.as_ref())?;

    let mut request = ConversionRequest::new(cli.input_dir)
        .recursive(cli.recursive)
        .target(target);
    if let Some(output_dir) = cli.output_dir {
        request = request.output_root(output_dir);
    }

    let mut options = RunOptions::new().dry_run(cli.dry_run).json(cli.json);
    if let Some(threads) = cli.threads {
        options = options.threads(threads);
    }

    BatchConverter::new(request, options)
        .with_codec(Arc::new(ImageCodec::new(target, capabilities)))
        .with_sink(sink)
        .run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["topng", "photos", "-o", "out", "-r", "-j", "4"]).unwrap();
        assert_eq!(cli.input_dir, PathBuf::from("photos"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(cli.recursive);
        assert_eq!(cli.threads, Some(4));
        assert!(matches!(cli.format, CliTargetFormat::Png));
    }

    #[test]
    fn test_input_dir_is_required() {
        assert!(Cli::try_parse_from(["topng"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["topng", "in", "-v", "-q"]).is_err());
    }
}
