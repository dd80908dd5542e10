//! Run configuration for topng
//!
//! There is no configuration file: everything here is built once from the
//! command line (or through the builder methods by library callers) and is
//! read-only for the rest of the run.

use std::path::PathBuf;

use crate::error::{ConvertError, Result};

/// What to convert and where the results go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Directory scanned for candidate files
    pub input_root: PathBuf,

    /// Destination root; `None` converts in place
    pub output_root: Option<PathBuf>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Format every converted file is written as
    pub target: TargetFormat,
}

impl ConversionRequest {
    /// Create a request converting `input_root` in place, non-recursively, to PNG
    pub fn new<P: Into<PathBuf>>(input_root: P) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: None,
            recursive: false,
            target: TargetFormat::Png,
        }
    }

    /// Write results under `output_root` instead of next to the inputs
    pub fn output_root<P: Into<PathBuf>>(mut self, output_root: P) -> Self {
        self.output_root = Some(output_root.into());
        self
    }

    /// Enable or disable recursive descent
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the target format
    pub fn target(mut self, target: TargetFormat) -> Self {
        self.target = target;
        self
    }
}

/// Execution knobs that do not change what gets converted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Worker count; `None` runs sequentially, `Some(0)` uses every core
    pub threads: Option<usize>,

    /// Plan every file without writing anything
    pub dry_run: bool,

    /// Emit the summary as a JSON object
    pub json: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Enable dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Emit the summary as JSON
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Number of workers the run will actually use
    pub fn worker_count(&self) -> usize {
        match self.threads {
            None => 1,
            Some(0) => num_cpus::get().max(1),
            Some(n) => n,
        }
    }

    /// Validate options
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.threads {
            let cores = num_cpus::get().max(1);
            if threads > cores * 8 {
                return Err(ConvertError::invalid_parameters(format!(
                    "Thread count {} is unreasonably high for {} CPU cores",
                    threads, cores
                )));
            }
        }
        Ok(())
    }
}

/// Output formats a run can target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
    Tiff,
    Bmp,
    Gif,
}

impl TargetFormat {
    /// File extension written for this format, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
        }
    }

    /// Whether the encoder can keep an alpha channel
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::WebP => "WebP",
            Self::Tiff => "TIFF",
            Self::Bmp => "BMP",
            Self::Gif => "GIF",
        }
    }
}
