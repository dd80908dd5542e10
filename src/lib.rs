//! topng - Batch Image Converter
//!
//! Converts every image in a directory (optionally its whole tree) to PNG,
//! either in place or under a separate output directory that mirrors the
//! input layout. Files that are not images, or whose output already exists,
//! are skipped, so running the same conversion twice does nothing the
//! second time.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use topng::{BatchConverter, ConversionRequest, RunOptions};
//!
//! let request = ConversionRequest::new("photos")
//!     .output_root("png")
//!     .recursive(true);
//!
//! let summary = BatchConverter::new(request, RunOptions::new()).run()?;
//! println!("{} converted, {} failed", summary.converted, summary.failed);
//! # Ok::<(), topng::ConvertError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod processing;

// Re-export commonly used types
pub use batch::{BatchConverter, ConsoleSink, MemorySink, OutcomeSink, RunSummary};
pub use config::{ConversionRequest, RunOptions, TargetFormat};
pub use error::{ConvertError, Result};
pub use processing::{Codec, CodecCapabilities, FileOutcome, ImageCodec, SkipReason};

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Warning printed when AVIF files cannot be decoded
pub const AVIF_WARNING: &str =
    "Warning: AVIF support not available. AVIF files might not be supported.";

/// Initialize diagnostic logging on stderr.
///
/// `RUST_LOG` wins over `default_level` when set. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .is_ok()
    {
        info!("topng v{} initialized", VERSION);
    }
}

/// Check codec availability before any file is touched.
///
/// Fails if `target` cannot be encoded at all. A missing AVIF decoder only
/// produces a warning on `sink`; AVIF files then fail one by one.
pub fn check_codecs(target: TargetFormat, sink: &dyn OutcomeSink) -> Result<CodecCapabilities> {
    let capabilities = CodecCapabilities::detect();
    capabilities.ensure_target(target)?;

    if !capabilities.avif {
        sink.line(AVIF_WARNING);
    }

    debug!("Codec capabilities: {:?}", capabilities);
    Ok(capabilities)
}
