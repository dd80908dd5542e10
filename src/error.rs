//! Error types and handling for topng

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for topng operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for topng operations
#[derive(Debug, Error)]
pub enum ConvertError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// I/O error tied to a specific file or directory
    #[error("I/O error on {path:?}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decode or encode errors from the image codec
    #[error("{0}")]
    ImageError(#[from] image::ImageError),

    /// Input root missing or not a directory
    #[error("Input directory {path:?} is not usable: {message}")]
    InputDirectory { path: PathBuf, message: String },

    /// Codec cannot produce the requested output format at all
    #[error("Image codec unavailable: {message}")]
    CodecUnavailable { message: String },

    /// File content is not something the codec can decode
    #[error("Unsupported image format: {format} (file: {file:?})")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// Output file appeared between planning and writing
    #[error("Output file already exists: {0:?}")]
    OutputExists(PathBuf),

    /// Invalid run parameters
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Worker pool errors
    #[error("Worker pool error: {message}")]
    PoolError { message: String },
}

impl ConvertError {
    /// Create a new input directory error
    pub fn input_directory<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::InputDirectory {
            path,
            message: message.into(),
        }
    }

    /// Create a new codec unavailable error
    pub fn codec_unavailable<S: Into<String>>(message: S) -> Self {
        Self::CodecUnavailable {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new worker pool error
    pub fn pool<S: Into<String>>(message: S) -> Self {
        Self::PoolError {
            message: message.into(),
        }
    }

    /// Create a new I/O error for `path`
    pub fn path_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::PathIo { path, source }
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ConvertError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let error: ConvertError = e.into();
            match error {
                ConvertError::IoError(source) => ConvertError::PathIo { path: file, source },
                ConvertError::UnsupportedFormat { format, file: None } => {
                    ConvertError::UnsupportedFormat {
                        format,
                        file: Some(file),
                    }
                }
                other => other,
            }
        })
    }
}
