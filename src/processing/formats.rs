//! Extension allow-list and format mapping

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::config::TargetFormat;

/// Input extensions eligible for conversion, lower-cased with the leading dot
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".jfif", ".pjpeg", ".pjp", // JPEG
    ".png",
    ".gif",
    ".webp",
    ".tiff", ".tif",
    ".bmp",
    ".ico", ".cur",
    ".avif",
    ".heic", ".heif",
    ".jp2", ".j2k", ".jpx", ".jpf", // JPEG 2000
    ".svg",
    ".ppm", ".pgm", ".pbm", // Netpbm
];

static ALLOW_LIST: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SUPPORTED_EXTENSIONS.iter().copied().collect());

/// Result of running a path through the extension filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    Convert,
    SkipUnsupported,
}

/// Lower-cased extension of `path` including the leading dot, or an empty
/// string when the file name has none
pub fn extension_of<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Classify a candidate path by its extension
pub fn classify<P: AsRef<Path>>(path: P) -> ExtensionClass {
    classify_extension(&extension_of(path))
}

/// Classify an extension as produced by [`extension_of`]
pub fn classify_extension(extension: &str) -> ExtensionClass {
    if !extension.is_empty() && ALLOW_LIST.contains(extension) {
        ExtensionClass::Convert
    } else {
        ExtensionClass::SkipUnsupported
    }
}

/// Whether the path names an AVIF file
pub fn is_avif_path<P: AsRef<Path>>(path: P) -> bool {
    extension_of(path) == ".avif"
}

/// Convert our TargetFormat to image crate format
impl From<TargetFormat> for image::ImageFormat {
    fn from(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Png => image::ImageFormat::Png,
            TargetFormat::Jpeg => image::ImageFormat::Jpeg,
            TargetFormat::WebP => image::ImageFormat::WebP,
            TargetFormat::Tiff => image::ImageFormat::Tiff,
            TargetFormat::Bmp => image::ImageFormat::Bmp,
            TargetFormat::Gif => image::ImageFormat::Gif,
        }
    }
}
