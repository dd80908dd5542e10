//! Codec adapter: decode an input file and re-encode it in the target format

use std::fs::{self, OpenOptions};
use std::io::{Cursor, ErrorKind, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::config::TargetFormat;
use crate::error::{ConvertError, ErrorContext, Result};
use crate::processing::formats::is_avif_path;

/// Anything that can turn one image file into another
pub trait Codec: Send + Sync {
    /// Convert `input` into a new file at `output`. Never overwrites.
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Decoder/encoder availability, detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecCapabilities {
    pub avif: bool,
}

impl CodecCapabilities {
    pub fn detect() -> Self {
        Self {
            avif: ImageFormat::Avif.reading_enabled(),
        }
    }

    /// Fail if the codec cannot write `target` at all
    pub fn ensure_target(&self, target: TargetFormat) -> Result<()> {
        if ImageFormat::from(target).writing_enabled() {
            Ok(())
        } else {
            Err(ConvertError::codec_unavailable(format!(
                "{} encoding is not compiled in",
                target.name()
            )))
        }
    }
}

/// Codec backed by the `image` crate
#[derive(Debug, Clone)]
pub struct ImageCodec {
    target: TargetFormat,
    capabilities: CodecCapabilities,
}

impl ImageCodec {
    pub fn new(target: TargetFormat, capabilities: CodecCapabilities) -> Self {
        Self {
            target,
            capabilities,
        }
    }

    fn decode(&self, input: &Path) -> Result<DynamicImage> {
        // Reject obvious non-images (archives, documents) with a clear reason
        if let Ok(Some(kind)) = infer::get_from_path(input) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ConvertError::unsupported_format(
                    format!("file content is {}, not an image", kind.mime_type()),
                    Some(input.to_path_buf()),
                ));
            }
        }

        let reader = ImageReader::open(input)
            .with_file_context(input.to_path_buf())?
            .with_guessed_format()
            .with_file_context(input.to_path_buf())?;

        let format = reader.format();
        debug!("Decoding {:?} as {:?}", input, format);

        let is_avif = format == Some(ImageFormat::Avif) || is_avif_path(input);
        if is_avif && !self.capabilities.avif {
            return Err(ConvertError::unsupported_format(
                "AVIF support not available (rebuild with the `avif` feature)",
                Some(input.to_path_buf()),
            ));
        }

        if format.is_none() {
            let detected = infer::get_from_path(input)
                .ok()
                .flatten()
                .map(|kind| kind.mime_type().to_string())
                .unwrap_or_else(|| "unrecognized content".to_string());
            return Err(ConvertError::unsupported_format(
                format!("no decoder available ({})", detected),
                Some(input.to_path_buf()),
            ));
        }

        Ok(reader.decode()?)
    }
}

impl Codec for ImageCodec {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let image = normalize_color(self.decode(input)?, self.target);

        let mut encoded = Cursor::new(Vec::new());
        image.write_to(&mut encoded, ImageFormat::from(self.target))?;

        write_new_file(output, encoded.get_ref())?;
        debug!("Wrote {} bytes to {:?}", encoded.get_ref().len(), output);
        Ok(())
    }
}

/// Keep transparency when the source has it and the target can carry it,
/// otherwise flatten to three-channel RGB.
pub fn normalize_color(image: DynamicImage, target: TargetFormat) -> DynamicImage {
    if image.color().has_alpha() && target.supports_alpha() {
        DynamicImage::ImageRgba8(image.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.into_rgb8())
    }
}

/// Write `bytes` to a file that must not exist yet; a failed write removes
/// the partial file.
fn write_new_file(output: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ConvertError::OutputExists(output.to_path_buf()),
            _ => ConvertError::path_io(output.to_path_buf(), e),
        })?;

    if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(output);
        return Err(ConvertError::path_io(output.to_path_buf(), e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn codec() -> ImageCodec {
        ImageCodec::new(TargetFormat::Png, CodecCapabilities::detect())
    }

    #[test]
    fn test_png_target_is_available() {
        assert!(CodecCapabilities::detect().ensure_target(TargetFormat::Png).is_ok());
    }

    #[test]
    fn test_normalize_keeps_alpha_for_png() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert_eq!(normalize_color(rgba, TargetFormat::Png).color(), ColorType::Rgba8);
    }

    #[test]
    fn test_normalize_flattens_alpha_for_jpeg() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert_eq!(normalize_color(rgba, TargetFormat::Jpeg).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_normalize_grayscale_to_rgb() {
        let gray = DynamicImage::new_luma8(3, 3);
        assert_eq!(normalize_color(gray, TargetFormat::Png).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_convert_jpeg_to_png() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jpg");
        let output = dir.path().join("in.png");
        RgbImage::from_pixel(4, 3, Rgb([200, 10, 10])).save(&input).unwrap();

        codec().convert(&input, &output).unwrap();

        let converted = image::open(&output).unwrap();
        assert_eq!(converted.dimensions(), (4, 3));
        assert_eq!(converted.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_convert_preserves_transparency() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("icon.webp");
        let output = dir.path().join("icon.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 128])).save(&input).unwrap();

        codec().convert(&input, &output).unwrap();

        let converted = image::open(&output).unwrap();
        assert_eq!(converted.color(), ColorType::Rgba8);
        assert_eq!(converted.to_rgba8().get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_corrupt_input_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.jpg");
        let output = dir.path().join("broken.png");
        fs::write(&input, b"definitely not a jpeg").unwrap();

        assert!(codec().convert(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_undecodable_allow_listed_format_fails() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("logo.svg");
        let output = dir.path().join("logo.png");
        fs::write(&input, b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let err = codec().convert(&input, &output).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_avif_support_is_reported() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("photo.avif");
        let output = dir.path().join("photo.png");
        fs::write(&input, b"not really avif").unwrap();

        let codec = ImageCodec::new(TargetFormat::Png, CodecCapabilities { avif: false });
        let err = codec.convert(&input, &output).unwrap_err();
        assert!(err.to_string().contains("AVIF support not available"));
    }

    #[test]
    fn test_existing_output_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.bmp");
        let output = dir.path().join("a.png");
        RgbImage::new(1, 1).save(&input).unwrap();
        fs::write(&output, b"keep me").unwrap();

        let err = codec().convert(&input, &output).unwrap_err();
        assert!(matches!(err, ConvertError::OutputExists(_)));
        assert_eq!(fs::read(&output).unwrap(), b"keep me");
    }
}
