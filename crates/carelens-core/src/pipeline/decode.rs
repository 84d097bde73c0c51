//! Image decoding with content-based format detection.

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader, RgbImage};
use image::ImageDecoder as _;
use serde::Serialize;
use std::io::Cursor;

use crate::error::PipelineError;

/// Color layout of the image as it was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    Other,
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            _ => ColorMode::Other,
        }
    }
}

/// A decoded image, normalized to 8-bit RGB.
///
/// Dimensions and color mode describe the source encoding; `pixels` holds the
/// normalized copy used by the heuristics and the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color layout of the source encoding
    pub color_mode: ColorMode,
    /// Detected image format, when the header was recognized
    pub format: Option<ImageFormat>,
    /// RGB pixel buffer
    pub pixels: RgbImage,
}

/// What the file header says, read without touching pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub color_mode: ColorMode,
    pub format: ImageFormat,
}

/// Decodes raw bytes into a [`DecodedImage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    /// Read dimensions and color layout from the header only.
    ///
    /// No allocation limits apply here, so a header claiming huge dimensions
    /// still reports them and the caller can reject on size.
    pub fn read_header(bytes: &[u8]) -> Result<ImageHeader, PipelineError> {
        let (mut reader, format) = Self::reader(bytes)?;
        reader.no_limits();
        let decoder = reader.into_decoder().map_err(|e| PipelineError::Decode {
            message: e.to_string(),
        })?;
        let (width, height) = decoder.dimensions();

        Ok(ImageHeader {
            width,
            height,
            color_mode: ColorMode::from(decoder.color_type()),
            format,
        })
    }

    /// Decode an image from an in-memory byte buffer.
    ///
    /// The format is guessed from content, never from a file name.
    pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
        let (reader, format) = Self::reader(bytes)?;
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            message: e.to_string(),
        })?;

        Ok(Self::from_dynamic(image, Some(format)))
    }

    fn reader(bytes: &[u8]) -> Result<(ImageReader<Cursor<&[u8]>>, ImageFormat), PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::Decode {
                message: "empty image data".to_string(),
            });
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                message: format!("Cannot detect image format: {e}"),
            })?;

        match reader.format() {
            Some(format) => Ok((reader, format)),
            None => Err(PipelineError::UnsupportedFormat {
                format: "unknown".to_string(),
            }),
        }
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage, format: Option<ImageFormat>) -> DecodedImage {
        let (width, height) = image.dimensions();
        let color_mode = ColorMode::from(image.color());
        let pixels = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
        DecodedImage {
            width,
            height,
            color_mode,
            format,
            pixels,
        }
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: Option<ImageFormat>) -> String {
    match format {
        Some(ImageFormat::Jpeg) => "jpeg".to_string(),
        Some(ImageFormat::Png) => "png".to_string(),
        Some(ImageFormat::WebP) => "webp".to_string(),
        Some(ImageFormat::Gif) => "gif".to_string(),
        Some(ImageFormat::Tiff) => "tiff".to_string(),
        Some(ImageFormat::Bmp) => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    /// A small gray PNG whose IHDR claims `width`x`height`, with a valid CRC.
    ///
    /// The pixel data still covers the original 200x200 image, so only a
    /// header read succeeds.
    pub(crate) fn png_claiming(width: u32, height: u32) -> Vec<u8> {
        let gray = GrayImage::from_fn(200, 200, |x, _| Luma([(x % 200) as u8]));
        let mut bytes = png_bytes(&DynamicImage::ImageLuma8(gray));
        assert_eq!(&bytes[12..16], b"IHDR");
        bytes[16..20].copy_from_slice(&width.to_be_bytes());
        bytes[20..24].copy_from_slice(&height.to_be_bytes());
        let crc = crc32(&bytes[12..29]);
        bytes[29..33].copy_from_slice(&crc.to_be_bytes());
        bytes
    }

    #[test]
    fn test_read_header_skips_pixel_data() {
        let header = ImageDecoder::read_header(&png_claiming(40_000, 40_000)).unwrap();
        assert_eq!((header.width, header.height), (40_000, 40_000));
        assert_eq!(header.color_mode, ColorMode::Grayscale);
        assert_eq!(header.format, ImageFormat::Png);
    }

    #[test]
    fn test_read_header_rejects_garbage() {
        assert!(matches!(
            ImageDecoder::read_header(b"not an image at all"),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
        assert!(ImageDecoder::read_header(&[]).is_err());
    }

    #[test]
    fn test_decode_grayscale_png() {
        let gray = GrayImage::from_pixel(120, 80, Luma([90]));
        let bytes = png_bytes(&DynamicImage::ImageLuma8(gray));

        let decoded = ImageDecoder::decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.width, 120);
        assert_eq!(decoded.height, 80);
        assert_eq!(decoded.color_mode, ColorMode::Grayscale);
        assert_eq!(decoded.format, Some(ImageFormat::Png));
        assert_eq!(decoded.pixels.get_pixel(0, 0).0, [90, 90, 90]);
    }

    #[test]
    fn test_decode_empty_bytes() {
        let err = ImageDecoder::decode_bytes(&[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let err = ImageDecoder::decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decode_truncated_png() {
        let gray = GrayImage::from_pixel(64, 64, Luma([10]));
        let bytes = png_bytes(&DynamicImage::ImageLuma8(gray));
        let err = ImageDecoder::decode_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_format_to_string() {
        assert_eq!(format_to_string(Some(ImageFormat::Jpeg)), "jpeg");
        assert_eq!(format_to_string(Some(ImageFormat::Png)), "png");
        assert_eq!(format_to_string(None), "unknown");
    }
}
