//! Logo images embedded in report banners.
//!
//! The logo arrives either as raw file bytes or as a `data:` URL (the form
//! browsers hand out after reading a fetched blob). Only the container is
//! inspected here; decoding for the PDF writer lives in `pdf::image`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ExportError, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Largest accepted logo width or height, in pixels.
pub const MAX_LOGO_DIMENSION: u32 = 8192;

/// Image container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension used inside the workbook package.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// An encoded logo with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl LogoImage {
    /// Identify a PNG or JPEG from its leading bytes and read its size.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (format, width, height) = if bytes.starts_with(&PNG_SIGNATURE) {
            let (w, h) = png_dimensions(&bytes)?;
            (ImageFormat::Png, w, h)
        } else if bytes.starts_with(&[0xFF, 0xD8]) {
            let info = jpeg_info(&bytes)?;
            (ImageFormat::Jpeg, info.width, info.height)
        } else {
            return Err(ExportError::Image(
                "unrecognized image data (expected PNG or JPEG)".to_string(),
            ));
        };
        if width == 0 || height == 0 {
            return Err(ExportError::Image(format!(
                "image has empty dimensions {width}x{height}"
            )));
        }
        if width > MAX_LOGO_DIMENSION || height > MAX_LOGO_DIMENSION {
            return Err(ExportError::Image(format!(
                "image {width}x{height} exceeds {MAX_LOGO_DIMENSION} pixels per side"
            )));
        }
        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }

    /// Decode a `data:image/...;base64,` URL, or a bare base64 payload.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let payload = match url.trim().split_once(',') {
            Some((meta, data)) if meta.starts_with("data:") => {
                if !meta.ends_with(";base64") {
                    return Err(ExportError::Image(
                        "data URL is not base64 encoded".to_string(),
                    ));
                }
                data
            }
            Some(_) => {
                return Err(ExportError::Image("malformed data URL".to_string()));
            }
            None => url.trim(),
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ExportError::Image(format!("invalid base64 payload: {e}")))?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let slice = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([
        *slice.first()?,
        *slice.get(1)?,
        *slice.get(2)?,
        *slice.get(3)?,
    ]))
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.get(at)?, *bytes.get(at + 1)?]))
}

/// Width and height from the IHDR chunk, which must come first.
fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.get(12..16) != Some(b"IHDR".as_slice()) {
        return Err(ExportError::Image("PNG is missing its IHDR chunk".to_string()));
    }
    let width = be_u32(bytes, 16);
    let height = be_u32(bytes, 20);
    width
        .zip(height)
        .ok_or_else(|| ExportError::Image("truncated PNG header".to_string()))
}

/// Frame information from a JPEG start-of-frame segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

/// Walk JPEG segments until a SOFn marker is found.
pub(crate) fn jpeg_info(bytes: &[u8]) -> Result<JpegInfo> {
    let truncated = || ExportError::Image("truncated JPEG".to_string());
    let mut pos = 2;
    loop {
        // Skip fill bytes between segments
        while bytes.get(pos) == Some(&0xFF) && bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&0xFF) {
            return Err(ExportError::Image("corrupt JPEG marker".to_string()));
        }
        let marker = *bytes.get(pos + 1).ok_or_else(truncated)?;
        pos += 2;
        match marker {
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => {
                return Err(ExportError::Image(
                    "JPEG has no frame header before scan data".to_string(),
                ));
            }
            _ => {}
        }
        let len = usize::from(be_u16(bytes, pos).ok_or_else(truncated)?);
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let height = be_u16(bytes, pos + 3).ok_or_else(truncated)?;
            let width = be_u16(bytes, pos + 5).ok_or_else(truncated)?;
            let components = *bytes.get(pos + 7).ok_or_else(truncated)?;
            return Ok(JpegInfo {
                width: u32::from(width),
                height: u32::from(height),
                components,
            });
        }
        if len < 2 {
            return Err(ExportError::Image("corrupt JPEG segment length".to_string()));
        }
        pos += len;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    /// IHDR-only PNG prefix; enough for dimension sniffing.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_png_dimensions() {
        let logo = LogoImage::from_bytes(png_header(120, 80)).unwrap();
        assert_eq!(logo.format(), ImageFormat::Png);
        assert_eq!((logo.width(), logo.height()), (120, 80));
    }

    #[test]
    fn test_oversized_logo_is_rejected() {
        let result = LogoImage::from_bytes(png_header(0x7FFF_FFFF, 0x7FFF_FFFF));
        assert!(matches!(result, Err(ExportError::Image(_))));
        let result = LogoImage::from_bytes(png_header(MAX_LOGO_DIMENSION + 1, 10));
        assert!(matches!(result, Err(ExportError::Image(_))));
        assert!(LogoImage::from_bytes(png_header(MAX_LOGO_DIMENSION, 10)).is_ok());
    }

    #[test]
    fn test_jpeg_dimensions() {
        let bytes = vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0 with two payload bytes
            0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03, 0, 0, 0, // SOF0
        ];
        let logo = LogoImage::from_bytes(bytes).unwrap();
        assert_eq!(logo.format(), ImageFormat::Jpeg);
        assert_eq!((logo.width(), logo.height()), (64, 32));
    }

    #[test]
    fn test_data_url_roundtrip() {
        let encoded = STANDARD.encode(png_header(2, 3));
        let logo = LogoImage::from_data_url(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!((logo.width(), logo.height()), (2, 3));

        let bare = LogoImage::from_data_url(&encoded).unwrap();
        assert_eq!(bare, logo);
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = LogoImage::from_bytes(b"GIF89a....".to_vec()).unwrap_err();
        assert!(matches!(err, ExportError::Image(_)));
    }
}
