//! Logo decoding for PDF image XObjects.
//!
//! JPEG data is embedded untouched behind `/DCTDecode`. PNG data is
//! inflated, unfiltered and split into color samples plus an optional
//! alpha plane (drawn through an `/SMask`), then deflated again.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{ExportError, Result};
use crate::logo::{jpeg_info, ImageFormat, LogoImage, MAX_LOGO_DIMENSION};

/// Image samples ready to be wrapped in PDF stream objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// `DeviceGray`, `DeviceRGB` or `DeviceCMYK`.
    pub color_space: &'static str,
    /// `FlateDecode` or `DCTDecode`.
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Deflated 8-bit alpha plane, when the image has transparency.
    pub alpha: Option<Vec<u8>>,
}

pub(crate) fn decode_logo(logo: &LogoImage) -> Result<DecodedImage> {
    match logo.format() {
        ImageFormat::Jpeg => {
            let info = jpeg_info(logo.bytes())?;
            let color_space = match info.components {
                1 => "DeviceGray",
                3 => "DeviceRGB",
                4 => "DeviceCMYK",
                n => {
                    return Err(ExportError::Image(format!(
                        "unsupported JPEG component count {n}"
                    )))
                }
            };
            Ok(DecodedImage {
                width: info.width,
                height: info.height,
                color_space,
                filter: "DCTDecode",
                data: logo.bytes().to_vec(),
                alpha: None,
            })
        }
        ImageFormat::Png => decode_png(logo.bytes()),
    }
}

#[derive(Debug, Default)]
struct PngChunks<'a> {
    header: Option<&'a [u8]>,
    palette: Option<&'a [u8]>,
    transparency: Option<&'a [u8]>,
    data: Vec<u8>,
}

fn read_chunks(bytes: &[u8]) -> Result<PngChunks<'_>> {
    let mut chunks = PngChunks::default();
    let mut pos = 8;
    while let Some(len_bytes) = bytes.get(pos..pos + 4) {
        let len = <[u8; 4]>::try_from(len_bytes)
            .ok()
            .and_then(|b| usize::try_from(u32::from_be_bytes(b)).ok())
            .ok_or_else(|| ExportError::Image("PNG chunk too large".to_string()))?;
        let kind = bytes
            .get(pos + 4..pos + 8)
            .ok_or_else(|| ExportError::Image("truncated PNG chunk".to_string()))?;
        let body = bytes
            .get(pos + 8..)
            .and_then(|rest| rest.get(..len))
            .ok_or_else(|| ExportError::Image("truncated PNG chunk".to_string()))?;
        match kind {
            b"IHDR" => chunks.header = Some(body),
            b"PLTE" => chunks.palette = Some(body),
            b"tRNS" => chunks.transparency = Some(body),
            b"IDAT" => chunks.data.extend_from_slice(body),
            b"IEND" => break,
            _ => {}
        }
        // length + type + body + crc
        pos += 12 + len;
    }
    Ok(chunks)
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage> {
    let chunks = read_chunks(bytes)?;
    let header = chunks
        .header
        .filter(|h| h.len() >= 13)
        .ok_or_else(|| ExportError::Image("PNG is missing IHDR".to_string()))?;
    let be = |at: usize| -> u32 {
        header
            .get(at..at + 4)
            .and_then(|b| <[u8; 4]>::try_from(b).ok())
            .map_or(0, u32::from_be_bytes)
    };
    let width = be(0);
    let height = be(4);
    let depth = header.get(8).copied().unwrap_or(0);
    let color_type = header.get(9).copied().unwrap_or(0);
    let interlace = header.get(12).copied().unwrap_or(0);

    if interlace != 0 {
        return Err(ExportError::Image("interlaced PNG logos are not supported".to_string()));
    }
    let channels: usize = match color_type {
        0 | 3 => 1,
        2 => 3,
        4 => 2,
        6 => 4,
        other => {
            return Err(ExportError::Image(format!("unknown PNG color type {other}")));
        }
    };
    let depth_ok = match color_type {
        0 => matches!(depth, 1 | 2 | 4 | 8 | 16),
        3 => matches!(depth, 1 | 2 | 4 | 8),
        _ => matches!(depth, 8 | 16),
    };
    if !depth_ok {
        return Err(ExportError::Image(format!(
            "unsupported PNG bit depth {depth} for color type {color_type}"
        )));
    }

    if width == 0 || height == 0 || width > MAX_LOGO_DIMENSION || height > MAX_LOGO_DIMENSION {
        return Err(ExportError::Image(format!(
            "PNG dimensions {width}x{height} out of range"
        )));
    }
    let too_large = || ExportError::Image(format!("PNG {width}x{height} is too large"));
    let w = usize::try_from(width).map_err(|_| too_large())?;
    let h = usize::try_from(height).map_err(|_| too_large())?;
    let bits_per_pixel = channels * usize::from(depth);
    let stride = w.checked_mul(bits_per_pixel).ok_or_else(too_large)?.div_ceil(8);
    let expected = stride
        .checked_add(1)
        .and_then(|line| line.checked_mul(h))
        .ok_or_else(too_large)?;
    let pixels = w.checked_mul(h).ok_or_else(too_large)?;

    // Never inflate past what the header promises.
    let limit = u64::try_from(expected).map_err(|_| too_large())?;
    let mut raw = Vec::new();
    ZlibDecoder::new(chunks.data.as_slice())
        .take(limit)
        .read_to_end(&mut raw)
        .map_err(|e| ExportError::Image(format!("PNG image data is corrupt: {e}")))?;
    if raw.len() < expected {
        return Err(ExportError::Image(format!(
            "PNG image data is truncated ({} of {expected} bytes)",
            raw.len()
        )));
    }

    let filter_unit = bits_per_pixel.div_ceil(8).max(1);
    let scanlines = unfilter(&raw, stride, h, filter_unit)?;

    let mut color = Vec::with_capacity(pixels.saturating_mul(3));
    let mut alpha = Vec::with_capacity(pixels);
    let palette = chunks.palette.unwrap_or(&[]);
    let palette_alpha = chunks.transparency.unwrap_or(&[]);
    let color_space = if matches!(color_type, 0 | 4) { "DeviceGray" } else { "DeviceRGB" };

    for line in &scanlines {
        for px in 0..w {
            let at = |channel: usize| sample(line, px * channels + channel, depth);
            match color_type {
                0 => color.push(scale(at(0), depth)),
                2 => {
                    for c in 0..3 {
                        color.push(scale(at(c), depth));
                    }
                }
                3 => {
                    let index = usize::from(at(0));
                    let rgb = palette.get(index * 3..index * 3 + 3).ok_or_else(|| {
                        ExportError::Image(format!("PNG palette index {index} out of range"))
                    })?;
                    color.extend_from_slice(rgb);
                    alpha.push(palette_alpha.get(index).copied().unwrap_or(0xFF));
                }
                4 => {
                    color.push(scale(at(0), depth));
                    alpha.push(scale(at(1), depth));
                }
                _ => {
                    for c in 0..3 {
                        color.push(scale(at(c), depth));
                    }
                    alpha.push(scale(at(3), depth));
                }
            }
        }
    }

    let has_alpha = alpha.iter().any(|&a| a != 0xFF);
    Ok(DecodedImage {
        width,
        height,
        color_space,
        filter: "FlateDecode",
        data: deflate(&color)?,
        alpha: if has_alpha { Some(deflate(&alpha)?) } else { None },
    })
}

/// Reverse PNG per-scanline filtering.
fn unfilter(raw: &[u8], stride: usize, rows: usize, bpp: usize) -> Result<Vec<Vec<u8>>> {
    let mut out: Vec<Vec<u8>> = Vec::with_capacity(rows);
    let mut previous = vec![0u8; stride];
    for row in 0..rows {
        let start = row * (stride + 1);
        let filter = *raw
            .get(start)
            .ok_or_else(|| ExportError::Image("PNG image data is truncated".to_string()))?;
        let mut line = raw
            .get(start + 1..start + 1 + stride)
            .ok_or_else(|| ExportError::Image("PNG image data is truncated".to_string()))?
            .to_vec();
        for i in 0..stride {
            let left = if i >= bpp { line.get(i - bpp).copied().unwrap_or(0) } else { 0 };
            let up = previous.get(i).copied().unwrap_or(0);
            let up_left = if i >= bpp { previous.get(i - bpp).copied().unwrap_or(0) } else { 0 };
            let predictor = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => u8::try_from((u16::from(left) + u16::from(up)) / 2).unwrap_or(0),
                4 => paeth(left, up, up_left),
                other => {
                    return Err(ExportError::Image(format!("unknown PNG filter type {other}")));
                }
            };
            if let Some(byte) = line.get_mut(i) {
                *byte = byte.wrapping_add(predictor);
            }
        }
        previous.clone_from(&line);
        out.push(line);
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Read sample `index` of a scanline packed at `depth` bits per sample.
fn sample(line: &[u8], index: usize, depth: u8) -> u16 {
    match depth {
        16 => {
            let hi = line.get(index * 2).copied().unwrap_or(0);
            let lo = line.get(index * 2 + 1).copied().unwrap_or(0);
            u16::from_be_bytes([hi, lo])
        }
        8 => u16::from(line.get(index).copied().unwrap_or(0)),
        _ => {
            let bits = usize::from(depth);
            let bit = index * bits;
            let byte = line.get(bit / 8).copied().unwrap_or(0);
            let shift = 8 - bits - bit % 8;
            let mask = (1u16 << bits) - 1;
            (u16::from(byte) >> shift) & mask
        }
    }
}

/// Scale a sample of `depth` bits to 8 bits.
fn scale(value: u16, depth: u8) -> u8 {
    let scaled = match depth {
        16 => value >> 8,
        8 => value,
        d => value * 255 / ((1u16 << d) - 1),
    };
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::test_support::{encode_png, png_with_header};

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_rgb_png_has_no_alpha() {
        let png = encode_png(2, 1, 2, &[255, 0, 0, 0, 0, 255]);
        let logo = LogoImage::from_bytes(png).unwrap();
        let decoded = decode_logo(&logo).unwrap();
        assert_eq!(decoded.color_space, "DeviceRGB");
        assert!(decoded.alpha.is_none());
        assert_eq!(inflate(&decoded.data), vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_rgba_png_splits_alpha() {
        let png = encode_png(1, 2, 6, &[10, 20, 30, 0, 40, 50, 60, 255]);
        let decoded = decode_logo(&LogoImage::from_bytes(png).unwrap()).unwrap();
        assert_eq!(inflate(&decoded.data), vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(inflate(&decoded.alpha.unwrap()), vec![0, 255]);
    }

    #[test]
    fn test_truncated_png_data_is_an_error() {
        // Header within bounds, but the image data covers a single byte
        let png = png_with_header(4000, 4000, 16, 6, &deflate(&[0]).unwrap());
        let result = decode_png(&png);
        assert!(matches!(result, Err(ExportError::Image(_))), "{result:?}");

        let png = png_with_header(4000, 4000, 16, 6, &[0; 8]);
        assert!(matches!(decode_png(&png), Err(ExportError::Image(_))));

        let png = png_with_header(0x7FFF_FFFF, 0x7FFF_FFFF, 16, 6, &[0; 8]);
        assert!(matches!(decode_png(&png), Err(ExportError::Image(_))));
    }

    #[test]
    fn test_unfilter_sub_and_up() {
        // Row 0 uses Sub, row 1 uses Up; one byte per pixel
        let raw = [1, 5, 1, 1, 2, 1, 1, 1];
        let lines = unfilter(&raw, 3, 2, 1).unwrap();
        assert_eq!(lines[0], vec![5, 6, 7]);
        assert_eq!(lines[1], vec![6, 7, 8]);
    }

    #[test]
    fn test_sub_byte_samples() {
        // 0b1011_0001 read as 2-bit samples: 2, 3, 0, 1
        let line = [0b1011_0001];
        let samples: Vec<u16> = (0..4).map(|i| sample(&line, i, 2)).collect();
        assert_eq!(samples, vec![2, 3, 0, 1]);
        assert_eq!(scale(3, 2), 255);
        assert_eq!(scale(0xABCD, 16), 0xAB);
    }
}
