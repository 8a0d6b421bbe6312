//! Fixtures shared by unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], body: &[u8]) {
    out.extend_from_slice(&u32::try_from(body.len()).unwrap().to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    // CRC is not verified by the decoder
    out.extend_from_slice(&[0, 0, 0, 0]);
}

/// Build an unfiltered 8-bit PNG of `color_type` from raw pixel bytes.
pub(crate) fn encode_png(width: u32, height: u32, color_type: u8, pixels: &[u8]) -> Vec<u8> {
    let channels = match color_type {
        0 => 1,
        2 => 3,
        4 => 2,
        _ => 4,
    };
    let stride = usize::try_from(width).unwrap() * channels;
    let mut raw = Vec::new();
    for row in pixels.chunks(stride) {
        raw.push(0);
        raw.extend_from_slice(row);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    let idat = encoder.finish().unwrap();
    png_with_header(width, height, 8, color_type, &idat)
}

/// A PNG container with the given header fields and raw `IDAT` body.
pub(crate) fn png_with_header(
    width: u32,
    height: u32,
    depth: u8,
    color_type: u8,
    idat: &[u8],
) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[depth, color_type, 0, 0, 0]);
    chunk(&mut out, b"IHDR", &ihdr);
    chunk(&mut out, b"IDAT", idat);
    chunk(&mut out, b"IEND", &[]);
    out
}

/// A 4x4 opaque RGB logo.
pub(crate) fn logo() -> crate::logo::LogoImage {
    crate::logo::LogoImage::from_bytes(encode_png(4, 4, 2, &[0x28; 48])).unwrap()
}
