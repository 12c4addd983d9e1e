//! Minimal hand-rolled PNG encoder: truecolor + alpha only, no palette.
//!
//! Adapted from the teacher's `renderer::png` encoder, trimmed to the
//! RGBA (color type 6) path only — this crate never needs the indexed/PNG8
//! palette path since the radar raster is always alpha-blended over a map.

use crc32fast::Hasher as Crc32;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("pixel buffer length {got} does not match width*height*4 ({expected})")]
    BufferSizeMismatch { got: usize, expected: usize },
    #[error("zlib deflate failed: {0}")]
    DeflateFailed(String),
}

fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend(&(data.len() as u32).to_be_bytes());
    out.extend(chunk_type);
    out.extend(data);

    let mut hasher = Crc32::new();
    hasher.update(chunk_type);
    hasher.update(data);
    out.extend(&hasher.finalize().to_be_bytes());
}

/// Deflate one scanline-filtered IDAT payload (filter byte `0` — "None" —
/// prefixed to every row) at compression level 6.
fn deflate_idat_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PngError> {
    let stride = width * 4;
    let mut raw = Vec::with_capacity(height * (stride + 1));
    for row in 0..height {
        raw.push(0); // filter type: None
        raw.extend(&pixels[row * stride..row * stride + stride]);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(&raw).map_err(|e| PngError::DeflateFailed(e.to_string()))?;
    encoder.finish().map_err(|e| PngError::DeflateFailed(e.to_string()))
}

/// Encode an RGBA pixel buffer (`width * height * 4` bytes, row-major,
/// top-left origin) as a truecolor-with-alpha PNG.
pub fn create_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PngError> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(PngError::BufferSizeMismatch { got: pixels.len(), expected });
    }

    let mut out = Vec::new();
    out.extend(&PNG_SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend(&width.to_be_bytes());
    ihdr.extend(&height.to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type: truecolor + alpha
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut out, b"IHDR", &ihdr);

    let idat = deflate_idat_rgba(pixels, width as usize, height as usize)?;
    write_chunk(&mut out, b"IDAT", &idat);

    write_chunk(&mut out, b"IEND", &[]);

    Ok(out)
}
