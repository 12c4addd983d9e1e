//! Data-representation unpackers: turn the still-packed bytes of Section 7
//! into a dense `Vec<f32>` of dBZ values, one per grid point, using
//! `-999.0` as the missing-value sentinel.
//!
//! Every template (0, 40, 41, 200) must produce exactly `num_points` values.
//! Template 40 never fails — a full JPEG 2000 decoder is out of scope, so it
//! degrades to a byte-as-value approximation and logs a warning instead.
//! Template 41 falls back the same way if the embedded PNG fails to decode.

use crate::reader::read_bits;
use crate::sections::SimplePackingFields;
use crate::Grib2Error;

pub const MISSING: f32 = -999.0;

fn apply_formula(fields: &SimplePackingFields, x: u32) -> f32 {
    let r = fields.reference_value;
    let e = fields.binary_scale_factor as i32;
    let d = fields.decimal_scale_factor as i32;
    (r + x as f32 * 2f32.powi(e)) * 10f32.powi(-d)
}

/// Template 5.0 — simple bit-packing.
pub fn unpack_simple(data: &[u8], fields: &SimplePackingFields, num_points: u32) -> Vec<f32> {
    let num_points = num_points as usize;
    if fields.bits_per_value == 0 {
        let value = apply_formula(fields, 0);
        return vec![value; num_points];
    }

    let width = fields.bits_per_value as usize;
    let mut out = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let x = read_bits(data, i * width, width);
        out.push(apply_formula(fields, x));
    }
    out
}

/// Template 5.41 — PNG-embedded. Returns the field plus `true` if the raw-byte
/// fallback path was taken (caller logs the warning, since this module has no
/// business emitting its own tracing events independent of the caller's span).
pub fn unpack_png(data: &[u8], fields: &SimplePackingFields, num_points: u32) -> Result<(Vec<f32>, bool), Grib2Error> {
    let num_points_usize = num_points as usize;

    match decode_png_samples(data) {
        Ok((samples, channels)) => {
            let mut out = Vec::with_capacity(num_points_usize);
            for i in 0..num_points_usize {
                let x = if fields.bits_per_value <= 8 {
                    let idx = i * channels;
                    *samples.get(idx).unwrap_or(&0) as u32
                } else if fields.bits_per_value <= 16 && channels >= 2 {
                    let idx = i * channels;
                    let hi = *samples.get(idx).unwrap_or(&0) as u32;
                    let lo = *samples.get(idx + 1).unwrap_or(&0) as u32;
                    (hi << 8) | lo
                } else {
                    let idx = i * channels;
                    *samples.get(idx).unwrap_or(&0) as u32
                };

                let y = apply_formula(fields, x);
                out.push(if x == 0 || y < -30.0 { MISSING } else { y });
            }
            Ok((out, false))
        }
        Err(_) => {
            // Best-effort fallback: treat bytes 8..end as raw 8-bit X values.
            let raw = if data.len() > 8 { &data[8..] } else { &[] };
            let mut out = Vec::with_capacity(num_points_usize);
            for i in 0..num_points_usize {
                let x = *raw.get(i).unwrap_or(&0) as u32;
                let y = apply_formula(fields, x);
                out.push(if x == 0 || y < -30.0 { MISSING } else { y });
            }
            Ok((out, true))
        }
    }
}

/// Decode an embedded PNG to raw samples, returning `(samples, channels)`.
/// Only grayscale and grayscale+alpha 8-bit depths are interpreted directly;
/// anything else is flattened to its raw byte stream, which is still usable
/// as a sequence of per-pixel samples for `bits_per_value <= 8`.
fn decode_png_samples(data: &[u8]) -> Result<(Vec<u8>, usize), png::DecodingError> {
    let decoder = png::Decoder::new(data);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let channels = info.color_type.samples();
    buf.truncate(info.line_size * info.height as usize);
    Ok((buf, channels.max(1)))
}

/// Template 5.200 — MRMS run-length encoding: alternating
/// `(value_byte, count_byte)` pairs.
pub fn unpack_run_length(data: &[u8], num_points: u32) -> Vec<f32> {
    let num_points = num_points as usize;
    let mut out = Vec::with_capacity(num_points);

    let mut i = 0;
    while out.len() < num_points && i + 1 < data.len() {
        let value_byte = data[i];
        let count = data[i + 1] as usize;
        i += 2;

        let dbz = if value_byte == 0 {
            MISSING
        } else {
            value_byte as f32 * 0.5 - 33.0
        };

        let remaining = num_points - out.len();
        let n = count.min(remaining);
        out.extend(std::iter::repeat(dbz).take(n));
    }

    // Buffer exhausted before the field filled: pad with missing so callers
    // always get exactly `num_points` values.
    out.resize(num_points, MISSING);
    out
}

/// Template 5.40 — JPEG 2000 fallback. Never fails; treats each data byte as
/// the raw unpacked integer `X`. Returns the field; the caller is
/// responsible for logging the "approximate values" warning this always
/// implies.
pub fn unpack_jpeg2000_fallback(data: &[u8], fields: &SimplePackingFields, num_points: u32) -> Vec<f32> {
    let num_points = num_points as usize;
    let mut out = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let x = *data.get(i).unwrap_or(&0) as u32;
        out.push(apply_formula(fields, x));
    }
    out
}
