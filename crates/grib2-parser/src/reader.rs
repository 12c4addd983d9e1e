//! Typed big-endian readers over a GRIB2 byte buffer.
//!
//! GRIB2 mixes three numeric encodings in the same message: plain unsigned
//! big-endian integers, IEEE-754 floats, and a "sign-magnitude" signed
//! integer convention where the high bit of the first octet is a sign flag
//! rather than part of two's-complement. `read_i` below implements that
//! convention explicitly; it must never delegate to `i16::from_be_bytes` or
//! `i32::from_be_bytes`, which assume two's complement and silently produce
//! wrong values (e.g. `0x8000_0001` is `-1` in GRIB2, not `i32::MIN + 1`).

/// Read an unsigned big-endian integer of `n` bytes (`n` in `1..=8`) starting
/// at `offset`.
///
/// # Panics
/// Panics if `n` is 0 or greater than 8, or if the read would run past the
/// end of `data`. Callers are expected to have already validated section
/// lengths before reaching this point.
pub fn read_u(data: &[u8], offset: usize, n: usize) -> u64 {
    assert!((1..=8).contains(&n), "read_u: n must be in 1..=8, got {n}");
    let bytes = &data[offset..offset + n];
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Read a GRIB2 sign-magnitude signed integer of `n` bytes (`n` in `1..=8`)
/// starting at `offset`.
///
/// The high bit of the first byte is the sign; the remaining bits (across
/// all `n` bytes) are the magnitude.
pub fn read_i(data: &[u8], offset: usize, n: usize) -> i64 {
    assert!((1..=8).contains(&n), "read_i: n must be in 1..=8, got {n}");
    let raw = read_u(data, offset, n);
    let sign_bit = 1u64 << (8 * n - 1);
    let magnitude_mask = sign_bit - 1;
    if raw & sign_bit != 0 {
        -((raw & magnitude_mask) as i64)
    } else {
        raw as i64
    }
}

/// Read an IEEE-754 binary32 float, big-endian, at `offset`.
pub fn read_f32(data: &[u8], offset: usize) -> f32 {
    let bytes: [u8; 4] = data[offset..offset + 4].try_into().expect("read_f32: 4 bytes");
    f32::from_be_bytes(bytes)
}

/// Extract `bit_width` bits (0..=32) starting at `bit_offset`, counted from
/// the most-significant bit of `base[0]`, assembling the result MSB-first.
/// Crosses byte boundaries transparently. `bit_width == 0` always yields 0.
pub fn read_bits(base: &[u8], bit_offset: usize, bit_width: usize) -> u32 {
    if bit_width == 0 {
        return 0;
    }
    assert!(bit_width <= 32, "read_bits: bit_width must be <= 32, got {bit_width}");

    let mut value: u32 = 0;
    for i in 0..bit_width {
        let bit_pos = bit_offset + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;
        let byte = base.get(byte_idx).copied().unwrap_or(0);
        let bit = (byte >> (7 - bit_in_byte)) & 1;
        value = (value << 1) | bit as u32;
    }
    value
}
