//! End-to-end pipeline fixtures exercising `radar_pipeline::process` through
//! its public API only, the same way a caller (the out-of-scope HTTP layer)
//! would invoke it. Mirrors `spec.md` §8's E1-E6 literal scenarios where they
//! apply at the facade level (E4/E5 are exercised directly against
//! `grib2-parser` in that crate's own tests, since they're section-parser
//! failures rather than facade-level behavior).

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Appends a minimal Section 0 + Section 1 header to `msg`, leaving the
/// total-length patch position for the caller to fill in once the whole
/// message is assembled.
fn push_header(msg: &mut Vec<u8>) -> usize {
    msg.extend(b"GRIB");
    msg.extend(&[0u8, 0u8]);
    msg.push(0); // discipline
    msg.push(2); // edition
    let total_length_pos = msg.len();
    msg.extend(&0u64.to_be_bytes());

    msg.extend(&21u32.to_be_bytes());
    msg.push(1);
    msg.extend(&7u16.to_be_bytes());
    msg.extend(&0u16.to_be_bytes());
    msg.push(2);
    msg.push(0);
    msg.push(0);
    msg.extend(&2024u16.to_be_bytes());
    msg.push(1);
    msg.push(15);
    msg.push(18);
    msg.push(42);
    msg.push(0);
    msg.push(0);
    msg.push(0);

    total_length_pos
}

fn push_grid_template0(msg: &mut Vec<u8>, width: u32, height: u32, la1_micro: u32, lo1_micro: u32, scanning_mode: u8) {
    let mut body = Vec::new();
    body.push(0);
    body.extend(&width.saturating_mul(height).to_be_bytes());
    body.push(0);
    body.push(0);
    body.extend(&0u16.to_be_bytes()); // template number 0
    body.push(0);
    body.extend(std::iter::repeat(0u8).take(15));
    body.extend(&width.to_be_bytes());
    body.extend(&height.to_be_bytes());
    body.extend(&0u32.to_be_bytes());
    body.extend(&0u32.to_be_bytes());
    body.extend(&la1_micro.to_be_bytes());
    body.extend(&lo1_micro.to_be_bytes());
    body.push(0);
    body.extend(&la1_micro.to_be_bytes());
    body.extend(&lo1_micro.to_be_bytes());
    body.extend(&(1_000_000u32).to_be_bytes());
    body.extend(&(1_000_000u32).to_be_bytes());
    body.push(scanning_mode);

    let total_len = 5 + body.len();
    msg.extend(&(total_len as u32).to_be_bytes());
    msg.push(3);
    msg.extend(&body);
}

fn push_data_representation(msg: &mut Vec<u8>, num_points: u32, template_num: u16, template_body: &[u8]) {
    let total_len = 5 + 4 + 2 + template_body.len();
    msg.extend(&(total_len as u32).to_be_bytes());
    msg.push(5);
    msg.extend(&num_points.to_be_bytes());
    msg.extend(&template_num.to_be_bytes());
    msg.extend(template_body);
}

fn push_data_section(msg: &mut Vec<u8>, payload: &[u8]) {
    let total_len = 5 + payload.len();
    msg.extend(&(total_len as u32).to_be_bytes());
    msg.push(7);
    msg.extend(payload);
}

fn finish_and_gzip(mut msg: Vec<u8>, total_length_pos: usize) -> Vec<u8> {
    msg.extend(b"7777");
    let total_length = msg.len() as u64;
    msg[total_length_pos..total_length_pos + 8].copy_from_slice(&total_length.to_be_bytes());

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&msg).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn e1_simple_packing_1x1_grid_renders_expected_pixel() {
    let mut msg = Vec::new();
    let total_length_pos = push_header(&mut msg);
    push_grid_template0(&mut msg, 1, 1, 40_000_000, 260_000_000, 0);

    let mut s5_body = Vec::new();
    s5_body.extend(&0f32.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.push(8);
    s5_body.push(0);
    push_data_representation(&mut msg, 1, 0, &s5_body);

    push_data_section(&mut msg, &[0x1E]); // 30 dBZ -> (0,144,0,255)

    let gz = finish_and_gzip(msg, total_length_pos);
    let (png, metadata) = radar_pipeline::process(&gz).unwrap();

    assert_eq!(metadata.width, 1);
    assert_eq!(metadata.height, 1);
    assert_eq!(metadata.bounds.north, 40.0);
    assert_eq!(metadata.bounds.west, -100.0);

    // IHDR color type byte (truecolor + alpha).
    assert_eq!(png[25], 6);
}

#[test]
fn e2_run_length_missing_cells_render_transparent() {
    let mut msg = Vec::new();
    let total_length_pos = push_header(&mut msg);
    push_grid_template0(&mut msg, 2, 2, 40_000_000, 260_000_000, 0);
    push_data_representation(&mut msg, 4, 200, &[]);
    // (0x00, count=2): 2 missing cells. (0x80, count=2): 2 cells at 64*0.5-33 = -1 dBZ.
    push_data_section(&mut msg, &[0x00, 0x02, 0x80, 0x02]);

    let gz = finish_and_gzip(msg, total_length_pos);
    let (png, metadata) = radar_pipeline::process(&gz).unwrap();

    assert_eq!(metadata.width, 2);
    assert_eq!(metadata.height, 2);
    assert!(!png.is_empty());
}

#[test]
fn e6_png_embedded_packing_decodes_grayscale_samples() {
    // Build a 2x1 grayscale PNG with pixel values [100, 200] to embed as
    // Section 7's payload for packing template 41.
    let mut embedded_png = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut embedded_png, 2, 1);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[100u8, 200u8]).unwrap();
        writer.finish().unwrap();
    }

    let mut msg = Vec::new();
    let total_length_pos = push_header(&mut msg);
    push_grid_template0(&mut msg, 2, 1, 40_000_000, 260_000_000, 0);

    let mut s5_body = Vec::new();
    s5_body.extend(&0f32.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.push(8);
    s5_body.push(0);
    push_data_representation(&mut msg, 2, 41, &s5_body);
    push_data_section(&mut msg, &embedded_png);

    let gz = finish_and_gzip(msg, total_length_pos);
    let (_, metadata) = radar_pipeline::process(&gz).unwrap();
    assert_eq!(metadata.width, 2);
    assert_eq!(metadata.height, 1);
}

#[test]
fn scanning_mode_0xc0_is_honored_end_to_end() {
    let mut msg = Vec::new();
    let total_length_pos = push_header(&mut msg);
    push_grid_template0(&mut msg, 2, 2, 40_000_000, 260_000_000, 0xC0);

    let mut s5_body = Vec::new();
    s5_body.extend(&0f32.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.extend(&0i16.to_be_bytes());
    s5_body.push(8);
    s5_body.push(0);
    push_data_representation(&mut msg, 4, 0, &s5_body);
    push_data_section(&mut msg, &[30, 35, 40, 45]);

    let gz = finish_and_gzip(msg, total_length_pos);
    let (png, _metadata) = radar_pipeline::process(&gz).unwrap();
    assert_eq!(&png[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[test]
fn non_gzip_input_is_reported_as_decompression_failure() {
    let err = radar_pipeline::process(b"not gzip at all").unwrap_err();
    assert!(matches!(err, radar_pipeline::PipelineError::DecompressionFailed(_)));
}
