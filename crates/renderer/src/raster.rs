//! Scan-mode-aware reorientation of a dBZ field into a top-left,
//! row-major, north-up, west-left RGBA raster.
//!
//! Grounded on the row-parallel rendering style of the teacher's gradient
//! renderer: one `rayon` thread per output row, each row independently
//! computing its own source indices and colors.

use crate::colorscale::color_for_dbz;
use rayon::prelude::*;

/// An RGBA pixel buffer with explicit dimensions.
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

const SCAN_EAST_TO_WEST: u8 = 0x80;
const SCAN_SOUTH_TO_NORTH: u8 = 0x40;

/// Reorient `field` (row-major in the GRIB2 source scan order implied by
/// `scanning_mode`) into a north-up, west-left, top-left row-major RGBA
/// raster, mapping each dBZ value through the color ramp.
pub fn render(field: &[f32], width: u32, height: u32, scanning_mode: u8) -> Raster {
    let width_usize = width as usize;
    let height_usize = height as usize;
    let mut pixels = vec![0u8; width_usize * height_usize * 4];

    let west_to_east = scanning_mode & SCAN_EAST_TO_WEST == 0;
    let north_to_south = scanning_mode & SCAN_SOUTH_TO_NORTH == 0;

    pixels
        .par_chunks_mut(width_usize * 4)
        .enumerate()
        .for_each(|(j, row)| {
            let src_y = if north_to_south {
                j
            } else {
                height_usize - 1 - j
            };

            for i in 0..width_usize {
                let src_x = if west_to_east { i } else { width_usize - 1 - i };
                let src_index = src_y * width_usize + src_x;
                let value = field.get(src_index).copied().unwrap_or(f32::NAN);
                let (r, g, b, a) = color_for_dbz(value);

                let px = i * 4;
                row[px] = r;
                row[px + 1] = g;
                row[px + 2] = b;
                row[px + 3] = a;
            }
        });

    Raster { width, height, pixels }
}
