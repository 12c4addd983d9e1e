//! Color mapping, scan-mode reorientation, and PNG encoding of a decoded
//! radar reflectivity field.

pub mod colorscale;
pub mod png;
pub mod raster;

pub use colorscale::color_for_dbz;
pub use png::{create_png, PngError};
pub use raster::{render, Raster};

/// Reorient `field` and encode it as a PNG in one call: the facade's
/// only entry point into this crate.
pub fn render_to_png(field: &[f32], width: u32, height: u32, scanning_mode: u8) -> Result<Vec<u8>, PngError> {
    let raster = render(field, width, height, scanning_mode);
    create_png(&raster.pixels, raster.width, raster.height)
}
