//! GRIB2 section parsing and data-representation unpacking for the NOAA
//! MRMS "Reflectivity at Lowest Altitude" radar product.
//!
//! This crate understands exactly the subset of GRIB2 that MRMS RALA needs:
//! sections 0, 1, 3, 5, 7 (sections 2, 4, 6 are skipped transparently), grid
//! templates 0 and 30, and data-representation templates 0, 40, 41, 200. It
//! does not attempt to be a general-purpose GRIB2 library.

pub mod reader;
pub mod sections;
pub mod unpacking;

use bytes::Bytes;
use sections::{
    find_section, parse_data_representation, parse_data_section, parse_grid_definition,
    parse_identification, parse_indicator, DataSection, Grid, Identification, Indicator, Packing,
};
use thiserror::Error;

pub use sections::Bounds;

/// Everything that can go wrong while parsing or unpacking a GRIB2 message.
#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("unsupported GRIB2 edition {0} (only edition 2 is supported)")]
    UnsupportedEdition(u8),

    #[error("missing required section {0}")]
    MissingSection(u8),

    #[error("section {section} invalid: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("unsupported grid definition template {0}")]
    UnsupportedGridTemplate(u16),

    #[error("unsupported data representation template {0}")]
    UnsupportedPacking(u16),
}

/// A fully parsed GRIB2 message: every section needed to recover the
/// reflectivity grid, still holding the packed bytes of Section 7 until
/// [`Message::unpack`] is called.
#[derive(Debug, Clone)]
pub struct Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: Grid,
    pub packing: Packing,
    data_section: DataSection,
}

impl Message {
    /// Unpack Section 7 into a dense `float32[grid.num_points]` field of
    /// dBZ values (`-999.0` sentinel for missing), dispatching on the
    /// packing template. Template 40 never errors; template 41 falls back to
    /// a raw-byte approximation and logs a warning if the embedded PNG
    /// fails to decode.
    pub fn unpack(&self) -> Result<Vec<f32>, Grib2Error> {
        let data = &self.data_section.data;
        let num_points = self.packing.num_data_points();

        let field = match &self.packing {
            Packing::Simple { fields, .. } => unpacking::unpack_simple(data, fields, num_points),
            Packing::Png { fields, .. } => {
                let (field, fell_back) = unpacking::unpack_png(data, fields, num_points)?;
                if fell_back {
                    tracing::warn!(
                        template = 41,
                        "embedded PNG failed to decode; falling back to raw-byte approximation"
                    );
                }
                field
            }
            Packing::RunLength { .. } => unpacking::unpack_run_length(data, num_points),
            Packing::Jpeg2000 { fields, .. } => {
                tracing::warn!(template = 40, "JPEG 2000 decoding is not implemented; values are approximate");
                unpacking::unpack_jpeg2000_fallback(data, fields, num_points)
            }
        };

        Ok(field)
    }
}

/// Parse a single GRIB2 message from `data`, which must begin at Section 0
/// and contain at least Sections 0, 1, 3, 5, and 7 (2, 4, 6 optional).
pub fn parse_message(data: &[u8]) -> Result<Message, Grib2Error> {
    let indicator = parse_indicator(data)?;

    let (identification, section1_len) = parse_identification(data, 16)?;
    let after_section1 = 16 + section1_len;

    // Section 2 (local use) is skipped transparently by the forward scan
    // inside `find_section`, the same mechanism that skips §4 and §6 below.
    let section3_offset = find_section(data, after_section1, 3)?;
    let (grid, section3_len) = parse_grid_definition(data, section3_offset)?;
    let after_section3 = section3_offset + section3_len;

    let section5_offset = find_section(data, after_section3, 5)?;
    let (packing, section5_len) = parse_data_representation(data, section5_offset)?;
    let after_section5 = section5_offset + section5_len;

    let section7_offset = find_section(data, after_section5, 7)?;
    let (data_section, _section7_len) = parse_data_section(data, section7_offset)?;

    if packing.num_data_points() != grid.num_points {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: format!(
                "Section 5 num_data_points ({}) does not match grid.num_points ({})",
                packing.num_data_points(),
                grid.num_points
            ),
        });
    }

    tracing::info!(
        edition = indicator.edition,
        width = grid.width,
        height = grid.height,
        grid_template = grid.template_num,
        packing_template = packing.template_num(),
        "parsed GRIB2 message"
    );

    Ok(Message {
        indicator,
        identification,
        grid,
        packing,
        data_section,
    })
}

/// Re-exported so downstream crates can build `Section 7`-shaped test
/// fixtures without depending on `bytes` directly.
pub fn raw_bytes(data_section: &DataSection) -> &Bytes {
    &data_section.data
}
