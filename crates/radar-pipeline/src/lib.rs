//! Single-entry pipeline facade: gzip-decompress a NOAA MRMS RALA product,
//! parse the embedded GRIB2 message, render a geo-aligned PNG overlay, and
//! emit JSON-serializable metadata alongside it.
//!
//! This crate owns no state across calls: every [`process`] invocation reads
//! its input once and returns owned output, so it is safe to call
//! concurrently from multiple request handlers (see `spec.md` §5).

use std::io::Read;
use std::time::Instant;

use flate2::read::GzDecoder;
use grib2_parser::{parse_message, Bounds, Grib2Error};
use renderer::PngError;
use serde::Serialize;
use thiserror::Error;

/// The single error type that crosses the facade boundary. Wraps every
/// `grib2-parser` failure via `#[from]` and adds the two failure modes that
/// only make sense at this layer: gzip decompression and PNG encoding.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("gzip decompression failed: {0}")]
    DecompressionFailed(String),

    #[error(transparent)]
    Grib2(#[from] Grib2Error),

    #[error("PNG rendering failed: {0}")]
    RenderFailed(String),
}

impl From<PngError> for PipelineError {
    fn from(err: PngError) -> Self {
        PipelineError::RenderFailed(err.to_string())
    }
}

/// Geographic bounding rectangle, re-exported in the shape `spec.md` §6's
/// metadata JSON expects (`north`/`south`/`east`/`west`, not
/// `min_x`/`min_y`/`max_x`/`max_y`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetadataBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl From<Bounds> for MetadataBounds {
    fn from(b: Bounds) -> Self {
        MetadataBounds {
            north: b.north,
            south: b.south,
            east: b.east,
            west: b.west,
        }
    }
}

/// The facade's second output: everything a caller needs to place the PNG
/// on a map without re-parsing it.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub timestamp: String,
    pub bounds: MetadataBounds,
    pub width: u32,
    pub height: u32,
}

/// Decompress a single-member gzip stream.
fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PipelineError::DecompressionFailed(e.to_string()))?;
    Ok(out)
}

/// Run the full pipeline: gzip-decompress `compressed_bytes`, parse the
/// embedded GRIB2 message, unpack its reflectivity field, render it to a
/// north-up RGBA PNG, and return the encoded image alongside its metadata.
///
/// Every step's failure is reported through [`PipelineError`]; nothing is
/// retried internally (`spec.md` §7).
pub fn process(compressed_bytes: &[u8]) -> Result<(Vec<u8>, Metadata), PipelineError> {
    let start = Instant::now();

    let raw = gunzip(compressed_bytes)?;
    let message = parse_message(&raw)?;
    let field = message.unpack()?;

    let png_bytes = renderer::render_to_png(
        &field,
        message.grid.width,
        message.grid.height,
        message.grid.scanning_mode,
    )?;

    let metadata = Metadata {
        timestamp: message.identification.reference_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        bounds: message.grid.bounds.into(),
        width: message.grid.width,
        height: message.grid.height,
    };

    tracing::info!(
        width = metadata.width,
        height = metadata.height,
        grid_template = message.grid.template_num,
        packing_template = message.packing.template_num(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "radar pipeline complete"
    );

    Ok((png_bytes, metadata))
}
