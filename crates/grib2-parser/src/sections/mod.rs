//! GRIB2 section parsing: Section 0 (Indicator) through Section 7 (Data),
//! skipping Sections 2, 4, and 6 transparently.
//!
//! Each `parse_*` function returns the parsed section plus the section's
//! total length in bytes (length is always the first 4 octets of every
//! section after Section 0), so the caller can advance to the next section
//! without re-deriving that length elsewhere.

use crate::reader::{read_bits, read_f32, read_i, read_u};
use crate::Grib2Error;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Section 0: Indicator Section (fixed 16 bytes).
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub total_length: u64,
}

/// Section 1: Identification Section.
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
}

/// A geographic bounding rectangle in degrees, normalized so that
/// `south <= north` and `west <= east` (longitudes in `[-180, 180]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Section 3 grid definition template, tagged by template number.
///
/// Only templates 0 (equidistant cylindrical lat/lon) and 30 (Lambert
/// Conformal, approximated) are supported; anything else is rejected
/// during parsing with `Grib2Error::UnsupportedGridTemplate`.
#[derive(Debug, Clone)]
pub enum GridTemplate {
    /// Template 3.0 — equidistant cylindrical (Plate Carree) lat/lon grid.
    Template0 {
        la1: f64,
        lo1: f64,
        la2: f64,
        lo2: f64,
        di: f64,
        dj: f64,
    },
    /// Template 3.30 — Lambert Conformal. The projection itself is not
    /// computed; `Grid::bounds` is the fixed CONUS rectangle regardless of
    /// these header values (see module docs on `parse_grid_definition`).
    Template30 { la1: f64, lo1: f64 },
}

/// Section 3: Grid Definition Section.
#[derive(Debug, Clone)]
pub struct Grid {
    pub template_num: u16,
    pub width: u32,
    pub height: u32,
    pub num_points: u32,
    pub bounds: Bounds,
    pub scanning_mode: u8,
    pub template: GridTemplate,
}

/// Fields shared by the "simple packing" family of data-representation
/// templates (5.0, 5.40, 5.41): a reference value plus binary/decimal scale
/// factors, per the formula in `spec.md` §4.4.
#[derive(Debug, Clone, Copy)]
pub struct SimplePackingFields {
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

/// Section 5 data-representation template, tagged by template number.
#[derive(Debug, Clone)]
pub enum Packing {
    /// Template 5.0 — simple bit-packing.
    Simple {
        num_data_points: u32,
        fields: SimplePackingFields,
    },
    /// Template 5.41 — data section is itself a PNG image.
    Png {
        num_data_points: u32,
        fields: SimplePackingFields,
    },
    /// Template 5.200 — MRMS run-length encoding. `spec.md` §4.4 defines a
    /// self-contained `(value_byte, count_byte)` decode that needs nothing
    /// from Section 5 beyond the point count.
    RunLength { num_data_points: u32 },
    /// Template 5.40 — JPEG 2000. Full decode is out of scope; each data
    /// byte is treated as a raw unpacked value (see `unpacking::jpeg2000`).
    Jpeg2000 {
        num_data_points: u32,
        fields: SimplePackingFields,
    },
}

impl Packing {
    pub fn num_data_points(&self) -> u32 {
        match self {
            Packing::Simple { num_data_points, .. }
            | Packing::Png { num_data_points, .. }
            | Packing::RunLength { num_data_points }
            | Packing::Jpeg2000 { num_data_points, .. } => *num_data_points,
        }
    }

    pub fn template_num(&self) -> u16 {
        match self {
            Packing::Simple { .. } => 0,
            Packing::Png { .. } => 41,
            Packing::RunLength { .. } => 200,
            Packing::Jpeg2000 { .. } => 40,
        }
    }
}

/// Section 7: Data Section (raw, still-packed bytes).
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Section 0 =====

/// Parse the fixed 16-byte Section 0 at the very start of the message.
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat("message shorter than 16-byte Section 0".into()));
    }
    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat("missing 'GRIB' magic".into()));
    }

    let discipline = data[6];
    let edition = data[7];
    if edition != 2 {
        return Err(Grib2Error::UnsupportedEdition(edition));
    }

    let total_length = read_u(data, 8, 8);

    Ok(Indicator {
        discipline,
        edition,
        total_length,
    })
}

// ===== Section 1 =====

/// Parse Section 1 starting at `offset` (always 16 for a well-formed
/// message). Returns the parsed section and its length in bytes.
pub fn parse_identification(data: &[u8], offset: usize) -> Result<(Identification, usize), Grib2Error> {
    if data.len() < offset + 5 {
        return Err(Grib2Error::InvalidFormat("truncated before Section 1 header".into()));
    }
    let section_length = read_u(data, offset, 4) as usize;
    let section_num = data[offset + 4];
    if section_num != 1 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected Section 1 at offset {offset}, found section {section_num}"
        )));
    }
    if section_length < 21 || data.len() < offset + section_length {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Section 1 shorter than the minimum 21 octets".into(),
        });
    }

    let body = &data[offset + 5..offset + section_length];
    let center = read_u(body, 0, 2) as u16;
    let sub_center = read_u(body, 2, 2) as u16;
    let significance_of_reference_time = body[6];

    let year = read_u(body, 7, 2) as i32;
    let month = body[9] as u32;
    let day = body[10] as u32;
    let hour = body[11] as u32;
    let minute = body[12] as u32;
    let second = body[13] as u32;

    if !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
        || hour > 23
        || minute > 59
        || second > 60
    {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "reference time field out of range: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ),
        });
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Grib2Error::InvalidSection {
        section: 1,
        reason: format!("invalid calendar date: {year:04}-{month:02}-{day:02}"),
    })?;
    // chrono has no direct representation for a GRIB2 leap second (60); the
    // nearest representable instant is used.
    let time = NaiveTime::from_hms_opt(hour, minute, second.min(59)).ok_or_else(|| Grib2Error::InvalidSection {
        section: 1,
        reason: format!("invalid time of day: {hour:02}:{minute:02}:{second:02}"),
    })?;
    let reference_time = DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(time), Utc);

    Ok((
        Identification {
            center,
            sub_center,
            significance_of_reference_time,
            reference_time,
        },
        section_length,
    ))
}

// ===== Section 3 =====

fn normalize_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Parse Section 3 starting at `offset`. Supports grid template 0
/// (equidistant cylindrical lat/lon) and 30 (Lambert Conformal,
/// approximated with a fixed CONUS bounding box — see `spec.md` §4.3).
pub fn parse_grid_definition(data: &[u8], offset: usize) -> Result<(Grid, usize), Grib2Error> {
    if data.len() < offset + 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "truncated before Section 3 header".into(),
        });
    }
    let section_length = read_u(data, offset, 4) as usize;
    let section_num = data[offset + 4];
    if section_num != 3 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected Section 3 at offset {offset}, found section {section_num}"
        )));
    }
    if data.len() < offset + section_length {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Section 3 length exceeds available data".into(),
        });
    }
    if section_length < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("Section 3 length {section_length} is shorter than the 14-octet fixed header"),
        });
    }

    let template_num = read_u(data, offset + 12, 2) as u16;
    // Template-specific body starts after: length(4) + num(1) + source(1) +
    // num_data_points(4) + num_optional(1) + interp(1) + template_num(2) = 14.
    let body_offset = offset + 14;
    let body = &data[body_offset..offset + section_length];

    let grid = match template_num {
        0 => {
            if body.len() < 58 {
                return Err(Grib2Error::InvalidSection {
                    section: 3,
                    reason: format!("template 3.0 needs at least 58 bytes, got {}", body.len()),
                });
            }

            let ni = read_u(body, 16, 4) as u32;
            let nj = read_u(body, 20, 4) as u32;
            let basic_angle = read_u(body, 24, 4);
            let subdivisions = read_u(body, 28, 4);
            let divisor = if basic_angle == 0 || subdivisions == 0 {
                1_000_000.0
            } else {
                (basic_angle * subdivisions) as f64
            };

            let la1 = read_i(body, 32, 4) as f64 / divisor;
            let lo1 = normalize_longitude(read_i(body, 36, 4) as f64 / divisor);
            // Byte 40 (resolution and component flags) is skipped: La2/Lo2/Di/Dj
            // sit at +41/+45/+49/+53, not +40/+44/+48/+52.
            let la2 = read_i(body, 41, 4) as f64 / divisor;
            let lo2 = normalize_longitude(read_i(body, 45, 4) as f64 / divisor);
            let di = read_i(body, 49, 4) as f64 / divisor;
            let dj = read_i(body, 53, 4) as f64 / divisor;
            let scanning_mode = body[57];

            let bounds = Bounds {
                north: la1.max(la2),
                south: la1.min(la2),
                east: lo1.max(lo2),
                west: lo1.min(lo2),
            };

            Grid {
                template_num,
                width: ni,
                height: nj,
                num_points: ni.saturating_mul(nj),
                bounds,
                scanning_mode,
                template: GridTemplate::Template0 { la1, lo1, la2, lo2, di, dj },
            }
        }
        30 => {
            if body.len() < 28 {
                return Err(Grib2Error::InvalidSection {
                    section: 3,
                    reason: format!("template 3.30 needs at least 28 bytes, got {}", body.len()),
                });
            }

            let nx = read_u(body, 16, 4) as u32;
            let ny = read_u(body, 20, 4) as u32;
            let la1 = read_i(body, 24, 4) as f64 / 1_000_000.0;
            let lo1 = normalize_longitude(read_i(body, 28, 4) as f64 / 1_000_000.0);
            // Scanning mode for Lambert grids is not relevant to orientation
            // here because we never reproject — the renderer always treats
            // template-30 output as north-up over the fixed CONUS box.
            let scanning_mode = 0u8;

            // Fixed CONUS approximation (spec.md §4.3): a real reprojection
            // is out of scope, so header values beyond Nx/Ny/La1/Lo1 are
            // parsed for completeness but not used to compute bounds.
            let bounds = Bounds {
                north: 55.0,
                south: 20.0,
                east: -60.0,
                west: -130.0,
            };

            Grid {
                template_num,
                width: nx,
                height: ny,
                num_points: nx.saturating_mul(ny),
                bounds,
                scanning_mode,
                template: GridTemplate::Template30 { la1, lo1 },
            }
        }
        other => return Err(Grib2Error::UnsupportedGridTemplate(other)),
    };

    Ok((grid, section_length))
}

// ===== Section 5 =====

fn parse_simple_packing_fields(template_data: &[u8]) -> Result<SimplePackingFields, Grib2Error> {
    if template_data.len() < 9 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "simple-packing fields need at least 9 bytes".into(),
        });
    }
    Ok(SimplePackingFields {
        reference_value: read_f32(template_data, 0),
        binary_scale_factor: read_i(template_data, 4, 2) as i16,
        decimal_scale_factor: read_i(template_data, 6, 2) as i16,
        bits_per_value: template_data[8],
    })
}

/// Parse Section 5 starting at `offset`. Supports packing templates 0
/// (simple), 40 (JPEG 2000 fallback), 41 (PNG-embedded) and 200 (MRMS
/// run-length); anything else is `Grib2Error::UnsupportedPacking`.
pub fn parse_data_representation(data: &[u8], offset: usize) -> Result<(Packing, usize), Grib2Error> {
    if data.len() < offset + 11 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "truncated before Section 5 header".into(),
        });
    }
    let section_length = read_u(data, offset, 4) as usize;
    let section_num = data[offset + 4];
    if section_num != 5 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected Section 5 at offset {offset}, found section {section_num}"
        )));
    }
    if data.len() < offset + section_length {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Section 5 length exceeds available data".into(),
        });
    }
    if section_length < 11 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: format!("Section 5 length {section_length} is shorter than the 11-octet fixed header"),
        });
    }

    let num_data_points = read_u(data, offset + 5, 4) as u32;
    let template_num = read_u(data, offset + 9, 2) as u16;
    let template_data = &data[offset + 11..offset + section_length];

    let packing = match template_num {
        0 => Packing::Simple {
            num_data_points,
            fields: parse_simple_packing_fields(template_data)?,
        },
        41 => Packing::Png {
            num_data_points,
            fields: parse_simple_packing_fields(template_data)?,
        },
        40 => Packing::Jpeg2000 {
            num_data_points,
            fields: parse_simple_packing_fields(template_data)?,
        },
        200 => Packing::RunLength { num_data_points },
        other => return Err(Grib2Error::UnsupportedPacking(other)),
    };

    Ok((packing, section_length))
}

// ===== Section 7 =====

/// Parse Section 7 starting at `offset`.
pub fn parse_data_section(data: &[u8], offset: usize) -> Result<(DataSection, usize), Grib2Error> {
    if data.len() < offset + 5 {
        return Err(Grib2Error::InvalidSection {
            section: 7,
            reason: "truncated before Section 7 header".into(),
        });
    }
    let section_length = read_u(data, offset, 4) as usize;
    let section_num = data[offset + 4];
    if section_num != 7 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected Section 7 at offset {offset}, found section {section_num}"
        )));
    }
    if data.len() < offset + section_length {
        return Err(Grib2Error::InvalidSection {
            section: 7,
            reason: "Section 7 length exceeds available data".into(),
        });
    }

    let payload = if section_length > 5 {
        Bytes::copy_from_slice(&data[offset + 5..offset + section_length])
    } else {
        Bytes::new()
    };

    Ok((DataSection { data: payload }, section_length))
}

// ===== Forward-scan section locator =====

/// Scan forward from `start_offset` looking for `target` among the
/// length-prefixed sections that follow. Transparently skips any section
/// whose number isn't `target` (this is how §2/§4/§6 get skipped between
/// the required sections). Per `spec.md` §4.2: stop looking once a zero
/// length, Section 8, or an out-of-range section number is encountered.
pub fn find_section(data: &[u8], start_offset: usize, target: u8) -> Result<usize, Grib2Error> {
    let mut offset = start_offset;
    loop {
        if offset + 5 > data.len() {
            return Err(Grib2Error::MissingSection(target));
        }

        let length = read_u(data, offset, 4) as usize;
        let section_num = data[offset + 4];

        if section_num == target {
            return Ok(offset);
        }
        if length == 0 || section_num == 8 || section_num > 8 {
            return Err(Grib2Error::MissingSection(target));
        }

        offset += length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section1_bytes(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Vec<u8> {
        let mut v = vec![0u8; 21];
        v[0..4].copy_from_slice(&21u32.to_be_bytes());
        v[4] = 1; // section number
        v[5..7].copy_from_slice(&7u16.to_be_bytes()); // center = NCEP
        v[7..9].copy_from_slice(&0u16.to_be_bytes());
        v[9] = 2; // table version
        v[10] = 0;
        v[11] = 0; // significance of reference time
        v[12..14].copy_from_slice(&year.to_be_bytes());
        v[14] = month;
        v[15] = day;
        v[16] = hour;
        v[17] = minute;
        v[18] = second;
        v[19] = 0;
        v[20] = 0;
        v
    }

    #[test]
    fn parse_indicator_rejects_bad_magic() {
        let data = b"XXXX\x00\x00\x00\x02\x00\x00\x00\x00\x00\x00\x00\x10";
        assert!(matches!(parse_indicator(data), Err(Grib2Error::InvalidFormat(_))));
    }

    #[test]
    fn parse_indicator_rejects_edition_1() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(matches!(parse_indicator(&data), Err(Grib2Error::UnsupportedEdition(1))));
    }

    #[test]
    fn parse_indicator_accepts_edition_2() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[6] = 0; // discipline
        data[7] = 2;
        data[8..16].copy_from_slice(&100u64.to_be_bytes());
        let ind = parse_indicator(&data).unwrap();
        assert_eq!(ind.edition, 2);
        assert_eq!(ind.total_length, 100);
    }

    #[test]
    fn parse_identification_valid() {
        let mut msg = vec![0u8; 16];
        msg.extend(section1_bytes(2024, 1, 15, 18, 42, 0));
        let (id, len) = parse_identification(&msg, 16).unwrap();
        assert_eq!(len, 21);
        assert_eq!(id.center, 7);
        assert_eq!(id.reference_time.to_rfc3339(), "2024-01-15T18:42:00+00:00");
    }

    #[test]
    fn parse_identification_rejects_bad_month() {
        let mut msg = vec![0u8; 16];
        msg.extend(section1_bytes(2024, 13, 15, 18, 42, 0));
        assert!(matches!(parse_identification(&msg, 16), Err(Grib2Error::InvalidSection { section: 1, .. })));
    }

    #[test]
    fn find_section_skips_unrelated_sections() {
        // Section 2 (local use, 6 bytes) then Section 3 (6 bytes, empty body).
        let mut data = Vec::new();
        data.extend(&6u32.to_be_bytes());
        data.push(2);
        data.push(0xAA);
        data.extend(&6u32.to_be_bytes());
        data.push(3);
        data.push(0xBB);

        let offset = find_section(&data, 0, 3).unwrap();
        assert_eq!(offset, 6);
    }

    #[test]
    fn find_section_stops_at_section_8() {
        let mut data = Vec::new();
        data.extend(&4u32.to_be_bytes());
        data.push(8);
        assert!(matches!(find_section(&data, 0, 5), Err(Grib2Error::MissingSection(5))));
    }

    #[test]
    fn longitude_normalization_wraps_above_180() {
        assert_eq!(normalize_longitude(200.0), -160.0);
        assert_eq!(normalize_longitude(-100.0), -100.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
    }

    #[test]
    fn parse_grid_definition_rejects_truncated_section_instead_of_panicking() {
        // section_length = 10: enough to pass the "fits in data" check but
        // short of the 14-octet fixed header, so the body slice would
        // otherwise start past its own end.
        let mut data = vec![0u8; 20];
        data[0..4].copy_from_slice(&10u32.to_be_bytes());
        data[4] = 3;
        let err = parse_grid_definition(&data, 0).unwrap_err();
        assert!(matches!(err, Grib2Error::InvalidSection { section: 3, .. }));
    }

    #[test]
    fn parse_data_representation_rejects_truncated_section_instead_of_panicking() {
        // section_length = 8: passes the "fits in data" check but is short
        // of the 11-octet fixed header.
        let mut data = vec![0u8; 20];
        data[0..4].copy_from_slice(&8u32.to_be_bytes());
        data[4] = 5;
        let err = parse_data_representation(&data, 0).unwrap_err();
        assert!(matches!(err, Grib2Error::InvalidSection { section: 5, .. }));
    }
}
