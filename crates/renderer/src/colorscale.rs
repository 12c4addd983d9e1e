//! Fixed 17-stop dBZ-to-RGBA reflectivity color ramp.
//!
//! Grounded on the sorted-stops, linear-per-channel interpolation style of
//! a JSON-configurable style table, specialized here to one ramp with no
//! file loading: this crate only ever renders MRMS RALA reflectivity.

/// One stop in the ramp: a dBZ value and its RGBA color.
struct Stop {
    dbz: f32,
    rgba: (u8, u8, u8, u8),
}

const STOPS: [Stop; 17] = [
    Stop { dbz: -30.0, rgba: (0, 0, 0, 0) },
    Stop { dbz: 0.0, rgba: (0, 0, 0, 0) },
    Stop { dbz: 5.0, rgba: (4, 68, 94, 160) },
    Stop { dbz: 10.0, rgba: (0, 160, 180, 200) },
    Stop { dbz: 15.0, rgba: (0, 200, 160, 220) },
    Stop { dbz: 20.0, rgba: (0, 230, 0, 240) },
    Stop { dbz: 25.0, rgba: (0, 200, 0, 250) },
    Stop { dbz: 30.0, rgba: (0, 144, 0, 255) },
    Stop { dbz: 35.0, rgba: (255, 255, 0, 255) },
    Stop { dbz: 40.0, rgba: (255, 192, 0, 255) },
    Stop { dbz: 45.0, rgba: (255, 128, 0, 255) },
    Stop { dbz: 50.0, rgba: (255, 0, 0, 255) },
    Stop { dbz: 55.0, rgba: (200, 0, 0, 255) },
    Stop { dbz: 60.0, rgba: (255, 0, 200, 255) },
    Stop { dbz: 65.0, rgba: (160, 0, 255, 255) },
    Stop { dbz: 70.0, rgba: (255, 255, 255, 255) },
    Stop { dbz: 75.0, rgba: (200, 200, 255, 255) },
];

/// Missing-value sentinel threshold: any dBZ below this is treated as
/// missing rather than looked up in the ramp.
const MISSING_THRESHOLD: f32 = -900.0;

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

/// Map a dBZ value to RGBA. NaN or any value below -900 is treated as
/// missing and returns fully transparent black.
pub fn color_for_dbz(dbz: f32) -> (u8, u8, u8, u8) {
    if dbz.is_nan() || dbz < MISSING_THRESHOLD {
        return (0, 0, 0, 0);
    }
    if dbz < STOPS[0].dbz {
        return STOPS[0].rgba;
    }
    if dbz >= STOPS[STOPS.len() - 1].dbz {
        return STOPS[STOPS.len() - 1].rgba;
    }

    for window in STOPS.windows(2) {
        let (lo, hi) = (&window[0], &window[1]);
        if dbz >= lo.dbz && dbz < hi.dbz {
            let t = (dbz - lo.dbz) / (hi.dbz - lo.dbz);
            return (
                lerp_channel(lo.rgba.0, hi.rgba.0, t),
                lerp_channel(lo.rgba.1, hi.rgba.1, t),
                lerp_channel(lo.rgba.2, hi.rgba.2, t),
                lerp_channel(lo.rgba.3, hi.rgba.3, t),
            );
        }
    }

    unreachable!("dbz is within [STOPS[0].dbz, STOPS[last].dbz) by the checks above")
}
