// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sidecar header line and format constants.
//!
//! A `.bix` file opens with one ASCII line:
//!
//! ```text
//! bibindex <file-version> <major> <minor> <ctime>\n
//! ```
//!
//! The file version is the only machine-checked part, and it is checked
//! in BOTH directions: an older sidecar means "rerun bibindex", a newer
//! one means "upgrade biblook". Program major/minor and the timestamp are
//! for humans.
//!
//! The timestamp is derived from the source file's mtime rather than the
//! wall clock, so indexing an unchanged `.bib` twice produces
//! byte-identical sidecars.

use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// On-disk format version. Older or newer is a hard error.
pub const FILE_VERSION: u32 = 4;

/// Program version, written into the header for diagnostics.
pub const MAJOR_VERSION: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const MINOR_VERSION: &str = env!("CARGO_PKG_VERSION_MINOR");

/// Abbreviation origin sentinel: not defined anywhere.
pub const INDEX_NAN: u32 = u32::MAX;

/// Abbreviation origin sentinel: built into the indexer.
pub const INDEX_BUILTIN: u32 = u32::MAX - 1;

/// Longest header line the reader will accept.
const MAX_HEADER_LINE: usize = 128;

/// Write the header line.
pub fn write_header<W: Write>(w: &mut W, source_mtime: SystemTime) -> io::Result<()> {
    let secs = source_mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    writeln!(
        w,
        "bibindex {} {} {} {}",
        FILE_VERSION,
        MAJOR_VERSION,
        MINOR_VERSION,
        asctime_utc(secs)
    )
}

/// Read and validate the header line, byte by byte so the reader stays at
/// a known offset for everything that follows.
pub fn read_header<R: Read>(r: &mut R) -> io::Result<()> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        r.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            break;
        }
        line.push(byte[0]);
        if line.len() > MAX_HEADER_LINE {
            return Err(not_a_sidecar());
        }
    }

    let line = String::from_utf8(line).map_err(|_| not_a_sidecar())?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bibindex") {
        return Err(not_a_sidecar());
    }
    let version: u32 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(not_a_sidecar)?;

    if version < FILE_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "sidecar has old file version {} (expected {}); please rerun bibindex",
                version, FILE_VERSION
            ),
        ));
    }
    if version > FILE_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "sidecar has file version {} (expected {}); please upgrade biblook",
                version, FILE_VERSION
            ),
        ));
    }
    Ok(())
}

fn not_a_sidecar() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "not a bibindex sidecar")
}

// ============================================================================
// TIMESTAMP FORMATTING
// ============================================================================

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format seconds since the epoch in asctime style,
/// e.g. `Thu Jan  1 00:00:00 1970`.
pub fn asctime_utc(secs: i64) -> String {
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let (hour, minute, second) = (rem / 3600, (rem / 60) % 60, rem % 60);
    let weekday = (days + 4).rem_euclid(7) as usize; // 1970-01-01 was a Thursday

    // Civil-from-days, Gregorian calendar.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{} {} {:2} {:02}:{:02}:{:02} {}",
        WEEKDAYS[weekday],
        MONTHS[(month - 1) as usize],
        day,
        hour,
        minute,
        second,
        year
    )
}
