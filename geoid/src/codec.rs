//! Compact binary representation of a geoid grid.
//!
//! All fields are little-endian:
//!
//! | offset | field       | type                                   |
//! |--------|-------------|----------------------------------------|
//! | 0      | `n_lng`     | `u16`                                  |
//! | 2      | `n_lat`     | `u16`                                  |
//! | 4      | `lng_denom` | `u16`                                  |
//! | 6      | `lat_denom` | `u16`                                  |
//! | 8      | `lng_min`   | `f32`                                  |
//! | 12     | `lat_min`   | `f32`                                  |
//! | 16     | `kind`      | `u16`                                  |
//! | 18     | `version`   | 10 bytes, ASCII, NUL-padded            |
//! | 28     | samples     | `n_lng * n_lat` × `i32`, row-major     |
//!
//! Samples are fixed-point heights (meters × 10000). The value [`NO_DATA`]
//! (999.0000 m) marks a missing sample and maps to `NaN` in memory.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{GeoidError, Result};
use crate::grid::{Grid, GridHeader, VERSION_LEN};

/// Size of the fixed header, in bytes.
pub const HEADER_LEN: usize = 28;

/// Size of one encoded sample, in bytes.
pub const SAMPLE_LEN: usize = 4;

/// Fixed-point scale: one unit is 0.0001 m.
pub const SCALE: f64 = 10_000.0;

/// Fixed-point value reserved for missing samples (999.0000 m).
pub const NO_DATA: i32 = 9_990_000;

/// Convert a height to fixed-point, mapping `NaN` to [`NO_DATA`].
///
/// # Errors
///
/// Fails if the rounded value does not fit an `i32` or would be read back
/// as [`NO_DATA`].
pub(crate) fn to_fixed(height: f64) -> Result<i32> {
    if height.is_nan() {
        return Ok(NO_DATA);
    }
    let scaled = (height * SCALE).round();
    if !(i32::MIN as f64..=i32::MAX as f64).contains(&scaled) {
        return Err(GeoidError::format(format!(
            "height {height} is outside the fixed-point range"
        )));
    }
    let fixed = scaled as i32;
    if fixed == NO_DATA {
        return Err(GeoidError::format(format!(
            "height {height} collides with the no-data sentinel 999.0000"
        )));
    }
    Ok(fixed)
}

/// Convert a fixed-point sample back to meters, mapping [`NO_DATA`] to `NaN`.
#[inline]
pub(crate) fn from_fixed(fixed: i32) -> f64 {
    match fixed {
        NO_DATA => f64::NAN,
        v => v as f64 / SCALE,
    }
}

#[inline]
fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn le_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parse the NUL-padded version field.
fn decode_version(raw: &[u8]) -> Result<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let (tag, padding) = raw.split_at(end);
    if padding.iter().any(|&b| b != 0) {
        return Err(GeoidError::format(
            "version field has data after its NUL padding",
        ));
    }
    if !tag.iter().all(|b| b.is_ascii_graphic()) {
        return Err(GeoidError::format(format!(
            "version field {:?} is not printable ASCII",
            String::from_utf8_lossy(tag)
        )));
    }
    Ok(String::from_utf8_lossy(tag).into_owned())
}

/// Serialize a grid to the binary format.
///
/// # Errors
///
/// Returns [`GeoidError::Format`] if a finite height cannot be represented
/// in fixed-point without colliding with [`NO_DATA`].
pub fn encode(grid: &Grid) -> Result<Vec<u8>> {
    let h = grid.header();
    let mut buf = Vec::with_capacity(HEADER_LEN + h.sample_count() * SAMPLE_LEN);

    buf.extend_from_slice(&h.n_lng.to_le_bytes());
    buf.extend_from_slice(&h.n_lat.to_le_bytes());
    buf.extend_from_slice(&h.lng_denom.to_le_bytes());
    buf.extend_from_slice(&h.lat_denom.to_le_bytes());
    buf.extend_from_slice(&(h.lng_min as f32).to_le_bytes());
    buf.extend_from_slice(&(h.lat_min as f32).to_le_bytes());
    buf.extend_from_slice(&h.kind.to_le_bytes());

    let mut version = [0u8; VERSION_LEN];
    version[..h.version.len()].copy_from_slice(h.version.as_bytes());
    buf.extend_from_slice(&version);

    for &v in grid.values() {
        buf.extend_from_slice(&to_fixed(v)?.to_le_bytes());
    }

    tracing::debug!(
        n_lng = h.n_lng,
        n_lat = h.n_lat,
        bytes = buf.len(),
        "encoded geoid grid"
    );
    Ok(buf)
}

/// Serialize a grid to the binary format and write it out.
pub fn write_binary<W: Write>(grid: &Grid, writer: &mut W) -> Result<()> {
    writer.write_all(&encode(grid)?)?;
    Ok(())
}

/// Deserialize a grid from the binary format.
///
/// The version tag only has to be well-formed; use [`decode_expecting`] to
/// pin a specific model version.
///
/// # Errors
///
/// Returns [`GeoidError::Format`] if the header is truncated or invalid, or if
/// the payload is not exactly `n_lng * n_lat` samples.
pub fn decode(bytes: &[u8]) -> Result<Grid> {
    if bytes.len() < HEADER_LEN {
        return Err(GeoidError::format(format!(
            "truncated header: {} bytes, expected at least {HEADER_LEN}",
            bytes.len()
        )));
    }

    let header = GridHeader {
        n_lng: le_u16(bytes, 0),
        n_lat: le_u16(bytes, 2),
        lng_denom: le_u16(bytes, 4),
        lat_denom: le_u16(bytes, 6),
        lng_min: le_f32(bytes, 8) as f64,
        lat_min: le_f32(bytes, 12) as f64,
        kind: le_u16(bytes, 16),
        version: decode_version(&bytes[18..HEADER_LEN])?,
    };

    let payload = &bytes[HEADER_LEN..];
    let expected = header.sample_count() * SAMPLE_LEN;
    if payload.len() != expected {
        return Err(GeoidError::format(format!(
            "payload is {} bytes, expected {expected} ({} x {} samples of {SAMPLE_LEN} bytes)",
            payload.len(),
            header.n_lng,
            header.n_lat
        )));
    }

    let values = payload
        .chunks_exact(SAMPLE_LEN)
        .map(|c| from_fixed(i32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect();

    tracing::debug!(
        n_lng = header.n_lng,
        n_lat = header.n_lat,
        version = %header.version,
        bytes = bytes.len(),
        "decoded geoid grid"
    );
    Grid::new(header, values)
}

/// Deserialize a grid and require a specific version tag.
pub fn decode_expecting(bytes: &[u8], version: &str) -> Result<Grid> {
    let grid = decode(bytes)?;
    if grid.version() != version {
        return Err(GeoidError::format(format!(
            "unexpected version tag {:?} (expected {:?})",
            grid.version(),
            version
        )));
    }
    Ok(grid)
}

/// Read an entire binary grid from a reader (e.g. a decompressing stream).
pub fn read_binary<R: Read>(reader: &mut R) -> Result<Grid> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode(&buf)
}

/// Load an uncompressed binary grid file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or memory-mapped, or if its
/// contents are not a valid binary grid.
pub fn read_binary_file<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let file = File::open(&path)?;

    // SAFETY: Memory mapping is safe as long as the file is not modified
    // while mapped. The mapping is read-only and dropped before returning.
    let mmap = unsafe { Mmap::map(&file)? };

    decode(&mmap)
}
