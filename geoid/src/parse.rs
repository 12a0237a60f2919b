//! ASCII grid dialects.
//!
//! Two text formats are supported:
//!
//! - **ISG**: a free-text header terminated by a line starting with
//!   `end_of_head ========`, followed by whitespace-separated heights in
//!   row-major order, **northernmost row first**. The grid geometry is not
//!   read from the header; it is supplied as a [`GridHeader`]. Missing
//!   samples are `-9999.0000`.
//! - **ASC**: a single 8-field header line
//!   `lat_min lng_min lat_step lng_step n_lat n_lng kind version`, a blank
//!   line, then `n_lat` rows of `n_lng` heights with exactly four decimals,
//!   **southernmost row first**. Missing samples are `999.0000`.
//!
//! ## Example
//!
//! ```
//! use geoid::parse::{parse_asc, write_asc};
//!
//! let text = "20.00000 120.00000 0.016667 0.025000 2 3 1 ver2.2\n\n\
//!             30.0000 30.1000 999.0000 \n\
//!             31.0000 31.1000 31.2000 \n";
//! let grid = parse_asc(text).unwrap();
//! assert_eq!(grid.n_lng(), 3);
//! assert!(grid.value_at(2, 0).unwrap().is_nan());
//!
//! let mut out = Vec::new();
//! write_asc(&grid, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), text);
//! ```

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::codec::{from_fixed, to_fixed, NO_DATA};
use crate::error::{GeoidError, Result};
use crate::grid::{Grid, GridHeader};

/// Marker line that ends the free-text header of an ISG file.
pub const ISG_END_OF_HEAD: &str = "end_of_head ========";

/// Missing-data token in ISG files.
pub const ISG_NO_DATA: &str = "-9999.0000";

/// Missing-data token in ASC files.
pub const ASC_NO_DATA: &str = "999.0000";

/// Number of decimals carried by every ASC sample.
const ASC_DECIMALS: usize = 4;

/// Layout with its origin rounded to the `f32` the binary header stores,
/// matching what the ASC reader produces for the same origin.
fn quantized_layout(layout: &GridHeader) -> Result<GridHeader> {
    let layout = GridHeader {
        lng_min: layout.lng_min as f32 as f64,
        lat_min: layout.lat_min as f32 as f64,
        ..layout.clone()
    };
    layout.validate()?;
    Ok(layout)
}

/// Collect the height tokens of an ISG file and check their count.
fn isg_tokens<'a>(text: &'a str, layout: &GridHeader) -> Result<Vec<&'a str>> {

    let mut lines = text.lines();
    if !lines
        .by_ref()
        .any(|line| line.trim().starts_with(ISG_END_OF_HEAD))
    {
        return Err(GeoidError::format(format!(
            "ISG header marker {ISG_END_OF_HEAD:?} not found"
        )));
    }

    let tokens: Vec<&str> = lines.flat_map(str::split_whitespace).collect();
    if tokens.len() != layout.sample_count() {
        return Err(GeoidError::format(format!(
            "ISG body has {} values, expected {} ({} x {})",
            tokens.len(),
            layout.sample_count(),
            layout.n_lng,
            layout.n_lat
        )));
    }
    tracing::debug!(values = tokens.len(), "read ISG body");
    Ok(tokens)
}

/// Source row (north-first) that ends up at output row `row` (south-first).
#[inline]
fn flipped_row<'a, 'b>(tokens: &'b [&'a str], layout: &GridHeader, row: usize) -> &'b [&'a str] {
    let n_lng = layout.n_lng as usize;
    let src = layout.n_lat as usize - 1 - row;
    &tokens[src * n_lng..(src + 1) * n_lng]
}

/// Parse an ISG file straight into a [`Grid`] with the given geometry.
///
/// Rows are flipped so that row 0 of the grid is the southern edge. The
/// layout origin is rounded to `f32`, as in the binary header.
///
/// # Errors
///
/// Returns [`GeoidError::Format`] if the header marker is missing, the number
/// of values is not `n_lng * n_lat`, or a value is not a finite number.
pub fn parse_isg(text: &str, layout: &GridHeader) -> Result<Grid> {
    let layout = &quantized_layout(layout)?;
    let tokens = isg_tokens(text, layout)?;

    let mut values = Vec::with_capacity(tokens.len());
    for row in 0..layout.n_lat as usize {
        for (col, &token) in flipped_row(&tokens, layout, row).iter().enumerate() {
            if token == ISG_NO_DATA {
                values.push(f64::NAN);
                continue;
            }
            match token.parse::<f64>() {
                Ok(v) if v.is_finite() => values.push(v),
                _ => {
                    return Err(GeoidError::format(format!(
                        "ISG row {}, column {col}: invalid height {token:?}",
                        layout.n_lat as usize - 1 - row
                    )))
                }
            }
        }
    }

    Grid::new(layout.clone(), values)
}

/// Rewrite an ISG file as ASC text without touching the sample tokens.
///
/// Row `r` of the ISG body becomes row `n_lat - 1 - r` of the output and
/// `-9999.0000` becomes `999.0000`; every other token is copied verbatim.
pub fn convert_isg_to_asc<W: Write>(text: &str, layout: &GridHeader, writer: &mut W) -> Result<()> {
    let layout = &quantized_layout(layout)?;
    let tokens = isg_tokens(text, layout)?;

    write_asc_header(layout, writer)?;
    for row in 0..layout.n_lat as usize {
        for &token in flipped_row(&tokens, layout, row) {
            let token = if token == ISG_NO_DATA {
                ASC_NO_DATA
            } else {
                token
            };
            writer.write_all(token.as_bytes())?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Parse a decimal token with exactly four fractional digits into fixed-point.
fn parse_fixed(token: &str) -> Option<i32> {
    let (negative, digits) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let (int_part, frac_part) = digits.split_once('.')?;
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(int_part) || !is_digits(frac_part) || frac_part.len() != ASC_DECIMALS {
        return None;
    }

    let int: i32 = int_part.parse().ok()?;
    let frac: i32 = frac_part.parse().ok()?;
    let v = int.checked_mul(10_000)?.checked_add(frac)?;
    Some(if negative { -v } else { v })
}

fn parse_field<T: FromStr>(token: &str, name: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| GeoidError::format(format!("cannot parse {name} {token:?} in ASC header")))
}

/// Derive the step denominator from an interval such as `0.016667` (1/60).
fn step_denominator(token: &str, axis: &str) -> Result<u16> {
    let step: f64 = parse_field(token, &format!("{axis} interval"))?;
    if !(step.is_finite() && step > 0.0) {
        return Err(GeoidError::format(format!(
            "{axis} interval {token} must be positive"
        )));
    }

    let denom = (1.0 / step).round();
    if !(1.0..=u16::MAX as f64).contains(&denom)
        || format!("{:.6}", 1.0 / denom) != format!("{step:.6}")
    {
        return Err(GeoidError::format(format!(
            "unexpected {axis} interval {token} (must be 1/n degrees)"
        )));
    }
    Ok(denom as u16)
}

fn parse_asc_header(line: &str) -> Result<GridHeader> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 8 {
        return Err(GeoidError::format(format!(
            "ASC header line must have 8 fields, found {}",
            fields.len()
        )));
    }

    // The binary format stores the origin as f32
    let lat_min: f32 = parse_field(fields[0], "lat_min")?;
    let lng_min: f32 = parse_field(fields[1], "lng_min")?;

    Ok(GridHeader {
        lat_min: lat_min as f64,
        lng_min: lng_min as f64,
        lat_denom: step_denominator(fields[2], "latitude")?,
        lng_denom: step_denominator(fields[3], "longitude")?,
        n_lat: parse_field(fields[4], "n_lat")?,
        n_lng: parse_field(fields[5], "n_lng")?,
        kind: parse_field(fields[6], "kind")?,
        version: fields[7].to_string(),
    })
}

/// Read an ASC grid from a buffered reader.
///
/// # Errors
///
/// Returns [`GeoidError::Format`] on a malformed header, an unexpected step
/// value, a row with the wrong number of values, the wrong number of rows, or
/// a token that is not a four-decimal number. I/O errors are passed through.
pub fn read_asc<R: BufRead>(reader: R) -> Result<Grid> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => parse_asc_header(&line?)?,
        None => return Err(GeoidError::format("empty ASC input")),
    };
    header.validate()?;
    tracing::debug!(
        n_lng = header.n_lng,
        n_lat = header.n_lat,
        version = %header.version,
        "parsed ASC header"
    );

    let n_lng = header.n_lng as usize;
    let n_lat = header.n_lat as usize;
    let mut values = Vec::with_capacity(header.sample_count());
    let mut rows = 0;

    for (idx, line) in lines.enumerate() {
        let line = line?;
        let line_no = idx + 2;
        if line.trim().is_empty() {
            continue;
        }
        if rows == n_lat {
            return Err(GeoidError::format(format!(
                "line {line_no}: more than {n_lat} rows"
            )));
        }

        let start = values.len();
        for token in line.split_whitespace() {
            let fixed = parse_fixed(token).ok_or_else(|| {
                GeoidError::format(format!("line {line_no}: invalid height {token:?}"))
            })?;
            values.push(from_fixed(fixed));
        }
        let found = values.len() - start;
        if found != n_lng {
            return Err(GeoidError::format(format!(
                "line {line_no}: expected {n_lng} values, found {found}"
            )));
        }
        rows += 1;
    }

    if rows != n_lat {
        return Err(GeoidError::format(format!(
            "expected {n_lat} rows, found {rows}"
        )));
    }

    Grid::new(header, values)
}

/// Parse ASC text held in memory.
pub fn parse_asc(text: &str) -> Result<Grid> {
    read_asc(text.as_bytes())
}

fn write_asc_header<W: Write>(header: &GridHeader, writer: &mut W) -> Result<()> {
    if header.version.is_empty() {
        return Err(GeoidError::format(
            "ASC output requires a non-empty version tag",
        ));
    }
    writeln!(
        writer,
        "{:.5} {:.5} {:.6} {:.6} {} {} {} {}",
        header.lat_min,
        header.lng_min,
        header.lat_step(),
        header.lng_step(),
        header.n_lat,
        header.n_lng,
        header.kind,
        header.version
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Write a grid as ASC text, southernmost row first.
///
/// Heights are rounded to four decimals; missing samples are written as
/// `999.0000`.
///
/// # Errors
///
/// Fails if the version tag is empty, or if a height would be written as the
/// missing-data token.
pub fn write_asc<W: Write>(grid: &Grid, writer: &mut W) -> Result<()> {
    write_asc_header(grid.header(), writer)?;
    for row in grid.rows() {
        for &v in row {
            let fixed = to_fixed(v)?;
            if fixed == NO_DATA {
                writer.write_all(ASC_NO_DATA.as_bytes())?;
                writer.write_all(b" ")?;
            } else {
                let sign = if fixed < 0 { "-" } else { "" };
                let abs = fixed.unsigned_abs();
                write!(writer, "{sign}{}.{:04} ", abs / 10_000, abs % 10_000)?;
            }
        }
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMMY_ASC: &str = concat!(
        "20.00000 120.00000 0.016667 0.025000 3 4 1 ver2.2\n",
        "\n",
        "30.0000 30.1000 30.2000 30.3000 \n",
        "31.0000 999.0000 -0.5000 31.3000 \n",
        "32.0000 32.1000 32.2000 32.3000 \n",
    );

    fn small_layout() -> GridHeader {
        GridHeader {
            lng_min: 120.0,
            lat_min: 15.0,
            lng_denom: 40,
            lat_denom: 60,
            n_lng: 3,
            n_lat: 2,
            kind: 1,
            version: "ver-beta".to_string(),
        }
    }

    const SMALL_ISG: &str = "\
begin_of_head ================================================
model name     : TEST
nrows          : 2
ncols          : 3
end_of_head ==================================================
   40.1000   40.2000 -9999.0000
   10.1000   10.2000   10.3000
";

    #[test]
    fn test_parse_asc() {
        let grid = parse_asc(DUMMY_ASC).unwrap();
        assert_eq!(grid.n_lng(), 4);
        assert_eq!(grid.n_lat(), 3);
        assert_eq!(grid.lng_denom(), 40);
        assert_eq!(grid.lat_denom(), 60);
        assert_eq!(grid.lng_min(), 120.0);
        assert_eq!(grid.lat_min(), 20.0);
        assert_eq!(grid.kind(), 1);
        assert_eq!(grid.version(), "ver2.2");

        assert_eq!(grid.value_at(0, 0), Some(30.0));
        assert_eq!(grid.value_at(3, 2), Some(32.3));
        assert_eq!(grid.value_at(2, 1), Some(-0.5));
        assert!(grid.value_at(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_parse_asc_without_trailing_spaces() {
        let text = "20.00000 120.00000 0.016667 0.025000 1 2 1 ver2.2\n\n1.0000 2.0000";
        let grid = parse_asc(text).unwrap();
        assert_eq!(grid.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_write_asc_reproduces_input() {
        let grid = parse_asc(DUMMY_ASC).unwrap();
        let mut out = Vec::new();
        write_asc(&grid, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), DUMMY_ASC);
    }

    #[test]
    fn test_broken_asc_headers() {
        let headers = [
            "20.aaa00 120.00000 0.016667 0.025000 1801 1201 1 ver2.2",
            "20.00000 120.0bbb0 0.016667 0.025000 1801 1201 1 ver2.2",
            "20.00000 120.00000 0.116667 0.025000 1801 1201 1 ver2.2",
            "20.00000 120.00000 0.016667 0.225000 1801 1201 1 ver2.2",
            "20.00000 120.00000 0.016667 0.025000 -1801 1201 1 ver2.2",
            "20.00000 120.00000 0.016667 0.025000 1801 -1201 1 ver2.2",
            "20.00000 120.00000 0.016667 0.025000 1801 1201 z ver2.2",
            "20.00000 120.00000 0.016667 0.025000 1801 1201 1 ver2.2 foobar",
            "20.00000 120.00000 0.016667 0.025000 1801 1201 1 ver2.2\n000.000a",
            "20.00000 120.00000 0.000000 0.025000 1801 1201 1 ver2.2",
            "",
        ];

        for h in headers {
            let err = parse_asc(h).unwrap_err();
            assert!(matches!(err, GeoidError::Format { .. }), "{h:?}: {err}");
        }
    }

    #[test]
    fn test_asc_dimension_mismatch() {
        // Short row
        let text = "20.00000 120.00000 0.016667 0.025000 2 2 1 v\n\n1.0000 2.0000\n3.0000\n";
        let err = parse_asc(text).unwrap_err();
        assert!(err.to_string().contains("line 4"));

        // Missing row
        let text = "20.00000 120.00000 0.016667 0.025000 2 2 1 v\n\n1.0000 2.0000\n";
        assert!(parse_asc(text).is_err());

        // Extra row
        let text = "20.00000 120.00000 0.016667 0.025000 1 2 1 v\n\n1.0000 2.0000\n3.0000 4.0000\n";
        assert!(parse_asc(text).is_err());
    }

    #[test]
    fn test_asc_tokens_need_four_decimals() {
        for token in ["1.000", "1.00000", "1", ".5000", "1.0a00", "--1.0000", "nan"] {
            let text = format!("20.00000 120.00000 0.016667 0.025000 1 1 1 v\n\n{token}\n");
            assert!(parse_asc(&text).is_err(), "{token} should be rejected");
        }
        assert_eq!(parse_fixed("-12.3456"), Some(-123456));
        assert_eq!(parse_fixed("+0.0001"), Some(1));
        assert_eq!(parse_fixed("999.0000"), Some(NO_DATA));
    }

    #[test]
    fn test_step_denominator() {
        assert_eq!(step_denominator("0.016667", "latitude").unwrap(), 60);
        assert_eq!(step_denominator("0.025000", "longitude").unwrap(), 40);
        assert_eq!(step_denominator("0.025", "longitude").unwrap(), 40);
        assert_eq!(step_denominator("1.000000", "longitude").unwrap(), 1);
        assert!(step_denominator("0.030000", "longitude").is_err());
        assert!(step_denominator("-0.025000", "longitude").is_err());
    }

    #[test]
    fn test_parse_isg_flips_rows() {
        let grid = parse_isg(SMALL_ISG, &small_layout()).unwrap();
        assert_eq!(grid.version(), "ver-beta");
        // South row first
        assert_eq!(grid.value_at(0, 0), Some(10.1));
        assert_eq!(grid.value_at(2, 0), Some(10.3));
        assert_eq!(grid.value_at(1, 1), Some(40.2));
        assert!(grid.value_at(2, 1).unwrap().is_nan());
    }

    #[test]
    fn test_convert_isg_to_asc() {
        let mut out = Vec::new();
        convert_isg_to_asc(SMALL_ISG, &small_layout(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "15.00000 120.00000 0.016667 0.025000 2 3 1 ver-beta\n\n\
             10.1000 10.2000 10.3000 \n\
             40.1000 40.2000 999.0000 \n"
        );

        // The ASC output parses to the same grid as the direct ISG path
        let via_asc = parse_asc(&text).unwrap();
        let direct = parse_isg(SMALL_ISG, &small_layout()).unwrap();
        assert_eq!(via_asc.header(), direct.header());
        for (a, b) in via_asc.values().iter().zip(direct.values()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn test_isg_origin_rounds_like_asc() {
        let layout = GridHeader {
            lng_min: 122.9,
            lat_min: 24.1,
            ..small_layout()
        };
        let grid = parse_isg(SMALL_ISG, &layout).unwrap();
        assert_eq!(grid.lng_min(), 122.9f32 as f64);
        assert_eq!(grid.lat_min(), 24.1f32 as f64);

        let mut out = Vec::new();
        convert_isg_to_asc(SMALL_ISG, &layout, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("24.10000 122.90000 "));

        let via_asc = parse_asc(&text).unwrap();
        assert_eq!(via_asc.header(), grid.header());

        let nan_origin = GridHeader {
            lng_min: f64::NAN,
            ..small_layout()
        };
        assert!(parse_isg(SMALL_ISG, &nan_origin).is_err());
    }

    #[test]
    fn test_isg_errors() {
        let layout = small_layout();

        let no_marker = "model name : TEST\n1.0 2.0 3.0\n4.0 5.0 6.0\n";
        let err = parse_isg(no_marker, &layout).unwrap_err();
        assert!(err.to_string().contains("end_of_head"));

        let short = "end_of_head ========\n1.0 2.0 3.0\n4.0 5.0\n";
        let err = parse_isg(short, &layout).unwrap_err();
        assert!(err.to_string().contains("5 values"));
        assert!(convert_isg_to_asc(short, &layout, &mut Vec::new()).is_err());

        let bad = "end_of_head ========\n1.0 2.0 3.0\n4.0 x 6.0\n";
        assert!(parse_isg(bad, &layout).is_err());
    }
}
