use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use geoid::{codec, parse, Grid, GridHeader};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::{format_extension, is_gzipped, open_input, read_grid};

pub fn run(input: PathBuf, output: PathBuf, gzip: bool, layout: GridHeader) -> Result<()> {
    let in_ext = format_extension(&input);
    let out_ext = format_extension(&output);
    if !matches!(out_ext.as_str(), "asc" | "bin") {
        bail!("Unsupported output format '{}': use .asc or .bin", out_ext);
    }

    let bytes = match (in_ext.as_str(), out_ext.as_str()) {
        // Keep ISG tokens verbatim rather than round-tripping through floats
        ("isg", "asc") => {
            let text = read_text(&input)?;
            let mut out = Vec::new();
            parse::convert_isg_to_asc(&text, &layout, &mut out)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            out
        }
        _ => {
            let grid = if in_ext == "isg" {
                let text = read_text(&input)?;
                parse::parse_isg(&text, &layout)
                    .with_context(|| format!("Failed to parse {}", input.display()))?
            } else {
                read_grid(&input)?
            };
            encode_grid(&grid, &out_ext)?
        }
    };

    write_output(&output, gzip || is_gzipped(&output), &bytes)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        bytes = bytes.len(),
        "Conversion complete"
    );
    println!("Wrote {}", output.display());
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let mut text = String::new();
    open_input(path)?
        .read_to_string(&mut text)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(text)
}

fn encode_grid(grid: &Grid, ext: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match ext {
        "asc" => parse::write_asc(grid, &mut out).context("Failed to write ASC grid")?,
        _ => codec::write_binary(grid, &mut out).context("Failed to encode binary grid")?,
    }
    Ok(out)
}

fn write_output(path: &Path, gzip: bool, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::fast());
        encoder.write_all(bytes)?;
        encoder.finish()?.flush()?;
    } else {
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    Ok(())
}
