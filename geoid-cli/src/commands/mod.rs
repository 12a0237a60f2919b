pub mod batch;
pub mod convert;
pub mod info;
pub mod query;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use geoid::{codec, parse, GeoidModel, GeoidModelBuilder, Grid};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Whether `path` ends in `.gz`.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Lower-cased format extension of `path`, looking through a trailing `.gz`.
pub fn format_extension(path: &Path) -> String {
    let inner = if is_gzipped(path) {
        Path::new(path.file_stem().unwrap_or_default())
    } else {
        path
    };
    inner
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Open a file, transparently decompressing `.gz`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if is_gzipped(path) {
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

/// Read an ASC or binary grid, gzipped or not.
pub fn read_grid(path: &Path) -> Result<Grid> {
    let mut input = open_input(path)?;
    let grid = match format_extension(path).as_str() {
        "asc" => parse::read_asc(BufReader::new(input)),
        "bin" => codec::read_binary(&mut input),
        ext => bail!("Unsupported model format '{}': use .asc or .bin", ext),
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(grid)
}

/// Resolve the model path from `--model` / `GEOID_MODEL_PATH` and load it.
pub fn load_model(model: Option<PathBuf>, expected_version: Option<String>) -> Result<GeoidModel> {
    let path = model.context(
        "No geoid model given. Use --model or set GEOID_MODEL_PATH",
    )?;

    // Uncompressed models go through the library loader (memory-mapped for .bin)
    if !is_gzipped(&path) {
        let mut builder = GeoidModelBuilder::new(&path);
        if let Some(version) = expected_version {
            builder = builder.expected_version(version);
        }
        return builder.build().context("Failed to load geoid model");
    }

    let grid = read_grid(&path)?;
    if let Some(expected) = expected_version {
        if grid.version() != expected {
            bail!(
                "Unexpected model version '{}' (expected '{}')",
                grid.version(),
                expected
            );
        }
    }
    tracing::info!(
        path = %path.display(),
        n_lng = grid.n_lng(),
        n_lat = grid.n_lat(),
        version = %grid.version(),
        "Loaded compressed geoid model"
    );
    Ok(GeoidModel::new(grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extension() {
        assert_eq!(format_extension(Path::new("a/model.bin")), "bin");
        assert_eq!(format_extension(Path::new("model.bin.gz")), "bin");
        assert_eq!(format_extension(Path::new("MODEL.ASC.GZ")), "asc");
        assert_eq!(format_extension(Path::new("model.isg")), "isg");
        assert_eq!(format_extension(Path::new("model")), "");
        assert!(is_gzipped(Path::new("model.asc.gz")));
        assert!(!is_gzipped(Path::new("model.asc")));
    }
}
