//! Height queries over a loaded geoid model.
//!
//! [`GeoidModel`] wraps a [`Grid`] behind an [`Arc`], so a model can be cloned
//! cheaply and queried from any number of threads without locking.
//!
//! ```ignore
//! use geoid::GeoidModel;
//!
//! let model = GeoidModel::builder("/data/gsigeo2011_ver2_2.bin")
//!     .expected_version("ver2.2")
//!     .build()?;
//!
//! let h = model.get_height(138.2839817085188, 37.12378643088312);
//! println!("Geoid height: {h:.4}m");
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::codec::read_binary_file;
use crate::error::{GeoidError, Result};
use crate::grid::Grid;
use crate::interpolate;
use crate::parse::read_asc;

/// Environment variable holding the model file path.
pub const ENV_MODEL_PATH: &str = "GEOID_MODEL_PATH";
/// Environment variable selecting the model format (`auto`, `asc`, `bin`).
pub const ENV_MODEL_FORMAT: &str = "GEOID_MODEL_FORMAT";
/// Environment variable pinning the expected version tag.
pub const ENV_EXPECTED_VERSION: &str = "GEOID_EXPECTED_VERSION";

/// A source of geoid heights.
pub trait Geoid {
    /// Geoid height at `(lng, lat)` in meters, or `NaN` where no height is available.
    fn get_height(&self, lng: f64, lat: f64) -> f64;

    /// Geoid heights for paired longitude/latitude slices.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::Shape`] if the slices differ in length.
    fn get_heights(&self, lngs: &[f64], lats: &[f64]) -> Result<Vec<f64>> {
        check_shape(lngs, lats)?;
        Ok(lngs
            .iter()
            .zip(lats)
            .map(|(&lng, &lat)| self.get_height(lng, lat))
            .collect())
    }
}

impl Geoid for Grid {
    #[inline]
    fn get_height(&self, lng: f64, lat: f64) -> f64 {
        interpolate::height(self, lng, lat)
    }
}

fn check_shape(lngs: &[f64], lats: &[f64]) -> Result<()> {
    if lngs.len() != lats.len() {
        return Err(GeoidError::Shape {
            lngs: lngs.len(),
            lats: lats.len(),
        });
    }
    Ok(())
}

/// A loaded geoid model answering height queries.
#[derive(Debug, Clone)]
pub struct GeoidModel {
    grid: Arc<Grid>,
}

impl GeoidModel {
    /// Wrap a grid for querying.
    pub fn new(grid: Grid) -> Self {
        Self {
            grid: Arc::new(grid),
        }
    }

    /// Create a builder that loads a model file.
    pub fn builder<P: AsRef<Path>>(path: P) -> GeoidModelBuilder {
        GeoidModelBuilder::new(path)
    }

    /// The underlying grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Interpolated geoid height at `(lng, lat)` in meters.
    ///
    /// Returns `NaN` outside the model's coverage or where samples are
    /// missing. Never fails.
    #[inline]
    pub fn get_height(&self, lng: f64, lat: f64) -> f64 {
        interpolate::height(&self.grid, lng, lat)
    }

    /// Heights for paired longitude/latitude slices, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::Shape`] if the slices differ in length.
    pub fn get_heights(&self, lngs: &[f64], lats: &[f64]) -> Result<Vec<f64>> {
        Geoid::get_heights(&*self.grid, lngs, lats)
    }

    /// Heights for a slice of `(lng, lat)` pairs, in input order.
    pub fn get_points(&self, points: &[(f64, f64)]) -> Vec<f64> {
        points
            .iter()
            .map(|&(lng, lat)| self.get_height(lng, lat))
            .collect()
    }

    /// Same as [`Self::get_heights`], computed in parallel with rayon.
    #[cfg(feature = "parallel")]
    pub fn par_get_heights(&self, lngs: &[f64], lats: &[f64]) -> Result<Vec<f64>> {
        use rayon::prelude::*;

        check_shape(lngs, lats)?;
        Ok(lngs
            .par_iter()
            .zip(lats.par_iter())
            .map(|(&lng, &lat)| self.get_height(lng, lat))
            .collect())
    }
}

impl Geoid for GeoidModel {
    #[inline]
    fn get_height(&self, lng: f64, lat: f64) -> f64 {
        GeoidModel::get_height(self, lng, lat)
    }
}

/// On-disk representation of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    /// Pick the format from the file extension.
    Auto,
    /// ASC text grid.
    Asc,
    /// Uncompressed binary grid.
    Binary,
}

impl GridFormat {
    /// Parse a format name: `auto`, `asc`, `bin` or `binary` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "auto" => Some(GridFormat::Auto),
            "asc" => Some(GridFormat::Asc),
            "bin" | "binary" => Some(GridFormat::Binary),
            _ => None,
        }
    }

    /// Detect the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::UnsupportedFormat`] for anything other than
    /// `.asc` or `.bin`.
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "asc" => Ok(GridFormat::Asc),
            "bin" => Ok(GridFormat::Binary),
            _ => Err(GeoidError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Builder that loads a [`GeoidModel`] from a file.
///
/// # Example
///
/// ```ignore
/// use geoid::{GeoidModelBuilder, GridFormat};
///
/// let model = GeoidModelBuilder::new("/data/gsigeo2011_ver2_2.asc")
///     .format(GridFormat::Asc)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct GeoidModelBuilder {
    path: PathBuf,
    format: GridFormat,
    expected_version: Option<String>,
}

impl GeoidModelBuilder {
    /// Create a builder for the model at `path`, with format auto-detection.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: GridFormat::Auto,
            expected_version: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOID_MODEL_PATH` | Path to a `.asc` or `.bin` model | Required |
    /// | `GEOID_MODEL_FORMAT` | `auto`, `asc` or `bin` | `auto` |
    /// | `GEOID_EXPECTED_VERSION` | Version tag the model must carry | None |
    ///
    /// # Errors
    ///
    /// Returns an error if `GEOID_MODEL_PATH` is not set or
    /// `GEOID_MODEL_FORMAT` is not a known format name.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ENV_MODEL_PATH).map_err(|_| {
            GeoidError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{ENV_MODEL_PATH} environment variable not set"),
            ))
        })?;

        let format = match std::env::var(ENV_MODEL_FORMAT) {
            Ok(name) => GridFormat::from_name(&name).ok_or_else(|| {
                GeoidError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{ENV_MODEL_FORMAT}={name} is not one of auto, asc, bin"),
                ))
            })?,
            Err(_) => GridFormat::Auto,
        };

        let expected_version = std::env::var(ENV_EXPECTED_VERSION)
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            path: PathBuf::from(path),
            format,
            expected_version,
        })
    }

    /// Set the model path.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Set the file format instead of detecting it from the extension.
    pub fn format(mut self, format: GridFormat) -> Self {
        self.format = format;
        self
    }

    /// Require the loaded model to carry this version tag.
    pub fn expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }

    /// Load the model.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::FileNotFound`] if the file does not exist,
    /// [`GeoidError::UnsupportedFormat`] if auto-detection fails, and
    /// [`GeoidError::Format`] if the contents are invalid or the version tag
    /// does not match.
    pub fn build(self) -> Result<GeoidModel> {
        if !self.path.exists() {
            return Err(GeoidError::FileNotFound { path: self.path });
        }

        let format = match self.format {
            GridFormat::Auto => GridFormat::detect(&self.path)?,
            f => f,
        };

        let start = Instant::now();
        let grid = match format {
            GridFormat::Binary => read_binary_file(&self.path)?,
            _ => read_asc(BufReader::new(File::open(&self.path)?))?,
        };

        if let Some(expected) = &self.expected_version {
            if grid.version() != expected {
                return Err(GeoidError::format(format!(
                    "{}: unexpected version tag {:?} (expected {:?})",
                    self.path.display(),
                    grid.version(),
                    expected
                )));
            }
        }

        tracing::info!(
            path = %self.path.display(),
            format = ?format,
            n_lng = grid.n_lng(),
            n_lat = grid.n_lat(),
            version = %grid.version(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded geoid model"
        );

        Ok(GeoidModel::new(grid))
    }
}
