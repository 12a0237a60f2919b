//! In-memory geoid grid model.
//!
//! A [`Grid`] is a header ([`GridHeader`]) plus a flat, row-major array of
//! height samples in meters. Row 0 is the southern edge (`lat_min`) and
//! column 0 the western edge (`lng_min`); missing samples are `NaN`.
//!
//! Grids are validated once on construction and never mutated afterwards.

use crate::error::{GeoidError, Result};

/// Maximum length of the version tag, in bytes (fixed width of the binary header field).
pub const VERSION_LEN: usize = 10;

/// Header metadata of a geoid grid.
///
/// Grid spacing along each axis is `1 / denom` degrees, so a longitude
/// denominator of 40 means 0.025° between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    /// Longitude of the western edge, degrees.
    pub lng_min: f64,
    /// Latitude of the southern edge, degrees.
    pub lat_min: f64,
    /// Longitude step denominator.
    pub lng_denom: u16,
    /// Latitude step denominator.
    pub lat_denom: u16,
    /// Number of samples along the longitude axis.
    pub n_lng: u16,
    /// Number of samples along the latitude axis.
    pub n_lat: u16,
    /// Grid convention tag, carried through unchanged.
    pub kind: u16,
    /// Short identifying tag, at most [`VERSION_LEN`] printable ASCII bytes.
    pub version: String,
}

impl GridHeader {
    /// Geometry of the GSIGEO2024 (beta) model as distributed in ISG form.
    ///
    /// 1601 × 2101 samples at 1.5' × 1' spacing, south-west corner at
    /// 120°E 15°N.
    pub fn gsigeo2024_beta() -> Self {
        Self {
            lng_min: 120.0,
            lat_min: 15.0,
            lng_denom: 40,
            lat_denom: 60,
            n_lng: 1601,
            n_lat: 2101,
            kind: 1,
            version: "ver-beta".to_string(),
        }
    }

    /// Total number of samples described by this header.
    pub fn sample_count(&self) -> usize {
        self.n_lng as usize * self.n_lat as usize
    }

    /// Longitude spacing in degrees.
    pub fn lng_step(&self) -> f64 {
        1.0 / self.lng_denom as f64
    }

    /// Latitude spacing in degrees.
    pub fn lat_step(&self) -> f64 {
        1.0 / self.lat_denom as f64
    }

    /// Check that the header can describe a grid and survive a binary round trip.
    pub fn validate(&self) -> Result<()> {
        if self.n_lng == 0 || self.n_lat == 0 {
            return Err(GeoidError::format(format!(
                "grid dimensions must be non-zero (got {} x {})",
                self.n_lng, self.n_lat
            )));
        }
        if self.lng_denom == 0 || self.lat_denom == 0 {
            return Err(GeoidError::format("step denominators must be non-zero"));
        }
        for (name, v) in [("lng_min", self.lng_min), ("lat_min", self.lat_min)] {
            // The binary header stores the origin as float32
            if !v.is_finite() || (v as f32) as f64 != v {
                return Err(GeoidError::format(format!(
                    "{name} {v} is not representable as a 32-bit float"
                )));
            }
        }
        if self.version.len() > VERSION_LEN {
            return Err(GeoidError::format(format!(
                "version tag {:?} is longer than {VERSION_LEN} bytes",
                self.version
            )));
        }
        if !self.version.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(GeoidError::format(format!(
                "version tag {:?} must be printable ASCII without spaces",
                self.version
            )));
        }
        Ok(())
    }
}

/// Rectangle covered by a grid, in degrees (inclusive on all edges).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub lng_min: f64,
    pub lng_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Coverage {
    /// Whether `(lng, lat)` lies inside the rectangle.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.lng_min..=self.lng_max).contains(&lng) && (self.lat_min..=self.lat_max).contains(&lat)
    }
}

/// Summary statistics over the samples of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSummary {
    /// Smallest finite height, or `None` if every sample is missing.
    pub min: Option<f64>,
    /// Largest finite height, or `None` if every sample is missing.
    pub max: Option<f64>,
    /// Number of missing samples.
    pub no_data: usize,
    /// Total number of samples.
    pub total: usize,
}

/// An immutable geoid grid.
///
/// # Example
///
/// ```
/// use geoid::{Grid, GridHeader};
///
/// let header = GridHeader {
///     lng_min: 120.0,
///     lat_min: 20.0,
///     lng_denom: 40,
///     lat_denom: 60,
///     n_lng: 2,
///     n_lat: 2,
///     kind: 1,
///     version: "ver2.2".to_string(),
/// };
/// let grid = Grid::new(header, vec![30.0, 31.0, 32.0, f64::NAN]).unwrap();
/// assert_eq!(grid.value_at(1, 0), Some(31.0));
/// assert!(grid.value_at(1, 1).unwrap().is_nan());
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    header: GridHeader,
    values: Vec<f64>,
}

impl Grid {
    /// Build a grid from a header and row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::Format`] if the header is invalid (see
    /// [`GridHeader::validate`]) or `values.len() != n_lng * n_lat`.
    pub fn new(header: GridHeader, values: Vec<f64>) -> Result<Self> {
        header.validate()?;
        if values.len() != header.sample_count() {
            return Err(GeoidError::format(format!(
                "expected {} samples for a {} x {} grid, got {}",
                header.sample_count(),
                header.n_lng,
                header.n_lat,
                values.len()
            )));
        }
        Ok(Self { header, values })
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn lng_min(&self) -> f64 {
        self.header.lng_min
    }

    pub fn lat_min(&self) -> f64 {
        self.header.lat_min
    }

    pub fn lng_denom(&self) -> u16 {
        self.header.lng_denom
    }

    pub fn lat_denom(&self) -> u16 {
        self.header.lat_denom
    }

    pub fn n_lng(&self) -> u16 {
        self.header.n_lng
    }

    pub fn n_lat(&self) -> u16 {
        self.header.n_lat
    }

    pub fn kind(&self) -> u16 {
        self.header.kind
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    /// Longitude spacing in degrees.
    pub fn lng_step(&self) -> f64 {
        self.header.lng_step()
    }

    /// Latitude spacing in degrees.
    pub fn lat_step(&self) -> f64 {
        self.header.lat_step()
    }

    /// Row-major samples, indexed `lat_idx * n_lng + lng_idx`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sample at a grid node, or `None` if the index is outside the grid.
    ///
    /// A missing sample is returned as `Some(NaN)`.
    #[inline]
    pub fn value_at(&self, lng_idx: usize, lat_idx: usize) -> Option<f64> {
        let n_lng = self.header.n_lng as usize;
        if lng_idx >= n_lng || lat_idx >= self.header.n_lat as usize {
            return None;
        }
        Some(self.values[lat_idx * n_lng + lng_idx])
    }

    /// Iterate over rows from south to north.
    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        self.values.chunks(self.header.n_lng as usize)
    }

    /// Rectangle spanned by the grid nodes.
    pub fn coverage(&self) -> Coverage {
        let h = &self.header;
        Coverage {
            lng_min: h.lng_min,
            lng_max: h.lng_min + (h.n_lng - 1) as f64 / h.lng_denom as f64,
            lat_min: h.lat_min,
            lat_max: h.lat_min + (h.n_lat - 1) as f64 / h.lat_denom as f64,
        }
    }

    /// Compute min/max height and the number of missing samples.
    pub fn summary(&self) -> GridSummary {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut no_data = 0;
        for &v in &self.values {
            if v.is_nan() {
                no_data += 1;
                continue;
            }
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        GridSummary {
            min,
            max,
            no_data,
            total: self.values.len(),
        }
    }
}
