//! # geoid - Geoid Grid Models
//!
//! Load national geoid grid models and query geoid heights offline, without
//! re-parsing large ASCII grids on every run.
//!
//! ## Features
//!
//! - **Two text dialects**: the ISG interchange format and the normalized ASC grid
//! - **Compact binary format**: 4 bytes per sample, fixed-point at 0.0001 m
//! - **Bilinear interpolation** with `NaN` for missing data and out-of-coverage points
//! - **Thread-safe queries**: a loaded model is immutable and cheap to share
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoid::{codec, parse, GeoidModel, GridHeader};
//!
//! // Convert the distributed ISG file once...
//! let isg = std::fs::read_to_string("/data/GSIGEO2024beta.isg")?;
//! let grid = parse::parse_isg(&isg, &GridHeader::gsigeo2024_beta())?;
//! std::fs::write("/data/gsigeo2024_beta.bin", codec::encode(&grid)?)?;
//!
//! // ...then load the binary model for queries
//! let model = GeoidModel::builder("/data/gsigeo2024_beta.bin").build()?;
//! let height = model.get_height(138.2839817085188, 37.12378643088312);
//! println!("Geoid height: {height:.4}m");
//! ```
//!
//! ## Data Conventions
//!
//! Grid spacing is `1 / denom` degrees per axis. Samples are stored row-major
//! from the south-west corner; missing samples are `NaN` in memory,
//! `999.0000` in ASC text and `-9999.0000` in ISG text.

pub mod codec;
pub mod error;
pub mod grid;
pub mod interpolate;
pub mod parse;
pub mod query;

// Re-export main types at crate root for convenience
pub use error::{GeoidError, Result};
pub use grid::{Coverage, Grid, GridHeader, GridSummary};
pub use query::{Geoid, GeoidModel, GeoidModelBuilder, GridFormat};
