//! Bilinear interpolation over a geoid grid.

use crate::grid::Grid;

/// Interpolated geoid height at `(lng, lat)`, in meters.
///
/// Returns `NaN` when the point lies outside the grid or when a sample needed
/// by the interpolation is missing. Points exactly on a grid line only use the
/// two samples along that line, so queries on the northern or eastern edge
/// never touch samples beyond the grid.
///
/// # Example
///
/// ```
/// use geoid::{interpolate::height, Grid, GridHeader};
///
/// let header = GridHeader {
///     lng_min: 120.0,
///     lat_min: 20.0,
///     lng_denom: 1,
///     lat_denom: 1,
///     n_lng: 2,
///     n_lat: 2,
///     kind: 1,
///     version: "test".to_string(),
/// };
/// let grid = Grid::new(header, vec![10.0, 20.0, 30.0, 40.0]).unwrap();
///
/// assert_eq!(height(&grid, 120.5, 20.5), 25.0);
/// assert_eq!(height(&grid, 121.0, 21.0), 40.0);
/// assert!(height(&grid, 10.0, 10.0).is_nan());
/// ```
#[inline]
pub fn height(grid: &Grid, lng: f64, lat: f64) -> f64 {
    let gx = (lng - grid.lng_min()) * grid.lng_denom() as f64;
    let gy = (lat - grid.lat_min()) * grid.lat_denom() as f64;

    // Also rejects NaN input
    if !(gx >= 0.0 && gy >= 0.0) {
        return f64::NAN;
    }

    let x0 = gx.floor();
    let y0 = gy.floor();
    if x0 >= grid.n_lng() as f64 || y0 >= grid.n_lat() as f64 {
        return f64::NAN;
    }

    let (ix, iy) = (x0 as usize, y0 as usize);
    let corner = |dx: usize, dy: usize| grid.value_at(ix + dx, iy + dy).unwrap_or(f64::NAN);

    bilinear(
        gx - x0,
        gy - y0,
        corner(0, 0),
        corner(1, 0),
        corner(0, 1),
        corner(1, 1),
    )
}

/// Blend the four corners of a cell.
///
/// `v01` is the eastern neighbor of `v00`, `v10` the northern one. Exact
/// alignment with a grid line skips the corners that carry zero weight, so a
/// missing sample there cannot turn the result into `NaN`.
#[inline]
fn bilinear(fx: f64, fy: f64, v00: f64, v01: f64, v10: f64, v11: f64) -> f64 {
    if fx == 0.0 && fy == 0.0 {
        v00
    } else if fx == 0.0 {
        v00 * (1.0 - fy) + v10 * fy
    } else if fy == 0.0 {
        v00 * (1.0 - fx) + v01 * fx
    } else {
        v00 * (1.0 - fx) * (1.0 - fy)
            + v01 * fx * (1.0 - fy)
            + v10 * (1.0 - fx) * fy
            + v11 * fx * fy
    }
}
