//! Basic example demonstrating geoid library usage.
//!
//! Run with: cargo run --example basic -- [/path/to/model.bin]
//!
//! Without a path, a small synthetic grid around Tokyo is used.

use geoid::{codec, GeoidError, GeoidModel, Grid, GridHeader};
use std::env;

fn synthetic_model() -> Result<GeoidModel, GeoidError> {
    // 1° x 1° at 1.5' x 1' spacing from 139°E 35°N
    let header = GridHeader {
        lng_min: 139.0,
        lat_min: 35.0,
        lng_denom: 40,
        lat_denom: 60,
        n_lng: 41,
        n_lat: 61,
        kind: 1,
        version: "demo".to_string(),
    };
    let values = (0..header.sample_count())
        .map(|i| {
            let (row, col) = (i / 41, i % 41);
            36.0 + row as f64 * 0.01 + col as f64 * 0.02
        })
        .collect();
    let grid = Grid::new(header, values)?;

    // Round-trip through the binary format, as a converted model would be stored
    let bytes = codec::encode(&grid)?;
    println!("Encoded synthetic grid: {} bytes", bytes.len());
    Ok(GeoidModel::new(codec::decode(&bytes)?))
}

fn main() -> Result<(), GeoidError> {
    let model = match env::args().nth(1) {
        Some(path) => GeoidModel::builder(path).build()?,
        None => synthetic_model()?,
    };

    let grid = model.grid();
    println!(
        "Model {} ({} x {} samples)",
        grid.version(),
        grid.n_lng(),
        grid.n_lat()
    );

    let locations = [
        ("Tokyo Station", 139.7671, 35.6812),
        ("Mount Fuji", 138.7274, 35.3606),
        ("Null Island", 0.0, 0.0),
    ];

    println!("Geoid heights (bilinear):");
    println!("{:-<50}", "");

    for (name, lng, lat) in &locations {
        let h = model.get_height(*lng, *lat);
        if h.is_nan() {
            println!("{}: no data", name);
        } else {
            println!("{}: {:.4}m", name, h);
        }
    }

    // Batch queries keep input order
    let lngs: Vec<f64> = locations.iter().map(|l| l.1).collect();
    let lats: Vec<f64> = locations.iter().map(|l| l.2).collect();
    let heights = model.get_heights(&lngs, &lats)?;
    let with_data = heights.iter().filter(|h| !h.is_nan()).count();
    println!("\nBatch: {} of {} points have data", with_data, heights.len());

    Ok(())
}
