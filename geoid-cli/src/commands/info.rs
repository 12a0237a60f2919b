use anyhow::Result;
use std::path::PathBuf;

use super::load_model;

pub fn run(model: Option<PathBuf>, expected_version: Option<String>) -> Result<()> {
    let file_size = model
        .as_ref()
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len());
    let path = model.clone();
    let model = load_model(model, expected_version)?;
    let grid = model.grid();
    let coverage = grid.coverage();
    let summary = grid.summary();

    if let Some(path) = path {
        println!("Model: {}", path.display());
    }
    println!("Version: {}", grid.version());
    println!("Kind: {}", grid.kind());
    println!();
    println!(
        "Grid: {} x {} samples (lng x lat)",
        grid.n_lng(),
        grid.n_lat()
    );
    println!(
        "Spacing: 1/{}° lng ({:.6}°), 1/{}° lat ({:.6}°)",
        grid.lng_denom(),
        grid.lng_step(),
        grid.lat_denom(),
        grid.lat_step()
    );
    println!(
        "Coverage: {:.5}..{:.5}°E, {:.5}..{:.5}°N",
        coverage.lng_min, coverage.lng_max, coverage.lat_min, coverage.lat_max
    );
    if let Some(size) = file_size {
        println!("File size: {}", format_size(size));
    }
    println!();

    if let (Some(min), Some(max)) = (summary.min, summary.max) {
        println!("Min height: {:.4}m", min);
        println!("Max height: {:.4}m", max);
    }

    if summary.no_data > 0 {
        let pct = (summary.no_data as f64 / summary.total as f64) * 100.0;
        println!("No-data samples: {} ({:.1}%)", summary.no_data, pct);
    }

    Ok(())
}

/// Human-readable file size using binary units.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
