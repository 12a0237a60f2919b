use anyhow::Result;
use geoid::GeoidModel;
use serde::Serialize;
use std::path::PathBuf;

use super::load_model;

#[derive(Serialize)]
struct HeightResponse {
    lng: f64,
    lat: f64,
    /// `null` outside coverage or where the model has no data
    height: Option<f64>,
    in_coverage: bool,
}

pub fn run(
    model: Option<PathBuf>,
    expected_version: Option<String>,
    lng: f64,
    lat: f64,
    json: bool,
) -> Result<()> {
    let model = load_model(model, expected_version)?;
    println!("{}", render(&model, lng, lat, json)?);
    Ok(())
}

fn render(model: &GeoidModel, lng: f64, lat: f64, json: bool) -> Result<String> {
    let height = model.get_height(lng, lat);
    let height = if height.is_nan() { None } else { Some(height) };
    let in_coverage = model.grid().coverage().contains(lng, lat);

    if json {
        let response = HeightResponse {
            lng,
            lat,
            height,
            in_coverage,
        };
        return Ok(serde_json::to_string(&response)?);
    }

    Ok(match height {
        Some(h) => format!("{:.4}", h),
        None if in_coverage => "no data".to_string(),
        None => "outside model coverage".to_string(),
    })
}
