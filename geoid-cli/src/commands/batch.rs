use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::load_model;

/// Name of the column appended to the output.
const HEIGHT_COLUMN: &str = "geoid_height";

/// Points looked up per progress tick.
const CHUNK_SIZE: usize = 4096;

pub fn run(
    model: Option<PathBuf>,
    expected_version: Option<String>,
    input: PathBuf,
    output: Option<PathBuf>,
    lng_col: String,
    lat_col: String,
) -> Result<()> {
    let model = load_model(model, expected_version)?;

    let file = File::open(&input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lng_idx = headers
        .iter()
        .position(|h| h == lng_col)
        .with_context(|| format!("Column '{}' not found in CSV", lng_col))?;
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let mut lngs = Vec::with_capacity(records.len());
    let mut lats = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        // Row numbers as shown in a spreadsheet (header is row 1)
        let row = i + 2;
        lngs.push(parse_coord(record.get(lng_idx), "longitude", row)?);
        lats.push(parse_coord(record.get(lat_idx), "latitude", row)?);
    }

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut heights = Vec::with_capacity(records.len());
    for (lng_chunk, lat_chunk) in lngs.chunks(CHUNK_SIZE).zip(lats.chunks(CHUNK_SIZE)) {
        heights.extend(model.par_get_heights(lng_chunk, lat_chunk)?);
        pb.inc(lng_chunk.len() as u64);
    }
    pb.finish_with_message("Done");

    let output_path = output.unwrap_or_else(|| default_output(&input));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push(HEIGHT_COLUMN);
    writer.write_record(&new_headers)?;

    let mut no_data = 0u64;
    for (record, height) in records.iter().zip(&heights) {
        let value = if height.is_nan() {
            no_data += 1;
            String::new()
        } else {
            format!("{:.4}", height)
        };
        let mut row: Vec<&str> = record.iter().collect();
        row.push(&value);
        writer.write_record(&row)?;
    }

    writer.flush()?;

    tracing::info!(
        rows = records.len(),
        no_data = no_data,
        output = %output_path.display(),
        "Batch complete"
    );
    println!(
        "Processed {} rows ({} without data). Output: {}",
        records.len(),
        no_data,
        output_path.display()
    );

    Ok(())
}

fn parse_coord(field: Option<&str>, name: &str, row: usize) -> Result<f64> {
    field
        .with_context(|| format!("Row {}: missing {}", row, name))?
        .trim()
        .parse()
        .with_context(|| format!("Row {}: invalid {}", row, name))
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_geoid.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoid::{codec, Grid, GridHeader};
    use tempfile::TempDir;

    #[test]
    fn test_batch_appends_height_column() {
        let dir = TempDir::new().unwrap();

        let header = GridHeader {
            lng_min: 130.0,
            lat_min: 30.0,
            lng_denom: 1,
            lat_denom: 1,
            n_lng: 2,
            n_lat: 2,
            kind: 1,
            version: "test".to_string(),
        };
        let grid = Grid::new(header, vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let model_path = dir.path().join("model.bin");
        std::fs::write(&model_path, codec::encode(&grid).unwrap()).unwrap();

        let input = dir.path().join("points.csv");
        std::fs::write(&input, "name,lng,lat\na,130.5,30.5\nb,10.0,10.0\nc,131.0,30.0\n").unwrap();

        run(
            Some(model_path),
            None,
            input.clone(),
            None,
            "lng".to_string(),
            "lat".to_string(),
        )
        .unwrap();

        let out = std::fs::read_to_string(dir.path().join("points_geoid.csv")).unwrap();
        assert_eq!(
            out,
            "name,lng,lat,geoid_height\na,130.5,30.5,25.0000\nb,10.0,10.0,\nc,131.0,30.0,20.0000\n"
        );
    }

    #[test]
    fn test_batch_spans_several_chunks() {
        let dir = TempDir::new().unwrap();

        let header = GridHeader {
            lng_min: 0.0,
            lat_min: 0.0,
            lng_denom: 1,
            lat_denom: 1,
            n_lng: 2,
            n_lat: 2,
            kind: 1,
            version: "test".to_string(),
        };
        let grid = Grid::new(header, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let model_path = dir.path().join("model.bin");
        std::fs::write(&model_path, codec::encode(&grid).unwrap()).unwrap();

        let rows = CHUNK_SIZE * 2 + 7;
        let mut csv_text = String::from("lng,lat\n");
        for i in 0..rows {
            // Every third point falls outside the grid
            let lng = if i % 3 == 0 { 5.0 } else { 0.5 };
            csv_text.push_str(&format!("{},0.5\n", lng));
        }
        let input = dir.path().join("many.csv");
        std::fs::write(&input, csv_text).unwrap();
        let output = dir.path().join("out.csv");

        run(
            Some(model_path),
            None,
            input,
            Some(output.clone()),
            "lng".to_string(),
            "lat".to_string(),
        )
        .unwrap();

        let out = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(lines.len(), rows);
        for (i, line) in lines.iter().enumerate() {
            let expected = if i % 3 == 0 { "5,0.5," } else { "0.5,0.5,1.0000" };
            assert_eq!(*line, expected);
        }
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("points.csv");
        std::fs::write(&input, "x,y\n1,2\n").unwrap();

        let header = GridHeader {
            lng_min: 0.0,
            lat_min: 0.0,
            lng_denom: 1,
            lat_denom: 1,
            n_lng: 1,
            n_lat: 1,
            kind: 1,
            version: "test".to_string(),
        };
        let model_path = dir.path().join("model.bin");
        let grid = Grid::new(header, vec![1.0]).unwrap();
        std::fs::write(&model_path, codec::encode(&grid).unwrap()).unwrap();

        let result = run(
            Some(model_path),
            None,
            input,
            None,
            "lng".to_string(),
            "lat".to_string(),
        );
        assert!(result.is_err());
    }
}
