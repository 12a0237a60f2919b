use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geoid::{codec, GeoidModel, Grid, GridHeader};

/// Synthetic grid with the GSIGEO2011 geometry (1201 × 1801) and a smooth surface.
fn create_grid() -> Grid {
    let header = GridHeader {
        lng_min: 120.0,
        lat_min: 20.0,
        lng_denom: 40,
        lat_denom: 60,
        n_lng: 1201,
        n_lat: 1801,
        kind: 1,
        version: "ver2.2".to_string(),
    };
    let values = (0..header.sample_count())
        .map(|i| {
            let (row, col) = (i / 1201, i % 1201);
            25.0 + (row as f64 * 0.01).sin() * 10.0 + (col as f64 * 0.02).cos() * 5.0
        })
        .collect();
    Grid::new(header, values).unwrap()
}

fn bench_single_height(c: &mut Criterion) {
    let model = GeoidModel::new(create_grid());

    c.bench_function("single_height", |b| {
        b.iter(|| {
            black_box(model.get_height(black_box(138.2839817085188), black_box(37.12378643088312)));
        });
    });
}

fn bench_batch_heights(c: &mut Criterion) {
    let model = GeoidModel::new(create_grid());

    // 10000 points spread over the coverage, some outside it
    let lngs: Vec<f64> = (0..10_000).map(|i| 119.5 + (i % 100) as f64 * 0.31).collect();
    let lats: Vec<f64> = (0..10_000).map(|i| 19.5 + (i / 100) as f64 * 0.26).collect();

    c.bench_function("batch_10000", |b| {
        b.iter(|| {
            black_box(model.get_heights(black_box(&lngs), black_box(&lats)).unwrap());
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = codec::encode(&create_grid()).unwrap();

    c.bench_function("decode_1201x1801", |b| {
        b.iter(|| {
            black_box(codec::decode(black_box(&bytes)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_single_height,
    bench_batch_heights,
    bench_decode,
);
criterion_main!(benches);
