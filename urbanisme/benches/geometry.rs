//! Benchmarks pour la fusion de parcelles et la détermination DP/PC

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo::{Geometry, LineString, Polygon};
use urbanisme::{
    calculate_dp_pc, classify_boundary_edges, merge_parcel_geometries, DpPcInput, ParcelGeometry,
    ProjectType, DEFAULT_ROAD_BEARING,
};

/// Rangée de parcelles carrées contiguës d'environ 80 m de côté
fn parcel_row(count: usize) -> Vec<ParcelGeometry> {
    (0..count)
        .map(|i| {
            let x0 = 5.0 + i as f64 * 0.001;
            let x1 = 5.0 + (i + 1) as f64 * 0.001;
            let ring = LineString::from(vec![
                (x0, 45.0),
                (x1, 45.0),
                (x1, 45.001),
                (x0, 45.001),
                (x0, 45.0),
            ]);
            ParcelGeometry::new(
                format!("38185000AB{:04}", i),
                Some(Geometry::Polygon(Polygon::new(ring, vec![]))),
            )
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for count in [2usize, 5, 20] {
        let parcels = parcel_row(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &parcels, |b, parcels| {
            b.iter(|| black_box(merge_parcel_geometries(black_box(parcels))))
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let Some(merged) = merge_parcel_geometries(&parcel_row(5)) else {
        eprintln!("Merge failed, skipping benchmark");
        return;
    };

    c.bench_function("classify_boundary_edges", |b| {
        b.iter(|| black_box(classify_boundary_edges(black_box(&merged.geometry), DEFAULT_ROAD_BEARING)))
    });
}

fn bench_dp_pc(c: &mut Criterion) {
    let inputs: Vec<DpPcInput> = (0..100)
        .map(|i| {
            let project_type = if i % 2 == 0 {
                ProjectType::NewConstruction
            } else {
                ProjectType::ExistingExtension
            };
            DpPcInput::new(project_type, i as f64).with_existing(100.0)
        })
        .collect();

    let mut group = c.benchmark_group("dp_pc");
    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.bench_function("batch_100", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = black_box(calculate_dp_pc(black_box(input)));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_merge, bench_classify, bench_dp_pc);
criterion_main!(benches);
