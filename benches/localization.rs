use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_iris::RecognizerConfig;
use rust_iris::detector::hough::{HoughParams, hough_circles};
use rust_iris::detector::{PupilLocator, find_boundaries};

mod common;

fn bench_hough_circles(c: &mut Criterion) {
    let image = common::synthetic_eye(2);
    let params = HoughParams {
        min_dist: 10.0,
        param1: 200.0,
        param2: 30,
        min_radius: 10,
        max_radius: 90,
    };
    c.bench_function("hough_circles_240x240", |b| {
        b.iter(|| hough_circles(black_box(&image), black_box(&params)))
    });
}

fn bench_pupil_locator(c: &mut Criterion) {
    let image = common::synthetic_eye(2);
    let config = RecognizerConfig::default();
    let locator = PupilLocator::new(&config.pupil, config.edge_blur_range);
    c.bench_function("pupil_locate_240x240", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            locator.locate(black_box(&image), &mut rng)
        })
    });
}

fn bench_find_boundaries(c: &mut Criterion) {
    let image = common::synthetic_eye(2);
    let config = RecognizerConfig::default();
    let mut group = c.benchmark_group("boundaries");
    group.sample_size(10);
    group.bench_function("find_boundaries_240x240", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(0);
            find_boundaries(black_box(&image), &config, &mut rng)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_hough_circles, bench_pupil_locator, bench_find_boundaries);
criterion_main!(benches);
