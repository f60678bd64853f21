//! Benchmarks for building particle fields.
//!
//! Run with: `cargo bench --bench field_build`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image_particles::{FieldBuilder, ImageSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noisy_image(width: u32, height: u32) -> ImageSample {
    let mut rng = StdRng::seed_from_u64(7);
    ImageSample::from_fn(width, height, |_, _| [rng.gen(), rng.gen(), rng.gen(), 255]).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_build");

    for &(w, h) in &[(64u32, 64u32), (320, 180), (640, 360)] {
        let image = noisy_image(w, h);
        let builder = FieldBuilder::new().with_seed(1);

        group.bench_with_input(BenchmarkId::new("discard", format!("{}x{}", w, h)), &image, |b, image| {
            b.iter(|| black_box(builder.build(image).unwrap()))
        });

        let keep_all = builder.clone().with_discard(false);
        group.bench_with_input(BenchmarkId::new("keep_all", format!("{}x{}", w, h)), &image, |b, image| {
            b.iter(|| black_box(keep_all.build(image).unwrap()))
        });
    }

    group.finish();
}

fn bench_instances(c: &mut Criterion) {
    let image = noisy_image(320, 180);
    let field = FieldBuilder::new().with_seed(1).build(&image).unwrap();

    c.bench_function("interleave_instances_320x180", |b| {
        b.iter(|| black_box(field.instances()))
    });
}

criterion_group!(benches, bench_build, bench_instances);
criterion_main!(benches);
