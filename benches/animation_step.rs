//! Benchmarks for the per-frame group update.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scatterform::{AnimationStep, Direction, ParticleGroup, Placement, ReferenceBuffer, Vec3};

fn figure(count: usize) -> ReferenceBuffer {
    let mut rng = SmallRng::seed_from_u64(0);
    let points = (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(0.0..180.0),
                rng.gen_range(-20.0..20.0),
            )
        })
        .collect();
    ReferenceBuffer::new(points)
}

fn bench_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("animation_step");
    let reference = figure(50_000);
    let step = AnimationStep::default();

    for direction in [Direction::Falling, Direction::Rising] {
        group.bench_with_input(
            BenchmarkId::new("50k", format!("{direction:?}")),
            &direction,
            |b, &direction| {
                let mut rng = SmallRng::seed_from_u64(1);
                let mut rand = || rng.gen::<f32>();
                let scattered: Vec<Vec3> = reference
                    .as_slice()
                    .iter()
                    .map(|p| Vec3::new(p.x + 300.0, 0.0, p.z - 150.0))
                    .collect();
                let mut particles = ParticleGroup::new("bench", reference.clone(), Placement::default(), || 0.5)
                    .with_start(0)
                    .with_delay(i32::MAX)
                    .with_direction(direction);
                if direction == Direction::Rising {
                    particles = particles.with_positions(scattered);
                }
                b.iter(|| black_box(step.advance(&mut particles, 0.16, &mut rand)))
            },
        );
    }

    group.finish();
}

fn bench_clamp(c: &mut Criterion) {
    c.bench_function("clamp_delta", |b| {
        b.iter(|| black_box(scatterform::clamp_delta(black_box(0.016))))
    });
}

criterion_group!(benches, bench_phases, bench_clamp);
criterion_main!(benches);
