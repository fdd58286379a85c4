//! Frame-cost benchmarks for the two simulation engines.
//!
//! Both engines must fit comfortably inside a 16.67ms frame. The collision
//! grid is measured at increasing ball counts to show its near-linear
//! scaling; the gravity integrator is O(N²) and is measured at the body
//! counts a user can realistically click into existence.
//!
//! Run with: `cargo bench --bench physics_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use dungeon_physics::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const WIDTH: f64 = 1280.0;
const HEIGHT: f64 = 720.0;

fn populated_collision_world(count: usize) -> CollisionWorld {
    let mut rng = Pcg64::seed_from_u64(7);
    let mut world = CollisionWorld::new(WIDTH, HEIGHT);
    for _ in 0..count {
        let r = rng.gen_range(4.0..12.0);
        world.spawn(Ball::new(
            rng.gen_range(r..WIDTH - r),
            rng.gen_range(r..HEIGHT - r),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            r,
            Rgba::WHITE,
        ));
    }
    world
}

fn populated_gravity_world(count: usize) -> GravityWorld {
    let mut rng = Pcg64::seed_from_u64(11);
    let mut world = GravityWorld::new(DEFAULT_G);
    for _ in 0..count {
        // Spread wide so merges do not shrink the population mid-bench.
        world.spawn(GravityBody::new(
            rng.gen_range(-50_000.0..50_000.0),
            rng.gen_range(-50_000.0..50_000.0),
            0.0,
            0.0,
            rng.gen_range(MIN_MASS..MAX_MASS),
        ));
    }
    world
}

// ---------------------------------------------------------------------------
// Benchmark 1: collision step scaling
// ---------------------------------------------------------------------------

fn bench_collision_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision_step");
    for count in [100usize, 500, 1_000, 2_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = populated_collision_world(count);
            b.iter(|| black_box(world.step()));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 2: gravity step scaling
// ---------------------------------------------------------------------------

fn bench_gravity_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("gravity_step");
    for count in [10usize, 50, 100, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = populated_gravity_world(count);
            b.iter(|| black_box(world.step()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_collision_scaling, bench_gravity_scaling);
criterion_main!(benches);
