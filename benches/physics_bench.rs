use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use soft_lattice::*;
use std::hint::black_box;

fn prepare_body(dim: usize) -> Simulation {
    let config = SimulationConfig::default().with_dim(dim);
    let mut sim = Simulation::new(config).expect("benchmark lattice");
    sim.add_collision_volume(CollisionVolume::cuboid(
        Vec3::new(0.0, -1.0 - dim as f32 * 0.05, 0.0),
        Vec3::new(4.0, 1.0, 4.0),
    ));
    sim
}

fn bench_soft_body_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("soft_body_step");
    for &dim in &[3usize, 5, 8] {
        group.bench_with_input(BenchmarkId::new("sequential", dim), &dim, |b, &dim| {
            let mut sim = prepare_body(dim);
            sim.set_parallel_enabled(false);
            b.iter(|| {
                sim.step();
                black_box(sim.mesh_volume())
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", dim), &dim, |b, &dim| {
            let mut sim = prepare_body(dim);
            sim.set_parallel_enabled(true);
            b.iter(|| {
                sim.step();
                black_box(sim.mesh_volume())
            })
        });
    }
    group.finish();
}

fn bench_force_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_propagation");
    for &dim in &[5usize, 8] {
        group.bench_with_input(BenchmarkId::new("push", dim), &dim, |b, &dim| {
            let mut sim = prepare_body(dim);
            b.iter(|| {
                sim.add_force(0, black_box(Vec3::new(0.5, 0.5, 0.5)))
                    .expect("corner node");
                black_box(sim.propagate_queued_forces())
            })
        });
    }
    group.finish();
}

fn bench_mesh_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_mesh");
    for &dim in &[3usize, 5, 8] {
        group.bench_with_input(BenchmarkId::new("generate", dim), &dim, |b, &dim| {
            let graph = NodeGraph::cuboid(dim, 0.1, 1.0, Vec3::ZERO).expect("benchmark lattice");
            b.iter(|| black_box(SurfaceMesh::generate(&graph).expect("closed surface")))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_soft_body_step,
    bench_force_propagation,
    bench_mesh_generation
);
criterion_main!(benches);
