/// Benchmarks for procedural chunk generation and world streaming
use std::hint::black_box;

use cgmath::{Point2, Point3};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use voxel_world::engine_state::config::{GenerationConfig, WorldConfig};
use voxel_world::engine_state::voxels::chunk::chunk_generation::ChunkGenerator;
use voxel_world::engine_state::voxels::edit_store::EditStore;
use voxel_world::engine_state::voxels::world::World;

fn bench_generate_layers(c: &mut Criterion) {
    let generator = ChunkGenerator::new(&WorldConfig::default()).unwrap();
    c.bench_function("generate_layers_default", |b| {
        b.iter(|| generator.generate_layers(black_box(Point2::new(3, -2))));
    });
}

fn bench_generate_with_instances(c: &mut Criterion) {
    let generator = ChunkGenerator::new(&WorldConfig::default()).unwrap();
    let edits = EditStore::new();
    c.bench_function("generate_with_instances", |b| {
        b.iter(|| generator.generate(black_box(Point2::new(3, -2)), &edits));
    });
}

fn bench_stream_visible_square(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_visible_square");
    group.sample_size(10);

    for draw_distance in [1u32, 2, 3] {
        group.bench_with_input(
            BenchmarkId::from_parameter(draw_distance),
            &draw_distance,
            |b, &draw_distance| {
                b.iter(|| {
                    let config = WorldConfig {
                        draw_distance,
                        ..WorldConfig::default()
                    };
                    let mut world = World::new(config, &GenerationConfig::default()).unwrap();
                    world.update(Point3::new(0.0, 20.0, 0.0));
                    world.flush_generation();
                    black_box(world.stats())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_layers,
    bench_generate_with_instances,
    bench_stream_visible_square
);
criterion_main!(benches);
