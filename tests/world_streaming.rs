use cgmath::{Point2, Point3};
use voxel_world::engine_state::config::{GenerationConfig, WorldConfig};
use voxel_world::engine_state::voxels::block::block_type::{is_solid_id, BlockType};
use voxel_world::engine_state::voxels::chunk::ChunkSize;
use voxel_world::engine_state::voxels::world::{World, WorldEvent};

fn config(seed: u32) -> WorldConfig {
    WorldConfig {
        seed,
        chunk_size: ChunkSize {
            width: 10,
            height: 20,
        },
        draw_distance: 1,
        ..WorldConfig::default()
    }
}

fn loaded_world(seed: u32, workers: usize) -> World {
    let generation = GenerationConfig {
        workers,
        chunks_per_frame: 2,
    };
    let mut world = World::new(config(seed), &generation).unwrap();
    world.update(Point3::new(5.0, 10.0, 5.0));
    world.flush_generation();
    world
}

/// Every loaded voxel is instanced exactly when it is solid and has an exposed face, and
/// every instance slot points back at its voxel.
fn assert_instances_consistent(world: &World) {
    let size = world.chunk_size();
    for chunk in world.chunks() {
        let origin = chunk.origin();
        for x in 0..size.width as i32 {
            for y in 0..size.height as i32 {
                for z in 0..size.width as i32 {
                    let voxel = chunk.get_voxel(x, y, z).unwrap();
                    let world_position = Point3::new(origin.x + x, y, origin.z + z);
                    let exposed = [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)]
                        .iter()
                        .any(|(dx, dy, dz)| {
                            !world
                                .get_block(world_position.x + dx, y + dy, world_position.z + dz)
                                .is_some_and(is_solid_id)
                        });
                    let expected = is_solid_id(voxel.block_type) && exposed;
                    assert_eq!(voxel.instance.is_some(), expected, "voxel {:?}", world_position);
                    if let Some(slot) = voxel.instance {
                        let positions = chunk.instances().positions(voxel.block_type);
                        assert_eq!(positions[slot as usize], Point3::new(x, y, z));
                    }
                }
            }
        }
    }
}

#[test]
fn loads_the_visible_square() {
    let world = loaded_world(5, 0);
    let stats = world.stats();
    assert_eq!(stats.loaded_chunks, 9);
    assert_eq!(stats.pending_chunks, 0);
    assert!(stats.instances > 0);
    assert_instances_consistent(&world);
}

#[test]
fn worker_threads_produce_the_same_world() {
    let cooperative = loaded_world(21, 0);
    let threaded = loaded_world(21, 3);
    for x in -10..20 {
        for z in -10..20 {
            for y in 0..20 {
                assert_eq!(cooperative.get_block(x, y, z), threaded.get_block(x, y, z));
            }
        }
    }
}

#[test]
fn random_edits_keep_instances_consistent() {
    let mut world = loaded_world(8, 0);
    let mut rng = fastrand::Rng::with_seed(7);
    let mut applied = 0;
    for _ in 0..400 {
        let x = rng.i32(-10..20);
        let y = rng.i32(0..20);
        let z = rng.i32(-10..20);
        let changed = if rng.bool() {
            world.add_block(x, y, z, BlockType::Stone)
        } else {
            world.remove_block(x, y, z)
        };
        if changed {
            applied += 1;
        }
    }
    assert!(applied > 0);
    assert_instances_consistent(&world);
}

#[test]
fn floor_layer_is_not_editable() {
    let mut world = loaded_world(8, 0);
    let before = world.get_block(3, 0, 3);
    assert!(!world.remove_block(3, 0, 3));
    assert!(!world.add_block(3, 0, 3, BlockType::Dirt));
    assert_eq!(world.get_block(3, 0, 3), before);
    assert!(world.edits().is_empty());
}

#[test]
fn edits_survive_unload_and_reload() {
    let mut world = loaded_world(13, 0);
    let home = Point3::new(5.0, 10.0, 5.0);
    assert!(world.add_block(4, 19, 4, BlockType::IronOre) || world.remove_block(4, 19, 4));
    let edited = world.get_block(4, 19, 4);
    let neighbour_before = world.get_block(12, 5, 3);

    let changes = world.update(Point3::new(205.0, 10.0, 5.0));
    assert_eq!(changes.unloaded.len(), 9);
    assert_eq!(world.get_block(4, 19, 4), None);
    world.flush_generation();

    world.update(home);
    world.flush_generation();
    assert_eq!(world.get_block(4, 19, 4), edited);
    assert_eq!(world.get_block(12, 5, 3), neighbour_before);
    assert_instances_consistent(&world);
}

#[test]
fn regeneration_clears_edits_and_reloads() {
    let mut world = loaded_world(13, 0);
    world.drain_events();
    assert!(world.remove_block(4, 1, 4));
    assert_eq!(world.edits().len(), 1);

    let changes = world
        .regenerate(config(14), Point3::new(5.0, 10.0, 5.0))
        .unwrap();
    assert_eq!(changes.requested.len(), 9);
    assert!(world.edits().is_empty());
    assert_eq!(world.get_block(4, 1, 4), None);

    let events = world.drain_events();
    let unloaded = events
        .iter()
        .filter(|event| matches!(event, WorldEvent::ChunkUnloaded(_)))
        .count();
    assert_eq!(unloaded, 9);

    world.flush_generation();
    assert_eq!(world.stats().loaded_chunks, 9);
    assert_eq!(world.config().seed, 14);
    assert!(world.chunk(Point2::new(0, 0)).is_some_and(|chunk| chunk.is_loaded()));
}

#[test]
fn invalid_regeneration_keeps_the_old_world() {
    let mut world = loaded_world(13, 0);
    let mut bad = config(1);
    bad.chunk_size.width = 0;
    assert!(world.regenerate(bad, Point3::new(5.0, 10.0, 5.0)).is_err());
    assert_eq!(world.stats().loaded_chunks, 9);
    assert_eq!(world.config().seed, 13);
}

#[test]
fn streaming_is_symmetric() {
    let mut world = loaded_world(2, 0);
    let observer = Point3::new(5.0, 10.0, 5.0);
    assert_eq!(world.get_visible_chunks(observer), world.get_visible_chunks(observer));
    assert!(world.update(observer).requested.is_empty());
    assert_instances_consistent(&world);

    // One chunk east: the west column leaves, an east column arrives.
    let mut changes = world.update(Point3::new(14.0, 10.0, 5.0));
    changes.unloaded.sort_by_key(|coord| coord.y);
    changes.requested.sort_by_key(|coord| coord.y);
    assert_eq!(
        changes.unloaded,
        vec![Point2::new(-1, -1), Point2::new(-1, 0), Point2::new(-1, 1)]
    );
    assert_eq!(
        changes.requested,
        vec![Point2::new(2, -1), Point2::new(2, 0), Point2::new(2, 1)]
    );
    // The west border of the remaining chunks is exposed once its neighbours are gone.
    assert_instances_consistent(&world);

    world.flush_generation();
    assert_instances_consistent(&world);

    let back = world.update(observer);
    assert_eq!(back.requested.len(), 3);
    assert_eq!(back.unloaded.len(), 3);
    assert_instances_consistent(&world);
    world.flush_generation();
    assert_instances_consistent(&world);
}

#[test]
fn unloading_a_chunk_exposes_the_facing_border() {
    let mut world = loaded_world(2, 0);
    world.drain_events();
    let before = world.chunk(Point2::new(0, 0)).unwrap().instances().len();

    // Moving one chunk east drops the west column, leaving (0, 0) on the new edge.
    world.update(Point3::new(14.0, 10.0, 5.0));
    let after = world.chunk(Point2::new(0, 0)).unwrap().instances().len();
    assert!(after > before);

    let events = world.drain_events();
    assert!(events.iter().any(|event| matches!(
        event,
        WorldEvent::InstancesChanged { chunk, .. } if *chunk == Point2::new(0, 0)
    )));
    assert_instances_consistent(&world);
}
