//! Integration tests for entity storage
//!
//! Tests entity spawning, despawning, generational indices, and stale
//! reference detection through the world API.

use strata_storage::World;

// =============================================================================
// Spawning
// =============================================================================

#[test]
fn spawn_single_entity() {
    let mut world = World::new();
    let entity = world.spawn();

    assert!(world.is_alive(entity));
    assert_eq!(world.entity_count(), 1);
}

#[test]
fn spawned_entities_are_distinct() {
    let mut world = World::new();
    let e1 = world.spawn();
    let e2 = world.spawn();
    let e3 = world.spawn();

    assert_ne!(e1, e2);
    assert_ne!(e2, e3);
    assert_ne!(e1, e3);
    assert_eq!(world.entity_count(), 3);
}

#[test]
fn spawned_entities_start_with_an_empty_shape() {
    let mut world = World::new();
    let entity = world.spawn();

    assert_eq!(world.shape(entity).unwrap(), &[]);
}

// =============================================================================
// Despawning and generations
// =============================================================================

#[test]
fn despawn_removes_the_entity() {
    let mut world = World::new();
    let entity = world.spawn();
    world.despawn(entity).unwrap();

    assert!(!world.is_alive(entity));
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn index_reuse_invalidates_old_handles() {
    let mut world = World::new();
    let old = world.spawn();
    world.despawn(old).unwrap();

    let new = world.spawn();
    assert_eq!(new.index, old.index);
    assert_ne!(new, old);
    assert!(world.is_alive(new));
    assert!(!world.is_alive(old));
}

#[test]
fn operations_on_stale_handles_fail() {
    let mut world = World::new();
    let component = world.register_component("position").unwrap();
    let stale = world.spawn();
    world.despawn(stale).unwrap();
    let _reused = world.spawn();

    assert!(world.add(stale, component).is_err());
    assert!(world.remove(stale, component).is_err());
    assert!(world.despawn(stale).is_err());
    assert!(world.shape(stale).is_err());
}

#[test]
fn entities_iterator_skips_the_dead() {
    let mut world = World::new();
    let e1 = world.spawn();
    let e2 = world.spawn();
    let e3 = world.spawn();
    world.despawn(e2).unwrap();

    let live: Vec<_> = world.entities().collect();
    assert_eq!(live, vec![e1, e3]);
}
