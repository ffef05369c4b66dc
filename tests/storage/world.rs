//! Integration tests for world state
//!
//! Tests component edits, relationships, and registry behavior end to end.

use strata_foundation::Ident;
use strata_storage::World;

// =============================================================================
// Components
// =============================================================================

#[test]
fn add_and_remove_components() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();
    let velocity = world.register_component("velocity").unwrap();

    let entity = world.spawn();
    world.add(entity, position).unwrap();
    world.add(entity, velocity).unwrap();

    assert!(world.has(entity, position));
    assert!(world.has(entity, velocity));

    world.remove(entity, position).unwrap();
    assert!(!world.has(entity, position));
    assert!(world.has(entity, velocity));
}

#[test]
fn shape_lists_ids_in_canonical_order() {
    let mut world = World::new();
    let a = world.register_component("a").unwrap();
    let b = world.register_component("b").unwrap();

    let entity = world.spawn();
    world.add(entity, b).unwrap();
    world.add(entity, a).unwrap();

    let shape = world.shape(entity).unwrap();
    assert_eq!(shape, &[Ident::component(a), Ident::component(b)]);
}

#[test]
fn registration_is_idempotent() {
    let mut world = World::new();
    let first = world.register_component("position").unwrap();
    let second = world.register_component("position").unwrap();

    assert_eq!(first, second);
    assert_eq!(world.registry().len(), 1);
}

// =============================================================================
// Relationships
// =============================================================================

#[test]
fn link_records_edge_and_shape() {
    let mut world = World::new();
    let child_of = world.register_relation("child-of").unwrap();

    let parent = world.spawn();
    let child = world.spawn();
    world.link(child, child_of, parent).unwrap();

    assert_eq!(world.targets(child, child_of), &[parent]);
    assert!(world.has_ident(child, Ident::pair(child_of, parent)));
}

#[test]
fn multiple_targets_accumulate() {
    let mut world = World::new();
    let likes = world.register_relation("likes").unwrap();

    let a = world.spawn();
    let b = world.spawn();
    let c = world.spawn();
    world.link(a, likes, b).unwrap();
    world.link(a, likes, c).unwrap();

    assert_eq!(world.targets(a, likes), &[b, c]);
    // Two targets means two distinct pair ids in the shape.
    assert_eq!(world.shape(a).unwrap().len(), 2);
}

#[test]
fn unlink_is_idempotent() {
    let mut world = World::new();
    let likes = world.register_relation("likes").unwrap();

    let a = world.spawn();
    let b = world.spawn();
    world.link(a, likes, b).unwrap();
    world.unlink(a, likes, b).unwrap();
    world.unlink(a, likes, b).unwrap();

    assert!(world.targets(a, likes).is_empty());
    assert_eq!(world.shape(a).unwrap(), &[]);
}

#[test]
fn despawning_the_target_cleans_up_sources() {
    let mut world = World::new();
    let child_of = world.register_relation("child-of").unwrap();

    let parent = world.spawn();
    let c1 = world.spawn();
    let c2 = world.spawn();
    world.link(c1, child_of, parent).unwrap();
    world.link(c2, child_of, parent).unwrap();

    world.despawn(parent).unwrap();

    for child in [c1, c2] {
        assert!(world.is_alive(child));
        assert!(world.targets(child, child_of).is_empty());
        assert_eq!(world.shape(child).unwrap(), &[]);
    }
}

#[test]
fn plain_components_cannot_be_linked() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();

    let a = world.spawn();
    let b = world.spawn();
    assert!(world.link(a, position, b).is_err());
}
