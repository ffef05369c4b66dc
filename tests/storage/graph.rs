//! Integration tests for the archetype graph
//!
//! Tests shape deduplication, memoized transitions, and pruning through the
//! world API.

use strata_storage::World;

// =============================================================================
// Shape deduplication
// =============================================================================

#[test]
fn entities_with_equal_shapes_share_an_archetype() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();
    let velocity = world.register_component("velocity").unwrap();

    let e1 = world.spawn();
    let e2 = world.spawn();
    // Components applied in different orders still canonicalize to one shape.
    world.add(e1, position).unwrap();
    world.add(e1, velocity).unwrap();
    world.add(e2, velocity).unwrap();
    world.add(e2, position).unwrap();

    assert_eq!(
        world.archetype_of(e1).unwrap(),
        world.archetype_of(e2).unwrap()
    );
}

#[test]
fn each_distinct_shape_is_one_archetype() {
    let mut world = World::new();
    let a = world.register_component("a").unwrap();
    let b = world.register_component("b").unwrap();

    let e1 = world.spawn();
    let e2 = world.spawn();
    let e3 = world.spawn();
    world.add(e1, a).unwrap();
    world.add(e2, b).unwrap();
    world.add(e3, a).unwrap();
    world.add(e3, b).unwrap();

    // Root, {a}, {b}, {a, b}.
    assert_eq!(world.graph().len(), 4);
}

// =============================================================================
// Transitions
// =============================================================================

#[test]
fn add_then_remove_returns_to_the_original_archetype() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();
    let health = world.register_component("health").unwrap();

    let entity = world.spawn();
    world.add(entity, position).unwrap();
    let original = world.archetype_of(entity).unwrap();

    world.add(entity, health).unwrap();
    assert_ne!(world.archetype_of(entity).unwrap(), original);

    world.remove(entity, health).unwrap();
    assert_eq!(world.archetype_of(entity).unwrap(), original);
}

#[test]
fn repeated_edits_reuse_memoized_edges() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();

    // Bouncing many entities across the same edge must not create new
    // archetypes after the first crossing.
    let entities: Vec<_> = (0..16).map(|_| world.spawn()).collect();
    for &e in &entities {
        world.add(e, position).unwrap();
    }
    let archetypes_after_first_wave = world.graph().len();

    for &e in &entities {
        world.remove(e, position).unwrap();
        world.add(e, position).unwrap();
    }
    assert_eq!(world.graph().len(), archetypes_after_first_wave);
}

#[test]
fn idempotent_edits_do_not_move_the_entity() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();
    let health = world.register_component("health").unwrap();

    let entity = world.spawn();
    world.add(entity, position).unwrap();
    let archetype = world.archetype_of(entity).unwrap();

    world.add(entity, position).unwrap();
    world.remove(entity, health).unwrap();
    assert_eq!(world.archetype_of(entity).unwrap(), archetype);
}

// =============================================================================
// Pruning
// =============================================================================

#[test]
fn prune_removes_only_empty_archetypes() {
    let mut world = World::new();
    let a = world.register_component("a").unwrap();
    let b = world.register_component("b").unwrap();

    let entity = world.spawn();
    world.add(entity, a).unwrap();
    world.add(entity, b).unwrap();
    world.remove(entity, b).unwrap();

    // {a, b} is now empty; {a} is occupied.
    let pruned = world.prune_empty_archetypes();
    assert_eq!(pruned, 1);
    assert!(world.has(entity, a));
    assert!(
        world
            .graph()
            .archetype(world.archetype_of(entity).unwrap())
            .is_some()
    );
}

#[test]
fn pruned_shapes_are_recreated_on_demand() {
    let mut world = World::new();
    let a = world.register_component("a").unwrap();
    let b = world.register_component("b").unwrap();

    let entity = world.spawn();
    world.add(entity, a).unwrap();
    world.add(entity, b).unwrap();
    world.remove(entity, b).unwrap();
    world.prune_empty_archetypes();

    // The memoized edge to the pruned archetype must not be followed.
    world.add(entity, b).unwrap();
    assert!(world.has(entity, a));
    assert!(world.has(entity, b));
}
