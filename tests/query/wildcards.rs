//! Integration tests for wildcard pair matching
//!
//! Tests per-entity resolution of wildcard terms against relationship
//! targets.

use strata_foundation::{ComponentId, Ident};
use strata_query::{Queries, Term};
use strata_storage::World;

fn family_world() -> (World, ComponentId, Vec<strata_foundation::EntityId>) {
    let mut world = World::new();
    let child_of = world.register_relation("child-of").unwrap();

    let parent_a = world.spawn();
    let parent_b = world.spawn();
    let child_a = world.spawn();
    let child_b = world.spawn();
    let orphan = world.spawn();

    world.link(child_a, child_of, parent_a).unwrap();
    world.link(child_b, child_of, parent_b).unwrap();

    (world, child_of, vec![parent_a, parent_b, child_a, child_b, orphan])
}

#[test]
fn any_target_matches_regardless_of_target() {
    let (world, child_of, entities) = family_world();
    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::all(Ident::any_target(child_of))])
        .unwrap();

    let mut matched = queries.pass(&world, q).unwrap().collect_entities();
    matched.sort();
    // Both children match although their targets differ.
    assert_eq!(matched, vec![entities[2], entities[3]]);
}

#[test]
fn unlinking_removes_the_entity_from_the_next_pass() {
    let (mut world, child_of, entities) = family_world();
    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::any(Ident::any_target(child_of))])
        .unwrap();

    let before = queries.pass(&world, q).unwrap().collect_entities();
    assert!(before.contains(&entities[2]));

    world.unlink(entities[2], child_of, entities[0]).unwrap();

    let after = queries.pass(&world, q).unwrap().collect_entities();
    assert!(!after.contains(&entities[2]));
    assert!(after.contains(&entities[3]));
    assert_eq!(queries.compile_count(), 1);
}

#[test]
fn any_relation_matches_every_relation_kind() {
    let mut world = World::new();
    let child_of = world.register_relation("child-of").unwrap();
    let likes = world.register_relation("likes").unwrap();

    let hub = world.spawn();
    let via_child_of = world.spawn();
    let via_likes = world.spawn();
    let unrelated = world.spawn();

    world.link(via_child_of, child_of, hub).unwrap();
    world.link(via_likes, likes, hub).unwrap();
    world.link(unrelated, likes, via_likes).unwrap();

    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::all(Ident::any_relation(hub))])
        .unwrap();

    let mut matched = queries.pass(&world, q).unwrap().collect_entities();
    matched.sort();
    assert_eq!(matched, vec![via_child_of, via_likes]);
}

#[test]
fn fully_wildcard_pair_matches_any_relationship() {
    let (world, _, entities) = family_world();
    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::all(Ident::any_pair())])
        .unwrap();

    let mut matched = queries.pass(&world, q).unwrap().collect_entities();
    matched.sort();
    assert_eq!(matched, vec![entities[2], entities[3]]);
}

#[test]
fn not_wildcard_excludes_related_entities() {
    let (world, child_of, entities) = family_world();
    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::not(Ident::any_target(child_of))])
        .unwrap();

    let matched = queries.pass(&world, q).unwrap().collect_entities();
    // Parents and the orphan lack child-of edges; children are excluded.
    assert!(matched.contains(&entities[0]));
    assert!(matched.contains(&entities[1]));
    assert!(matched.contains(&entities[4]));
    assert!(!matched.contains(&entities[2]));
    assert!(!matched.contains(&entities[3]));
}

#[test]
fn concrete_pairs_match_only_the_named_target() {
    let (world, child_of, entities) = family_world();
    let mut queries = Queries::new();
    let q = queries
        .query(&world, &[Term::all(Ident::pair(child_of, entities[0]))])
        .unwrap();

    let matched = queries.pass(&world, q).unwrap().collect_entities();
    assert_eq!(matched, vec![entities[2]]);
}

#[test]
fn wildcard_and_component_terms_compose() {
    let mut world = World::new();
    let position = world.register_component("position").unwrap();
    let child_of = world.register_relation("child-of").unwrap();

    let parent = world.spawn();
    let placed_child = world.spawn();
    let bare_child = world.spawn();
    world.add(placed_child, position).unwrap();
    world.link(placed_child, child_of, parent).unwrap();
    world.link(bare_child, child_of, parent).unwrap();

    let mut queries = Queries::new();
    let q = queries
        .query(
            &world,
            &[Term::all(position), Term::all(Ident::any_target(child_of))],
        )
        .unwrap();

    let matched = queries.pass(&world, q).unwrap().collect_entities();
    assert_eq!(matched, vec![placed_child]);
}
