//! Integration tests for batch enumeration
//!
//! Tests batch yielding, column remaps, grouping, and row sorting.

use std::collections::HashMap;

use strata_foundation::{ComponentId, EntityId};
use strata_query::{Queries, Term};
use strata_storage::World;

fn world_with(components: &[&str]) -> (World, Vec<ComponentId>) {
    let mut world = World::new();
    let ids = components
        .iter()
        .map(|name| world.register_component(name).unwrap())
        .collect();
    (world, ids)
}

// =============================================================================
// Batches and columns
// =============================================================================

#[test]
fn batches_carry_rows_and_archetype_handles() {
    let (mut world, ids) = world_with(&["position"]);
    let e1 = world.spawn();
    let e2 = world.spawn();
    world.add(e1, ids[0]).unwrap();
    world.add(e2, ids[0]).unwrap();

    let mut queries = Queries::new();
    let q = queries.query(&world, &[Term::all(ids[0])]).unwrap();

    let batches: Vec<_> = queries.pass(&world, q).unwrap().batches().collect();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].entities(), &[e1, e2]);
    assert_eq!(batches[0].archetype(), world.archetype_of(e1).unwrap());
    assert_eq!(batches[0].chunk_index(), 0);
}

#[test]
fn column_lookup_uses_user_term_positions() {
    let (mut world, ids) = world_with(&["position", "velocity", "health"]);
    let e = world.spawn();
    world.add(e, ids[0]).unwrap();
    world.add(e, ids[1]).unwrap();

    let mut queries = Queries::new();
    // User order: velocity first, then position, then a Not term.
    let q = queries
        .query(
            &world,
            &[Term::all(ids[1]), Term::all(ids[0]), Term::not(ids[2])],
        )
        .unwrap();

    let batches: Vec<_> = queries.pass(&world, q).unwrap().batches().collect();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];

    // The archetype's sorted shape is [position, velocity].
    assert_eq!(batch.column(0), Some(1));
    assert_eq!(batch.column(1), Some(0));
    assert_eq!(batch.column(2), None);
}

#[test]
fn absent_any_terms_have_no_column() {
    let (mut world, ids) = world_with(&["position", "velocity", "mass"]);
    let e = world.spawn();
    world.add(e, ids[0]).unwrap();
    world.add(e, ids[1]).unwrap();

    let mut queries = Queries::new();
    let q = queries
        .query(
            &world,
            &[Term::all(ids[0]), Term::any(ids[1]), Term::any(ids[2])],
        )
        .unwrap();

    let batches: Vec<_> = queries.pass(&world, q).unwrap().batches().collect();
    assert_eq!(batches.len(), 1);
    // velocity is present in the shape, mass is not.
    assert_eq!(batches[0].column(1), Some(1));
    assert_eq!(batches[0].column(2), None);
}

#[test]
fn batch_order_is_stable_across_passes() {
    let (mut world, ids) = world_with(&["a", "b", "c"]);
    for extra in [1usize, 2] {
        let e = world.spawn();
        world.add(e, ids[0]).unwrap();
        world.add(e, ids[extra]).unwrap();
    }

    let mut queries = Queries::new();
    let q = queries.query(&world, &[Term::all(ids[0])]).unwrap();

    let order = |queries: &mut Queries| -> Vec<u32> {
        queries
            .pass(&world, q)
            .unwrap()
            .batches()
            .map(|batch| batch.archetype().index())
            .collect()
    };

    let first = order(&mut queries);
    let second = order(&mut queries);
    assert_eq!(first, second);
}

// =============================================================================
// Grouping and sorting
// =============================================================================

#[test]
fn grouping_partitions_matched_archetypes() {
    let (mut world, ids) = world_with(&["tagged", "small", "large"]);
    let small = world.spawn();
    world.add(small, ids[0]).unwrap();
    world.add(small, ids[1]).unwrap();
    let large = world.spawn();
    world.add(large, ids[0]).unwrap();
    world.add(large, ids[2]).unwrap();

    let mut queries = Queries::new();
    let q = queries.query(&world, &[Term::all(ids[0])]).unwrap();

    let large_ident = strata_foundation::Ident::component(ids[2]);
    let grouped: Vec<EntityId> = queries
        .pass(&world, q)
        .unwrap()
        .group_by(move |archetype| u64::from(archetype.contains(large_ident)))
        .collect_entities();

    // Group 0 (without "large") comes before group 1.
    assert_eq!(grouped, vec![small, large]);
}

#[test]
fn grouping_keeps_entities_of_a_group_contiguous() {
    let (mut world, ids) = world_with(&["tagged", "odd"]);
    let mut by_parity: HashMap<bool, Vec<EntityId>> = HashMap::new();
    for i in 0..10 {
        let e = world.spawn();
        world.add(e, ids[0]).unwrap();
        if i % 2 == 1 {
            world.add(e, ids[1]).unwrap();
        }
        by_parity.entry(i % 2 == 1).or_default().push(e);
    }

    let mut queries = Queries::new();
    let q = queries.query(&world, &[Term::all(ids[0])]).unwrap();

    let odd_ident = strata_foundation::Ident::component(ids[1]);
    let grouped: Vec<EntityId> = queries
        .pass(&world, q)
        .unwrap()
        .group_by(move |archetype| u64::from(archetype.contains(odd_ident)))
        .collect_entities();

    let evens = &by_parity[&false];
    let odds = &by_parity[&true];
    assert_eq!(&grouped[..evens.len()], evens.as_slice());
    assert_eq!(&grouped[evens.len()..], odds.as_slice());
}

#[test]
fn row_sorting_is_a_presentation_transform() {
    let (mut world, ids) = world_with(&["tagged"]);
    let entities: Vec<EntityId> = (0..5)
        .map(|_| {
            let e = world.spawn();
            world.add(e, ids[0]).unwrap();
            e
        })
        .collect();

    let mut queries = Queries::new();
    let q = queries.query(&world, &[Term::all(ids[0])]).unwrap();

    let descending: Vec<EntityId> = queries
        .pass(&world, q)
        .unwrap()
        .sort_rows_by(|a, b| b.index.cmp(&a.index))
        .collect_entities();

    let mut expected = entities.clone();
    expected.reverse();
    assert_eq!(descending, expected);

    // The unsorted pass is untouched by the sorted one.
    let plain = queries.pass(&world, q).unwrap().collect_entities();
    assert_eq!(plain, entities);
}
