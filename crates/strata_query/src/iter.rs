//! The query front end: lazy, restartable enumeration of chunk batches.
//!
//! A pass snapshots a cached query's match list (an O(1) `im::Vector` clone)
//! and walks it in append order, yielding one batch per chunk. Grouping and
//! row sorting are presentation-layer transforms over the already-matched
//! set; they never influence the matching decision. Rebuilding a pass is
//! cheap and never recompiles.

use std::borrow::Cow;
use std::cmp::Ordering;

use strata_foundation::EntityId;
use strata_storage::{Archetype, ArchetypeId, IterationGuard, World};

use crate::cache::QueryInfo;
use crate::compile::CompiledQuery;

/// A configured enumeration over one cached query's matches.
pub struct Pass<'a> {
    world: &'a World,
    info: &'a QueryInfo,
    /// Snapshot of the match list, in append order.
    matched: im::Vector<ArchetypeId>,
    group_by: Option<Box<dyn Fn(&Archetype) -> u64 + 'a>>,
    sort_rows: Option<Box<dyn Fn(EntityId, EntityId) -> Ordering + 'a>>,
    guard: IterationGuard<'a>,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(world: &'a World, info: &'a QueryInfo) -> Self {
        Self {
            world,
            info,
            matched: info.matched().clone(),
            group_by: None,
            sort_rows: None,
            guard: world.iteration_guard(),
        }
    }

    /// Partitions matched archetypes by a user key.
    ///
    /// Groups are emitted in ascending key order; within a group, match-list
    /// append order is preserved and entities stay contiguous.
    #[must_use]
    pub fn group_by(mut self, key: impl Fn(&Archetype) -> u64 + 'a) -> Self {
        self.group_by = Some(Box::new(key));
        self
    }

    /// Stably sorts each batch's rows with a user comparator.
    #[must_use]
    pub fn sort_rows_by(
        mut self,
        comparator: impl Fn(EntityId, EntityId) -> Ordering + 'a,
    ) -> Self {
        self.sort_rows = Some(Box::new(comparator));
        self
    }

    /// Returns the batch iterator.
    #[must_use]
    pub fn batches(self) -> Batches<'a> {
        let mut order: Vec<ArchetypeId> = self.matched.iter().copied().collect();
        if let Some(key) = &self.group_by {
            let graph = self.world.graph();
            // Stable sort: append order survives within each group.
            order.sort_by_cached_key(|&id| graph.archetype(id).map_or(u64::MAX, |a| key(a)));
        }

        Batches {
            world: self.world,
            info: self.info,
            order,
            archetype_cursor: 0,
            chunk_cursor: 0,
            sort_rows: self.sort_rows,
            guard: self.guard,
        }
    }

    /// Collects every matching entity, in batch order.
    #[must_use]
    pub fn collect_entities(self) -> Vec<EntityId> {
        let mut entities = Vec::new();
        for batch in self.batches() {
            entities.extend_from_slice(batch.entities());
        }
        entities
    }
}

/// Iterator over the batches of a pass.
pub struct Batches<'a> {
    world: &'a World,
    info: &'a QueryInfo,
    order: Vec<ArchetypeId>,
    archetype_cursor: usize,
    chunk_cursor: usize,
    sort_rows: Option<Box<dyn Fn(EntityId, EntityId) -> Ordering + 'a>>,
    #[allow(dead_code)]
    guard: IterationGuard<'a>,
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Batch<'a>> {
        let plan = self.info.query().plan();
        loop {
            let &id = self.order.get(self.archetype_cursor)?;
            // A match-list snapshot can outlive an archetype only through
            // explicit pruning; recover by skipping.
            let Some(archetype) = self.world.graph().archetype(id) else {
                self.advance_archetype();
                continue;
            };
            let Some(chunk) = archetype.chunk(self.chunk_cursor) else {
                self.advance_archetype();
                continue;
            };
            self.chunk_cursor += 1;

            let filter = plan.needs_entity_eval(archetype.ids());
            let rows: Cow<'a, [EntityId]> = if filter || self.sort_rows.is_some() {
                let mut owned = chunk.entities().to_vec();
                if filter {
                    let relations = self.world.relations();
                    owned.retain(|&entity| {
                        plan.matches_entity(archetype.ids(), relations, entity)
                    });
                }
                if let Some(comparator) = &self.sort_rows {
                    owned.sort_by(|&a, &b| comparator(a, b));
                }
                if owned.is_empty() {
                    continue;
                }
                Cow::Owned(owned)
            } else {
                Cow::Borrowed(chunk.entities())
            };

            let Some(remap) = self.info.remap(id) else {
                continue;
            };
            return Some(Batch {
                query: self.info.query(),
                archetype: id,
                chunk_index: chunk.index(),
                rows,
                remap,
            });
        }
    }
}

impl Batches<'_> {
    fn advance_archetype(&mut self) {
        self.archetype_cursor += 1;
        self.chunk_cursor = 0;
    }
}

/// One chunk's worth of matching rows.
///
/// Row iteration within a batch, and any parallel fan-out across batches, is
/// the caller's (or an external scheduler's) responsibility.
#[derive(Debug)]
pub struct Batch<'a> {
    query: &'a CompiledQuery,
    archetype: ArchetypeId,
    chunk_index: usize,
    rows: Cow<'a, [EntityId]>,
    /// Canonical term position -> storage column index.
    remap: &'a [Option<u32>],
}

impl Batch<'_> {
    /// Returns the archetype this batch belongs to.
    #[must_use]
    pub fn archetype(&self) -> ArchetypeId {
        self.archetype
    }

    /// Returns the chunk index within the archetype.
    #[must_use]
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Returns the matching rows of this chunk.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.rows
    }

    /// Returns the number of matching rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the batch holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the storage column index for a term, by its position in the
    /// user's original term list.
    ///
    /// `None` for Not terms, wildcard terms, and Any terms absent from this
    /// archetype.
    #[must_use]
    pub fn column(&self, user_term_index: usize) -> Option<usize> {
        let canonical = self.query.canonical_position(user_term_index)?;
        self.remap.get(canonical).copied().flatten().map(|c| c as usize)
    }
}
